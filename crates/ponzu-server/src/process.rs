//! Entry point used by the `serve` command.

use std::convert::Infallible;
use std::sync::Arc;

use ponzu_config::{Config, RunInvocation};
use ponzu_content::ContentRegistry;
use thiserror::Error;

use crate::bootstrap::{BootstrapError, Subsystems, bootstrap_with};
use crate::telemetry::{self, TelemetryError};

/// Errors that stop the serving process.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Telemetry could not be initialised.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Bootstrap or listen failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

impl ServeError {
    /// Returns `true` when the failure came from an unservable request.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Bootstrap(error) if error.is_usage_error())
    }
}

/// Initialises telemetry, bootstraps every subsystem and serves forever.
///
/// Only returns when a step fails.
///
/// # Errors
///
/// Returns the failing step. Resources opened before it have been released.
pub fn serve(
    config: &Config,
    invocation: &RunInvocation,
    registry: Arc<ContentRegistry>,
) -> Result<Infallible, ServeError> {
    telemetry::initialise(config).map_err(|source| ServeError::Telemetry { source })?;
    let server = bootstrap_with(config, invocation, registry, Subsystems::default())?;
    Ok(server.listen()?)
}
