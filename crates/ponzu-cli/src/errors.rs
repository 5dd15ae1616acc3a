//! Error type aggregated by the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use ponzu_build::{BuildError, CompositionError, GenerateError, ScaffoldError};
use ponzu_content::RegistryError;
use ponzu_server::ServeError;
use thiserror::Error;

use crate::supervisor::SupervisorError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to resolve the current directory: {0}")]
    WorkingDirectory(io::Error),
    #[error("current directory is not valid UTF-8: {}", .0.display())]
    NonUtf8WorkingDirectory(PathBuf),
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Compose(#[from] CompositionError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error("failed to register content types: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Serve(#[from] ServeError),
}

impl AppError {
    /// Returns `true` when `serve` was asked for services it cannot run.
    pub(crate) fn is_serve_usage_error(&self) -> bool {
        matches!(self, Self::Serve(error) if error.is_usage_error())
    }
}
