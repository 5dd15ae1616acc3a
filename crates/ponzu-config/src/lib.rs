//! Shared configuration for the Ponzu command-line tool and the composed
//! `ponzu-server` program.
//!
//! Configuration is layered with `ortho_config`: built-in defaults, an
//! optional configuration file (`--config-path` or `PONZU_CONFIG_PATH`),
//! `PONZU_*` environment variables and finally command-line flags. When the
//! CLI spawns the built server, it passes the settings the argument vector
//! does not carry through [`Config::handoff_environment`], so both processes
//! agree on the store directory and logging.
//!
//! The crate also owns the types that describe a serving request
//! ([`RunInvocation`], [`ServiceSelection`], [`ServiceSet`]), because they
//! form the wire contract between the supervising CLI and the child it
//! spawns.

mod defaults;
mod logging;
mod services;

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PORT, DEFAULT_STORE_DIR, DEFAULT_TLS_DIR, DEFAULT_TOOLCHAIN,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use services::{
    DEFAULT_SERVICES, RunInvocation, ServiceKind, ServiceKindParseError, ServiceSelection,
    ServiceSelectionError, ServiceSet,
};

/// Resolved configuration shared by the CLI and the serving process.
///
/// Boolean switches (`--https`, `--dev`) are parsed by the CLI itself because
/// they accept the Go-style `--flag=false` spelling; everything that carries a
/// value lives here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "PONZU")]
pub struct Config {
    /// Port the server binds its HTTP listener to.
    pub port: u16,
    /// Toolchain executable used to compile the composed server.
    pub gocmd: String,
    /// Alternative framework source (path or git URL) for core development.
    pub fork: Option<String>,
    /// Local working copy of the framework used by `--dev` builds.
    pub dev_source: Option<Utf8PathBuf>,
    /// Directory holding the config handoff store and analytics log.
    pub store_dir: Utf8PathBuf,
    /// Directory holding transport-security certificate material.
    pub tls_dir: Utf8PathBuf,
    /// Tracing filter expression for the serving process.
    pub log_filter: String,
    /// Output format for the serving process logs.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            gocmd: DEFAULT_TOOLCHAIN.to_owned(),
            fork: None,
            dev_source: None,
            store_dir: Utf8PathBuf::from(DEFAULT_STORE_DIR),
            tls_dir: Utf8PathBuf::from(DEFAULT_TLS_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_process() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_args(std::env::args_os())
    }

    /// Loads configuration from an explicit argument vector.
    ///
    /// The first element is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_args<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Port the server binds to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Toolchain executable used by `build`.
    #[must_use]
    pub fn toolchain(&self) -> &str {
        self.gocmd.as_str()
    }

    /// Fork location requested for core development, if any.
    #[must_use]
    pub fn fork(&self) -> Option<&str> {
        self.fork.as_deref().filter(|fork| !fork.trim().is_empty())
    }

    /// Explicit local working copy for `--dev` builds, if configured.
    #[must_use]
    pub fn dev_source(&self) -> Option<&Utf8Path> {
        self.dev_source.as_deref()
    }

    /// Directory holding the config handoff store.
    #[must_use]
    pub fn store_dir(&self) -> &Utf8Path {
        self.store_dir.as_path()
    }

    /// Directory holding certificate material for `--https`.
    #[must_use]
    pub fn tls_dir(&self) -> &Utf8Path {
        self.tls_dir.as_path()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// `PONZU_*` variables that reproduce this configuration's serving
    /// settings in a child process.
    ///
    /// Port and HTTPS travel as arguments; the build-only settings are left
    /// out.
    #[must_use]
    pub fn handoff_environment(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PONZU_STORE_DIR", self.store_dir.to_string()),
            ("PONZU_TLS_DIR", self.tls_dir.to_string()),
            ("PONZU_LOG_FILTER", self.log_filter.clone()),
            ("PONZU_LOG_FORMAT", self.log_format.to_string()),
        ]
    }
}
