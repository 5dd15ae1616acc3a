/// Default HTTP port for the serving process.
pub const DEFAULT_PORT: u16 = 8080;

/// Default toolchain executable used to compile the composed server.
pub const DEFAULT_TOOLCHAIN: &str = "cargo";

/// Default store directory, relative to the project root.
pub const DEFAULT_STORE_DIR: &str = ".ponzu/data";

/// Default certificate directory, relative to the project root.
pub const DEFAULT_TLS_DIR: &str = ".ponzu/tls";

/// Default log filter expression used by the serving process.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the serving process.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the serving process.
///
/// The server runs attached to the operator's terminal through `ponzu run`,
/// so single-line output is the default rather than JSON.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}
