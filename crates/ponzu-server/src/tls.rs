//! Transport security collaborator.
//!
//! Certificates are issued and TLS is terminated outside this process. The
//! server only checks that certificate material is in place and advertises
//! strict transport security on every response.

use camino::Utf8PathBuf;
use ponzu_config::Config;
use thiserror::Error;

use crate::dispatch::Dispatcher;

/// Certificate chain file name inside the TLS directory.
pub const CERT_FILE: &str = "cert.pem";
/// Private key file name inside the TLS directory.
pub const KEY_FILE: &str = "key.pem";

const HSTS_HEADER: &str = "Strict-Transport-Security";
const HSTS_VALUE: &str = "max-age=31536000";

/// Errors raised while enabling transport security.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlsError {
    /// Required certificate material is absent.
    #[error("missing certificate material: {path}")]
    MissingFile {
        /// Path that was expected to exist.
        path: Utf8PathBuf,
    },
}

/// Enables transport security on the shared dispatcher.
pub trait TransportSecurity: Send + Sync {
    /// Configures the dispatcher for secure transport.
    ///
    /// # Errors
    ///
    /// Fails when transport security cannot be enabled.
    fn enable(&self, config: &Config, dispatcher: &mut Dispatcher) -> Result<(), TlsError>;
}

/// Uses certificate material from the configured TLS directory.
///
/// The listener itself speaks plain HTTP. TLS must be terminated in front of
/// it, by a proxy holding the same `cert.pem`/`key.pem`, for the
/// `Strict-Transport-Security` header to take effect: browsers ignore it on
/// responses received over an insecure connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct CertificateDirectory;

impl TransportSecurity for CertificateDirectory {
    fn enable(&self, config: &Config, dispatcher: &mut Dispatcher) -> Result<(), TlsError> {
        for file in [CERT_FILE, KEY_FILE] {
            let path = config.tls_dir().join(file);
            if !path.is_file() {
                return Err(TlsError::MissingFile { path });
            }
        }
        dispatcher.add_response_header(HSTS_HEADER, HSTS_VALUE);
        Ok(())
    }
}
