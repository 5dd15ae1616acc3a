//! Errors raised while registering content types.

use thiserror::Error;

/// Errors arising from content-type registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A type with the same case-insensitive name was already registered.
    #[error("content type '{name}' is already registered")]
    Duplicate {
        /// Name of the rejected type.
        name: String,
    },

    /// The type name cannot be used as an identifier.
    #[error("invalid content type name '{name}': {reason}")]
    InvalidName {
        /// Name that failed validation.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
}
