//! Service selection and the spawn argument contract.
//!
//! `ponzu run` forwards the operator's service list verbatim to the child it
//! spawns; the serving process parses it into a [`ServiceSet`] and refuses to
//! start when any entry is unknown.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Service list used when `run` or `serve` receive none.
pub const DEFAULT_SERVICES: &str = "admin,api";

/// Optional network services the server can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    /// The administrative interface.
    Admin,
    /// The content data API.
    Api,
}

impl ServiceKind {
    /// Returns the canonical lowercase name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a service name is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported service: '{0}'")]
pub struct ServiceKindParseError(String);

impl ServiceKindParseError {
    /// Creates a parse error describing the unsupported value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the offending value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ServiceKind {
    type Err = ServiceKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "api" => Ok(Self::Api),
            other => Err(ServiceKindParseError::new(other)),
        }
    }
}

/// Errors raised while validating a service list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceSelectionError {
    /// The list contained no services at all.
    #[error("no services were requested")]
    Empty,
    /// The list named a service that does not exist.
    #[error(transparent)]
    Unrecognised(#[from] ServiceKindParseError),
}

/// Ordered, duplicate-free set of services to start.
///
/// Entries keep the order in which they were first requested; repeats are
/// collapsed so each module starts at most once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSet {
    kinds: Vec<ServiceKind>,
}

impl ServiceSet {
    /// Parses a comma-separated service list.
    ///
    /// # Errors
    ///
    /// Fails when the list is blank or any entry is not a known service.
    pub fn parse(list: &str) -> Result<Self, ServiceSelectionError> {
        if list.trim().is_empty() {
            return Err(ServiceSelectionError::Empty);
        }
        let mut kinds = Vec::new();
        for entry in list.split(',') {
            let kind = entry.parse::<ServiceKind>()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(Self { kinds })
    }

    /// Iterates the selected services in request order.
    pub fn iter(&self) -> impl Iterator<Item = ServiceKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Returns `true` when the service was requested.
    #[must_use]
    pub fn contains(&self, kind: ServiceKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Number of distinct services requested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false` for a parsed set; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Display for ServiceSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.kinds.iter().map(|kind| kind.as_str()).collect();
        formatter.write_str(&names.join(","))
    }
}

/// Raw service list exactly as the operator typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSelection(String);

impl ServiceSelection {
    /// Wraps an operator-supplied list without validating it.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Validates the list into a [`ServiceSet`].
    ///
    /// # Errors
    ///
    /// See [`ServiceSet::parse`].
    pub fn parse(&self) -> Result<ServiceSet, ServiceSelectionError> {
        ServiceSet::parse(&self.0)
    }
}

impl Default for ServiceSelection {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICES)
    }
}

impl From<Option<String>> for ServiceSelection {
    fn from(value: Option<String>) -> Self {
        value.map_or_else(Self::default, Self::new)
    }
}

impl fmt::Display for ServiceSelection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A request to serve: the resolved port, TLS switch, and service list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInvocation {
    /// Listening port.
    pub port: u16,
    /// Whether transport security should be enabled.
    pub https: bool,
    /// Services to start.
    pub services: ServiceSelection,
}

impl RunInvocation {
    /// Arguments passed to the spawned server process.
    ///
    /// The order is part of the contract with the child: `--port=<N>`, the
    /// TLS switch, the literal `serve`, then the service list.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        let tls = if self.https { "--https" } else { "--https=false" };
        vec![
            format!("--port={}", self.port),
            tls.to_owned(),
            "serve".to_owned(),
            self.services.as_str().to_owned(),
        ]
    }
}
