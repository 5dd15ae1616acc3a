//! Error types for request dispatch and the HTTP listener.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while configuring routes.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A namespace was registered twice.
    #[error("route namespace '{namespace}' is already registered")]
    DuplicateNamespace {
        /// Namespace prefix, for example `/api`.
        namespace: String,
    },
    /// A namespace does not start with `/` or ends with one.
    #[error("invalid route namespace '{namespace}'")]
    InvalidNamespace {
        /// Offending namespace.
        namespace: String,
    },
}

/// Errors surfaced while binding or running the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Binding the TCP socket failed.
    #[error("failed to bind HTTP listener at {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Reason reported by the HTTP server.
        message: String,
    },
    /// The listener is not bound to an IP socket address.
    #[error("HTTP listener is not bound to an IP address")]
    LocalAddr,
    /// `listen` was asked for port 0, which cannot be handed off.
    #[error("refusing to listen on port 0: the recorded http_port would not be reachable")]
    EphemeralPort,
    /// The receive thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
