//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8Path;
use ponzu_config::ServiceKind;

use crate::bootstrap::BootstrapError;

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the service list is validated.
    fn bootstrap_starting(&self);

    /// Invoked once the config handoff store is open.
    fn store_ready(&self, dir: &Utf8Path);

    /// Invoked once the analytics collector is open.
    fn analytics_ready(&self);

    /// Invoked after a service module registers its routes.
    fn service_started(&self, kind: ServiceKind);

    /// Invoked after transport security is configured.
    fn tls_enabled(&self);

    /// Invoked after the listening port is written to the store.
    fn port_persisted(&self, port: u16);

    /// Invoked once the listener is bound.
    fn listening(&self, addr: SocketAddr);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn store_ready(&self, dir: &Utf8Path) {
        (**self).store_ready(dir);
    }

    fn analytics_ready(&self) {
        (**self).analytics_ready();
    }

    fn service_started(&self, kind: ServiceKind) {
        (**self).service_started(kind);
    }

    fn tls_enabled(&self) {
        (**self).tls_enabled();
    }

    fn port_persisted(&self, port: u16) {
        (**self).port_persisted(port);
    }

    fn listening(&self, addr: SocketAddr) {
        (**self).listening(addr);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn store_ready(&self, dir: &Utf8Path) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "store_ready",
            dir = %dir,
            "config store open"
        );
    }

    fn analytics_ready(&self) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "analytics_ready",
            "analytics collector open"
        );
    }

    fn service_started(&self, kind: ServiceKind) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "service_started",
            service = %kind,
            "service started"
        );
    }

    fn tls_enabled(&self) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "tls_enabled",
            "transport security enabled"
        );
    }

    fn port_persisted(&self, port: u16) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "port_persisted",
            port,
            "listening port recorded"
        );
    }

    fn listening(&self, addr: SocketAddr) {
        tracing::info!(
            target: "ponzu_server::health",
            event = "listening",
            addr = %addr,
            "server listening"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "ponzu_server::health",
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }
}
