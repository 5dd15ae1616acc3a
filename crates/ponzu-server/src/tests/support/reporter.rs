//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::net::SocketAddr;
use std::sync::Mutex;

use camino::Utf8Path;
use ponzu_config::ServiceKind;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting,
    StoreReady,
    AnalyticsReady,
    ServiceStarted(ServiceKind),
    TlsEnabled,
    PortPersisted(u16),
    Listening,
    BootstrapFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }

    /// Returns `true` when a failure event was recorded.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.events()
            .iter()
            .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)))
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn store_ready(&self, _dir: &Utf8Path) {
        self.record(HealthEvent::StoreReady);
    }

    fn analytics_ready(&self) {
        self.record(HealthEvent::AnalyticsReady);
    }

    fn service_started(&self, kind: ServiceKind) {
        self.record(HealthEvent::ServiceStarted(kind));
    }

    fn tls_enabled(&self) {
        self.record(HealthEvent::TlsEnabled);
    }

    fn port_persisted(&self, port: u16) {
        self.record(HealthEvent::PortPersisted(port));
    }

    fn listening(&self, _addr: SocketAddr) {
        self.record(HealthEvent::Listening);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }
}
