//! Service bootstrap for the composed `ponzu-server` program.
//!
//! `ponzu serve` hands control to [`serve`], which runs a linear bootstrap:
//! validate the requested services, open the config handoff store, open the
//! analytics collector, start each service module on a shared
//! [`Dispatcher`], optionally enable transport security, record the
//! listening port in the store and finally listen on `0.0.0.0:<port>`.
//!
//! Every step reports to a [`HealthReporter`] so operators can follow the
//! sequence in the structured logs. Failures are fatal and surface as a
//! [`BootstrapError`]; resources opened before the failing step are released
//! on the way out.
//!
//! The store is the only channel through which components discover the
//! listening port: the admin page reads `http_port` back from it rather than
//! from process state.

mod analytics;
mod bootstrap;
mod dispatch;
mod health;
mod process;
mod services;
mod store;
mod telemetry;
mod tls;

pub use analytics::{
    ANALYTICS_FILE, AnalyticsCollector, AnalyticsError, AnalyticsOpener, RequestLog,
    RequestLogOpener, RequestRecord,
};
pub use bootstrap::{BootstrapError, RunningServer, Server, Subsystems, bootstrap_with};
pub use dispatch::{DispatchError, Dispatcher, ListenerError, Request, Response, RouteHandler};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{ServeError, serve};
pub use services::{AdminService, ApiService, ServiceContext, ServiceModule, module_for};
pub use store::{
    ConfigStore, FileStore, FileStoreOpener, HTTP_PORT_KEY, StoreError, StoreOpener,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use tls::{CERT_FILE, CertificateDirectory, KEY_FILE, TlsError, TransportSecurity};

#[cfg(test)]
mod tests;
