//! Server bootstrap orchestration.
//!
//! [`bootstrap_with`] validates the service selection, opens the config
//! handoff store and the analytics collector, starts the selected service
//! modules, enables transport security on request and records the listening
//! port. The resulting [`Server`] owns both resources and releases them on
//! every exit path, including a failed listen.

use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use ponzu_config::{Config, RunInvocation, ServiceKind, ServiceSelectionError};
use ponzu_content::ContentRegistry;
use thiserror::Error;
use tracing::info;

use crate::analytics::{
    AnalyticsCollector, AnalyticsError, AnalyticsGuard, AnalyticsOpener, RequestLogOpener,
};
use crate::dispatch::{DispatchError, Dispatcher, HttpListener, ListenerError, ListenerHandle};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::services::{ServiceContext, module_for};
use crate::store::{
    ConfigStore, FileStoreOpener, HTTP_PORT_KEY, StoreError, StoreGuard, StoreOpener,
};
use crate::tls::{CertificateDirectory, TlsError, TransportSecurity};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Collaborators used during bootstrap.
///
/// The default wiring uses the file-backed store, the JSON Lines request log,
/// the certificate directory and the `tracing` health reporter. Tests swap
/// individual members for doubles.
pub struct Subsystems {
    /// Opens the config handoff store.
    pub store: Box<dyn StoreOpener>,
    /// Opens the analytics collector.
    pub analytics: Box<dyn AnalyticsOpener>,
    /// Enables transport security when `--https` is set.
    pub tls: Box<dyn TransportSecurity>,
    /// Receives lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
}

impl Default for Subsystems {
    fn default() -> Self {
        Self {
            store: Box::new(FileStoreOpener),
            analytics: Box::new(RequestLogOpener),
            tls: Box::new(CertificateDirectory),
            reporter: Arc::new(StructuredHealthReporter::new()),
        }
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The requested service list is empty or names an unknown service.
    #[error("invalid service selection: {source}")]
    Selection {
        /// Underlying validation error.
        #[source]
        source: ServiceSelectionError,
    },
    /// The config handoff store could not be opened.
    #[error("failed to open config store: {source}")]
    StoreInit {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// The analytics collector could not be opened.
    #[error("failed to open analytics: {source}")]
    AnalyticsInit {
        /// Underlying collector error.
        #[source]
        source: AnalyticsError,
    },
    /// A service module failed to register its routes.
    #[error("failed to start {kind} service: {source}")]
    ServiceStart {
        /// Service that failed.
        kind: ServiceKind,
        /// Underlying dispatch error.
        #[source]
        source: DispatchError,
    },
    /// Transport security could not be enabled.
    #[error("failed to enable HTTPS: {source}")]
    Tls {
        /// Underlying TLS error.
        #[source]
        source: TlsError,
    },
    /// The listening port could not be written to the store.
    #[error("System failed to save config. Please try to run again.")]
    ConfigPersist {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// The HTTP listener could not be bound or stopped.
    #[error("failed to listen: {source}")]
    Listen {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

impl BootstrapError {
    /// Returns `true` when the operator asked for something unservable.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}

/// A fully bootstrapped server that has not started listening yet.
pub struct Server {
    port: u16,
    dispatcher: Arc<Dispatcher>,
    reporter: Arc<dyn HealthReporter>,
    // Field order is drop order: analytics closes before the store.
    analytics: AnalyticsGuard,
    store: StoreGuard,
}

impl Server {
    /// Port recorded in the config store under `http_port`.
    ///
    /// This is the requested port. [`Server::listen`] refuses port 0 so the
    /// recorded value always matches the bound socket; [`Server::spawn`]
    /// accepts it and reports the real port through
    /// [`RunningServer::local_addr`].
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The shared dispatcher with every selected service registered.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The open config handoff store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        self.store.store()
    }

    /// The open analytics collector.
    #[must_use]
    pub fn analytics(&self) -> &Arc<dyn AnalyticsCollector> {
        self.analytics.collector()
    }

    /// Binds `0.0.0.0:<port>` and serves on the current thread forever.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Listen`] when the port is 0 or cannot be
    /// bound. The store and collector are released before returning.
    pub fn listen(self) -> Result<Infallible, BootstrapError> {
        if self.port == 0 {
            return Err(self.listen_failed(ListenerError::EphemeralPort));
        }
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        let listener = self.bind(addr)?;
        listener.serve_forever(Arc::clone(&self.dispatcher))
    }

    /// Binds the loopback interface and serves on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Listen`] when the port cannot be bound.
    pub fn spawn(self) -> Result<RunningServer, BootstrapError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let listener = self.bind(addr)?;
        let addr = listener.local_addr();
        let handle = listener.start(Arc::clone(&self.dispatcher));
        Ok(RunningServer {
            addr,
            handle,
            server: self,
        })
    }

    fn bind(&self, addr: SocketAddr) -> Result<HttpListener, BootstrapError> {
        let listener = HttpListener::bind(addr).map_err(|source| self.listen_failed(source))?;
        self.reporter.listening(listener.local_addr());
        Ok(listener)
    }

    fn listen_failed(&self, source: ListenerError) -> BootstrapError {
        let error = BootstrapError::Listen { source };
        self.reporter.bootstrap_failed(&error);
        error
    }
}

/// A server listening on a background thread.
pub struct RunningServer {
    addr: SocketAddr,
    handle: ListenerHandle,
    server: Server,
}

impl RunningServer {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The underlying server.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Stops accepting connections and releases the store and collector.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Listen`] when the listener thread panicked.
    pub fn shutdown(self) -> Result<(), BootstrapError> {
        let Self { handle, server, .. } = self;
        handle.shutdown();
        let joined = handle.join();
        drop(server);
        joined.map_err(|source| BootstrapError::Listen { source })
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// The service list is validated before any resource is opened, so an
/// unservable request leaves no trace on disk.
///
/// # Errors
///
/// Returns the first failing step; every resource opened before it has been
/// released by the time the error is returned.
pub fn bootstrap_with(
    config: &Config,
    invocation: &RunInvocation,
    registry: Arc<ContentRegistry>,
    subsystems: Subsystems,
) -> Result<Server, BootstrapError> {
    let reporter = Arc::clone(&subsystems.reporter);
    reporter.bootstrap_starting();
    assemble(config, invocation, registry, subsystems)
        .inspect_err(|error| reporter.bootstrap_failed(error))
}

fn assemble(
    config: &Config,
    invocation: &RunInvocation,
    registry: Arc<ContentRegistry>,
    subsystems: Subsystems,
) -> Result<Server, BootstrapError> {
    let Subsystems {
        store,
        analytics,
        tls,
        reporter,
    } = subsystems;

    let services = invocation
        .services
        .parse()
        .map_err(|source| BootstrapError::Selection { source })?;

    let store = store
        .open(config)
        .map(StoreGuard::new)
        .map_err(|source| BootstrapError::StoreInit { source })?;
    reporter.store_ready(config.store_dir());

    let analytics = analytics
        .open(config)
        .map(AnalyticsGuard::new)
        .map_err(|source| BootstrapError::AnalyticsInit { source })?;
    reporter.analytics_ready();

    let mut dispatcher = Dispatcher::with_analytics(Arc::clone(analytics.collector()));
    let context = ServiceContext {
        registry,
        store: Arc::clone(store.store()),
    };
    for kind in services.iter() {
        module_for(kind)
            .run(&mut dispatcher, &context)
            .map_err(|source| BootstrapError::ServiceStart { kind, source })?;
        reporter.service_started(kind);
    }

    if invocation.https {
        info!(target: BOOTSTRAP_TARGET, "Enabling HTTPS...");
        tls.enable(config, &mut dispatcher)
            .map_err(|source| BootstrapError::Tls { source })?;
        reporter.tls_enabled();
    }

    store
        .store()
        .put(HTTP_PORT_KEY, &invocation.port.to_string())
        .map_err(|source| BootstrapError::ConfigPersist { source })?;
    reporter.port_persisted(invocation.port);

    Ok(Server {
        port: invocation.port,
        dispatcher: Arc::new(dispatcher),
        reporter,
        analytics,
        store,
    })
}
