//! BDD test world: owns a temporary project directory, the recording
//! reporter and the outcome of a bootstrap run.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ponzu_config::{Config, RunInvocation, ServiceSelection};
use ponzu_content::{ContentRegistry, ContentType, FieldSpec};
use tempfile::TempDir;

use crate::analytics::{AnalyticsOpener, RequestLogOpener};
use crate::bootstrap::{BootstrapError, Server, Subsystems, bootstrap_with};
use crate::store::{FileStoreOpener, StoreOpener};
use crate::tls::{CERT_FILE, KEY_FILE};

use super::doubles::{FailingAnalyticsOpener, ReadOnlyStoreOpener};
use super::reporter::RecordingHealthReporter;

/// Registry with a single `Song` type.
#[must_use]
fn sample_registry() -> Arc<ContentRegistry> {
    let mut registry = ContentRegistry::new();
    registry
        .register(ContentType::new("Song").with_field(FieldSpec::new("title", "string")))
        .expect("sample type should register");
    Arc::new(registry)
}

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    dir: TempDir,
    pub config: Config,
    pub invocation: RunInvocation,
    pub reporter: Arc<RecordingHealthReporter>,
    store: Box<dyn StoreOpener>,
    analytics: Box<dyn AnalyticsOpener>,
    server: Option<Server>,
    error: Option<BootstrapError>,
}

impl TestWorld {
    /// Builds a world rooted in a fresh temporary directory.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let config = Config {
            store_dir: root.join("data"),
            tls_dir: root.join("tls"),
            ..Config::default()
        };
        let invocation = RunInvocation {
            port: config.port(),
            https: false,
            services: ServiceSelection::default(),
        };
        Self {
            dir,
            config,
            invocation,
            reporter: Arc::new(RecordingHealthReporter::default()),
            store: Box::new(FileStoreOpener),
            analytics: Box::new(RequestLogOpener),
            server: None,
            error: None,
        }
    }

    /// Requests the given raw service list.
    pub fn request_services(&mut self, list: &str) {
        self.invocation.services = ServiceSelection::new(list);
    }

    /// Writes placeholder certificate material into the TLS directory.
    pub fn install_certificates(&self) {
        let tls = self.dir.path().join("tls");
        fs::create_dir_all(&tls).expect("tls dir");
        fs::write(tls.join(CERT_FILE), "certificate").expect("cert");
        fs::write(tls.join(KEY_FILE), "key").expect("key");
    }

    /// Makes analytics fail to open.
    pub fn break_analytics(&mut self) {
        self.analytics = Box::new(FailingAnalyticsOpener);
    }

    /// Makes the store refuse writes.
    pub fn make_store_read_only(&mut self) {
        self.store = Box::new(ReadOnlyStoreOpener);
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.server.is_some() || self.error.is_some() {
            return;
        }
        let subsystems = Subsystems {
            store: std::mem::replace(&mut self.store, Box::new(FileStoreOpener)),
            analytics: std::mem::replace(&mut self.analytics, Box::new(RequestLogOpener)),
            reporter: self.reporter.clone(),
            ..Subsystems::default()
        };
        match bootstrap_with(&self.config, &self.invocation, sample_registry(), subsystems) {
            Ok(server) => self.server = Some(server),
            Err(error) => self.error = Some(error),
        }
    }

    /// The bootstrapped server, if bootstrap succeeded.
    #[must_use]
    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    /// Takes ownership of the bootstrapped server.
    pub fn take_server(&mut self) -> Option<Server> {
        self.server.take()
    }

    /// The bootstrap error, if bootstrap failed.
    #[must_use]
    pub fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
