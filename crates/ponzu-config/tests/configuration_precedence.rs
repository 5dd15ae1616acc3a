use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use ponzu_config::{Config, DEFAULT_PORT, DEFAULT_TOOLCHAIN, default_log_filter, default_log_format};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    file_entries: RefCell<BTreeMap<String, String>>,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            file_entries: RefCell::new(BTreeMap::new()),
            cli_args: RefCell::new(vec![OsString::from("ponzu")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_guard: env_guard,
        }
    }

    fn set_file_entry(&self, key: &str, rendered: String) {
        self.file_entries
            .borrow_mut()
            .insert(key.to_owned(), rendered);
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` on edition 2024; `Drop` restores
        // every override and the mutex serialises scenarios.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn config_args(&self) -> Vec<OsString> {
        let entries = self.file_entries.borrow();
        let mut args = vec![OsString::from("ponzu")];
        if !entries.is_empty() {
            let path = self.temp_dir.path().join("ponzu.toml");
            let body: String = entries
                .iter()
                .map(|(key, value)| format!("{key} = {value}\n"))
                .collect();
            if let Err(error) = fs::write(&path, body) {
                panic!("failed to write configuration: {error}");
            }
            args.push(OsString::from("--config-path"));
            args.push(path.into_os_string());
        }
        args.extend(self.cli_args.borrow().iter().skip(1).cloned());
        args
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        match Config::load_from_args(self.config_args()) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn loaded_config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(os_value) => unsafe { std::env::set_var(&key, os_value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

fn parse_port(raw: &str) -> u16 {
    match raw.parse() {
        Ok(port) => port,
        Err(error) => panic!("invalid port '{raw}': {error}"),
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the port to \"{port}\"")]
fn given_file_port(harness: &Harness, port: String) {
    harness.set_file_entry("port", parse_port(&port).to_string());
}

#[given("a configuration file setting the toolchain to \"{toolchain}\"")]
fn given_file_toolchain(harness: &Harness, toolchain: String) {
    harness.set_file_entry("gocmd", format!("\"{toolchain}\""));
}

#[given("the environment overrides the port to \"{port}\"")]
fn given_environment_port(harness: &Harness, port: String) {
    harness.set_env("PONZU_PORT", &port);
}

#[when("the CLI sets the port to \"{port}\"")]
fn when_cli_port(harness: &Harness, port: String) {
    harness.push_cli_arg("--port");
    harness.push_cli_arg(port);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the port to \"{port}\"")]
fn then_resolved_port(harness: &Harness, port: String) {
    assert_eq!(harness.loaded_config().port(), parse_port(&port));
}

#[then("loading the configuration resolves the toolchain to \"{toolchain}\"")]
fn then_resolved_toolchain(harness: &Harness, toolchain: String) {
    assert_eq!(harness.loaded_config().toolchain(), toolchain);
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();
    assert_eq!(config.port(), DEFAULT_PORT);
    assert_eq!(config.toolchain(), DEFAULT_TOOLCHAIN);
    assert_eq!(config.fork(), None);
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Defaults apply when nothing is configured"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Configuration file overrides defaults"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line flags override every other layer"
)]
fn cli_overrides_everything(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Toolchain is taken from the configuration file"
)]
fn toolchain_from_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}
