//! Behavioural tests for the server bootstrap sequence.

use std::cell::RefCell;

use ponzu_config::ServiceKind;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::dispatch::Request;
use crate::store::{ConfigStore, FileStore, HTTP_PORT_KEY};

use super::support::{self, HealthEvent, TestWorld};

type StepResult = Result<(), String>;

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("the server is asked to listen on port \"{port}\"")]
fn given_port(world: &RefCell<TestWorld>, port: String) -> StepResult {
    let port = port
        .parse()
        .map_err(|error| format!("invalid port '{port}': {error}"))?;
    world.borrow_mut().invocation.port = port;
    Ok(())
}

#[given("the requested services are \"{list}\"")]
fn given_services(world: &RefCell<TestWorld>, list: String) {
    world.borrow_mut().request_services(&list);
}

#[given("HTTPS is requested")]
fn given_https(world: &RefCell<TestWorld>) {
    world.borrow_mut().invocation.https = true;
}

#[given("certificate material is installed")]
fn given_certificates(world: &RefCell<TestWorld>) {
    world.borrow().install_certificates();
}

#[given("the analytics collector cannot be opened")]
fn given_broken_analytics(world: &RefCell<TestWorld>) {
    world.borrow_mut().break_analytics();
}

#[when("the bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.error().is_none(),
        "bootstrap error: {:?}",
        world.error()
    );
    assert!(world.server().is_some(), "server should have been built");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(world.error().is_some(), "bootstrap succeeded unexpectedly");
    assert!(world.reporter.failed(), "bootstrap failure event missing");
}

#[then("bootstrap fails with a usage error")]
fn then_usage_error(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let error = world.error().expect("bootstrap should fail");
    assert!(error.is_usage_error(), "unexpected error: {error}");
}

#[then("the store directory was never created")]
fn then_no_store_dir(world: &RefCell<TestWorld>) {
    assert!(!world.borrow().config.store_dir().exists());
}

#[then("the store lock has been released")]
fn then_store_released(world: &RefCell<TestWorld>) -> StepResult {
    let world = world.borrow();
    FileStore::open(world.config.store_dir())
        .map(drop)
        .map_err(|error| format!("store still locked: {error}"))
}

#[then("the store records the port \"{port}\"")]
fn then_port_recorded(world: &RefCell<TestWorld>, port: String) {
    let world = world.borrow();
    let stored = FileStore::reader(world.config.store_dir())
        .get(HTTP_PORT_KEY)
        .expect("read store");
    assert_eq!(stored, Some(port));
}

#[then("the \"{service}\" service was started")]
fn then_service_started(world: &RefCell<TestWorld>, service: String) -> StepResult {
    let kind = service
        .parse::<ServiceKind>()
        .map_err(|error| error.to_string())?;
    let events = world.borrow().reporter.events();
    if events.contains(&HealthEvent::ServiceStarted(kind)) {
        Ok(())
    } else {
        Err(format!("{kind} was not started: {events:?}"))
    }
}

#[then("responses carry a strict transport security header")]
fn then_hsts(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let server = world.server().expect("server");
    let response = server.dispatcher().dispatch(&Request::new("GET", "/admin"));
    assert!(response.header("Strict-Transport-Security").is_some());
}

#[then("the admin page links to \"{url}\"")]
fn then_admin_link(world: &RefCell<TestWorld>, url: String) {
    let world = world.borrow();
    let server = world.server().expect("server");
    let response = server.dispatcher().dispatch(&Request::new("GET", "/admin"));
    let body = String::from_utf8_lossy(response.body()).into_owned();
    assert!(body.contains(&format!("API: {url}")), "admin page: {body}");
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "Default services start and the port is recorded"
)]
fn default_services_start(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "An unknown service is refused before anything opens"
)]
fn unknown_service_refused(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "HTTPS requires certificate material"
)]
fn https_requires_certificates(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "HTTPS with certificates marks responses as secure-only"
)]
fn https_with_certificates(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "Analytics failure closes the store"
)]
fn analytics_failure_closes_store(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/serve_bootstrap.feature",
    name = "The admin page discovers the port through the store"
)]
fn admin_discovers_port(world: RefCell<TestWorld>) {
    let _ = world;
}
