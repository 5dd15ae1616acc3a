//! Network service modules.
//!
//! Each module claims one route namespace on the shared [`Dispatcher`]:
//! `api` serves read-only content-type data under `/api`, `admin` serves a
//! plain-text status page under `/admin`.

use std::sync::Arc;

use ponzu_config::ServiceKind;
use ponzu_content::ContentRegistry;

use crate::dispatch::{DispatchError, Dispatcher, Request, Response};
use crate::store::{ConfigStore, HTTP_PORT_KEY};

/// Shared state handed to every service module.
#[derive(Clone)]
pub struct ServiceContext {
    /// Content types known to the server.
    pub registry: Arc<ContentRegistry>,
    /// Config handoff store opened during bootstrap.
    pub store: Arc<dyn ConfigStore>,
}

/// A network service that can be started on the dispatcher.
pub trait ServiceModule: Send + Sync {
    /// Which service this module implements.
    fn kind(&self) -> ServiceKind;

    /// Registers the module's routes.
    ///
    /// # Errors
    ///
    /// Fails when the module's namespace is already taken.
    fn run(&self, dispatcher: &mut Dispatcher, context: &ServiceContext)
    -> Result<(), DispatchError>;
}

/// Returns the built-in module for `kind`.
#[must_use]
pub fn module_for(kind: ServiceKind) -> Box<dyn ServiceModule> {
    match kind {
        ServiceKind::Api => Box::new(ApiService),
        ServiceKind::Admin => Box::new(AdminService),
    }
}

/// Read-only content-type API mounted at `/api`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiService;

impl ServiceModule for ApiService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Api
    }

    fn run(
        &self,
        dispatcher: &mut Dispatcher,
        context: &ServiceContext,
    ) -> Result<(), DispatchError> {
        let registry = Arc::clone(&context.registry);
        dispatcher.register("/api", move |request: &Request| api_route(&registry, request))
    }
}

fn api_route(registry: &ContentRegistry, request: &Request) -> Response {
    if request.method() != "GET" {
        return Response::method_not_allowed();
    }
    let rest = request.path().strip_prefix("/api").unwrap_or_default();
    match rest.trim_end_matches('/') {
        "/types" => Response::json(200, &registry.names()),
        other => other
            .strip_prefix("/types/")
            .and_then(|name| registry.get(name))
            .map_or_else(Response::not_found, |content_type| {
                Response::json(200, content_type)
            }),
    }
}

/// Administrative status page mounted at `/admin`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdminService;

impl ServiceModule for AdminService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Admin
    }

    fn run(
        &self,
        dispatcher: &mut Dispatcher,
        context: &ServiceContext,
    ) -> Result<(), DispatchError> {
        let context = context.clone();
        dispatcher.register("/admin", move |request: &Request| admin_route(&context, request))
    }
}

fn admin_route(context: &ServiceContext, request: &Request) -> Response {
    if request.method() != "GET" {
        return Response::method_not_allowed();
    }
    if request.path().trim_end_matches('/') != "/admin" {
        return Response::not_found();
    }

    let mut page = String::from("Ponzu admin\n\n");
    // The port comes from the handoff store, not from process state.
    match context.store.get(HTTP_PORT_KEY) {
        Ok(Some(port)) => page.push_str(&format!("API: http://localhost:{port}/api\n")),
        Ok(None) => page.push_str("API: port not yet recorded\n"),
        Err(error) => page.push_str(&format!("API: unavailable ({error})\n")),
    }
    page.push_str("\nContent types:\n");
    if context.registry.is_empty() {
        page.push_str("  (none)\n");
    }
    for content_type in context.registry.iter() {
        page.push_str(&format!(
            "  {} ({} fields)\n",
            content_type.name(),
            content_type.fields().len()
        ));
    }
    Response::text(200, page)
}
