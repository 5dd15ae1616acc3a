//! Route dispatch shared by every service module.
//!
//! Services register a namespace (a path prefix such as `/api`) together
//! with a [`RouteHandler`]. The [`Dispatcher`] picks the longest matching
//! namespace for each request, applies response header layers installed by
//! transport security, and records the outcome with the analytics collector.

mod errors;
mod http;
mod listener;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analytics::{AnalyticsCollector, RequestRecord};

pub use self::errors::{DispatchError, ListenerError};
pub use self::http::{Request, Response};
pub(crate) use self::listener::{HttpListener, ListenerHandle};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Handles requests inside one namespace.
pub trait RouteHandler: Send + Sync {
    /// Produces the response for `request`.
    fn handle(&self, request: &Request) -> Response;
}

impl<F> RouteHandler for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

/// Shared request router.
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<(String, Arc<dyn RouteHandler>)>,
    headers: Vec<(String, String)>,
    analytics: Option<Arc<dyn AnalyticsCollector>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher that records every request with `analytics`.
    #[must_use]
    pub fn with_analytics(analytics: Arc<dyn AnalyticsCollector>) -> Self {
        Self {
            analytics: Some(analytics),
            ..Self::default()
        }
    }

    /// Registers `handler` for every path under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateNamespace`] when the namespace is
    /// taken and [`DispatchError::InvalidNamespace`] when it is not of the
    /// form `/name`.
    pub fn register(
        &mut self,
        namespace: &str,
        handler: impl RouteHandler + 'static,
    ) -> Result<(), DispatchError> {
        if !namespace.starts_with('/') || namespace.len() < 2 || namespace.ends_with('/') {
            return Err(DispatchError::InvalidNamespace {
                namespace: namespace.to_owned(),
            });
        }
        if self.routes.iter().any(|(existing, _)| existing == namespace) {
            return Err(DispatchError::DuplicateNamespace {
                namespace: namespace.to_owned(),
            });
        }
        debug!(target: DISPATCH_TARGET, namespace, "registered namespace");
        self.routes.push((namespace.to_owned(), Arc::new(handler)));
        Ok(())
    }

    /// Adds a header to every response that does not already set it.
    pub fn add_response_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Registered namespaces in registration order.
    #[must_use]
    pub fn namespaces(&self) -> Vec<&str> {
        self.routes.iter().map(|(namespace, _)| namespace.as_str()).collect()
    }

    /// Routes `request` and returns the response.
    #[must_use]
    pub fn dispatch(&self, request: &Request) -> Response {
        let response = self
            .route(request.path())
            .map_or_else(Response::not_found, |handler| handler.handle(request));
        let response = self.headers.iter().fold(response, |response, (name, value)| {
            response.with_default_header(name, value)
        });
        self.record(request, response.status());
        response
    }

    fn route(&self, path: &str) -> Option<&Arc<dyn RouteHandler>> {
        self.routes
            .iter()
            .filter(|(namespace, _)| {
                path.strip_prefix(namespace.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|(namespace, _)| namespace.len())
            .map(|(_, handler)| handler)
    }

    fn record(&self, request: &Request, status: u16) {
        let Some(analytics) = &self.analytics else {
            return;
        };
        let record = RequestRecord::now(request.method(), request.path(), status);
        if let Err(error) = analytics.record(&record) {
            warn!(target: DISPATCH_TARGET, error = %error, "failed to record request");
        }
    }

    /// Answers one request received by the listener.
    pub(crate) fn serve_request(&self, mut incoming: tiny_http::Request) {
        let response = match Request::from_incoming(&mut incoming) {
            Ok(request) => {
                let response = self.dispatch(&request);
                debug!(
                    target: DISPATCH_TARGET,
                    method = request.method(),
                    path = request.path(),
                    status = response.status(),
                    "handled request"
                );
                response
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, error = %error, "failed to read request body");
                Response::bad_request()
            }
        };
        if let Err(error) = incoming.respond(response.into_outgoing()) {
            warn!(target: DISPATCH_TARGET, error = %error, "failed to write response");
        }
    }
}
