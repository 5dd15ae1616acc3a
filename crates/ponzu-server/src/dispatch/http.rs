//! Request and response values exchanged with route handlers, and their
//! conversion to and from `tiny_http`.

use std::io::{self, Cursor, Read};

use serde::Serialize;
use tiny_http::{Header, StatusCode};

/// Upper bound on a request body read before dispatch.
pub(crate) const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// A request as seen by route handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
}

impl Request {
    /// Builds a request from its method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Request method, for example `GET`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Converts an incoming request, consuming its body.
    ///
    /// A kept-alive connection only yields its next request once this body
    /// has been read to the end.
    pub(crate) fn from_incoming(incoming: &mut tiny_http::Request) -> io::Result<Self> {
        let request = Self::new(incoming.method().to_string(), request_path(incoming.url()));
        let mut body = incoming.as_reader().take(MAX_BODY_BYTES);
        io::copy(&mut body, &mut io::sink())?;
        Ok(request)
    }
}

fn request_path(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// A response produced by a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// Builds a `text/plain` response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_owned(),
                "text/plain; charset=utf-8".to_owned(),
            )],
            body: body.into().into_bytes(),
        }
    }

    /// Builds an `application/json` response from a serialisable value.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
                body,
            },
            Err(error) => Self::text(500, format!("failed to encode response: {error}")),
        }
    }

    /// `404 Not Found`.
    #[must_use]
    pub fn not_found() -> Self {
        Self::text(404, "not found\n")
    }

    /// `405 Method Not Allowed`.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::text(405, "method not allowed\n")
    }

    /// `400 Bad Request`.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::text(400, "bad request\n")
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Adds a header unless one with the same name is present.
    pub(crate) fn with_default_header(mut self, name: &str, value: &str) -> Self {
        if self.header(name).is_none() {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
        self
    }

    /// Converts into a `tiny_http` response. Headers that are not valid
    /// ASCII are dropped.
    pub(crate) fn into_outgoing(self) -> tiny_http::Response<Cursor<Vec<u8>>> {
        let Self {
            status,
            headers,
            body,
        } = self;
        headers
            .iter()
            .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
            .fold(
                tiny_http::Response::from_data(body).with_status_code(StatusCode(status)),
                |outgoing, header| outgoing.with_header(header),
            )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/api/types", "/api/types")]
    #[case("/admin?tab=1", "/admin")]
    #[case("/?", "/")]
    fn query_strings_are_stripped(#[case] url: &str, #[case] path: &str) {
        assert_eq!(request_path(url), path);
    }

    #[test]
    fn default_headers_do_not_override_handler_headers() {
        let response = Response::json(200, &["Song"])
            .with_default_header("content-type", "text/html")
            .with_default_header("X-Frame-Options", "DENY");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
    }

    #[test]
    fn outgoing_responses_keep_status_and_body_length() {
        let outgoing = Response::text(404, "not found\n").into_outgoing();
        assert_eq!(outgoing.status_code(), StatusCode(404));
        assert_eq!(outgoing.data_length(), Some(10));
    }
}
