//! The response populated by a publish cycle.
//!
//! Turning a `Response` into bytes on the wire (status line, header casing,
//! cookies, charsets, compression) belongs to the transport; this type only
//! carries what the pipeline decided.

use crate::error::PublishError;
use crate::types::Value;

/// Response populated by one publish attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    /// Authentication realm advertised to unauthenticated clients.
    pub realm: Option<String>,
    pub debug_mode: bool,
    /// Text of the error recorded by [`Response::handle_exception`].
    pub exception: Option<String>,
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: None,
            realm: None,
            debug_mode: false,
            exception: None,
        }
    }

    /// Builds a `302 Found` response pointing at `location`.
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new();
        response.set_redirect(location);
        response
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Returns the first header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Sets a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Turns this response into a `302 Found` pointing at `location`.
    pub fn set_redirect(&mut self, location: &str) {
        self.status = 302;
        self.set_header("Location", location);
    }

    /// Records a failure that reached the process boundary without an error hook.
    ///
    /// Maps the error to a status and keeps its text; rendering an error page is
    /// left to the transport.
    pub fn handle_exception(&mut self, error: &PublishError) {
        self.exception = Some(error.to_string());
        match error {
            PublishError::NotFound { .. } => self.status = 404,
            PublishError::Redirect { location } => self.set_redirect(location),
            PublishError::MissingArgument { .. } | PublishError::NotPublishable { .. } => {
                self.status = 400;
            }
            PublishError::Overloaded => self.status = 503,
            PublishError::Timeout { .. } => self.status = 504,
            PublishError::Unsupported { .. }
            | PublishError::Retry { .. }
            | PublishError::Closed
            | PublishError::Fatal(_) => self.status = 500,
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ok_without_body() {
        let response = Response::new();
        assert_eq!(response.status(), 200);
        assert!(response.body().is_none());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut response = Response::new();
        response.set_header("Content-Type", "text/plain");
        response.set_header("content-type", "text/html");
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn redirect_sets_location() {
        let response = Response::redirect("/cancelled");
        assert_eq!(response.status(), 302);
        assert_eq!(response.header("location"), Some("/cancelled"));
    }

    #[test]
    fn handle_exception_maps_status() {
        let cases = [
            (PublishError::not_found("root", "x"), 404),
            (PublishError::MissingArgument { name: "id".into() }, 400),
            (PublishError::Overloaded, 503),
            (PublishError::Timeout { timeout_ms: 10 }, 504),
            (PublishError::retry("conflict"), 500),
        ];
        for (error, status) in cases {
            let mut response = Response::new();
            response.handle_exception(&error);
            assert_eq!(response.status(), status, "{error}");
            assert_eq!(response.exception.as_deref(), Some(error.to_string().as_str()));
            assert!(response.body().is_none());
        }
    }

    #[test]
    fn handle_exception_redirect_keeps_location() {
        let mut response = Response::new();
        response.handle_exception(&PublishError::Redirect {
            location: "/login".into(),
        });
        assert_eq!(response.status(), 302);
        assert_eq!(response.header("Location"), Some("/login"));
    }
}
