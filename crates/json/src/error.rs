//! Error types produced while building JSON responses.
//!
//! [`Error`] is the single error type that flows through handlers, the response builder and
//! the [`ErrorDispatcher`](crate::dispatch::ErrorDispatcher). Two of its variants are
//! *recoverable*: [`JsonError`] and [`HttpError`](crate::HttpError) are turned into responses by
//! the dispatcher. Everything else describes a programming-contract violation and is handed back
//! to the host framework untouched.

use crate::http_error::HttpError;
use crate::payload::{Fields, Payload};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use std::fmt;
use thiserror::Error;
use tracing::warn;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] JsonError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("unsupported return value: {reason}")]
    UnsupportedReturnValue { reason: String },

    #[error("response must have json content type, got: {content_type:?}")]
    InvalidResponseType { content_type: Option<String> },

    #[error("object of type {type_name} is not JSON serializable")]
    NotSerializable { type_name: &'static str },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid {kind} format: {pattern}")]
    InvalidFormat { kind: &'static str, pattern: String },

    #[error("json encode error: {source}")]
    Encode {
        #[from]
        source: serde_json::Error,
    },

    #[error("request body error: {source}")]
    Body { source: BoxError },

    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    pub fn unsupported<S: ToString>(reason: S) -> Self {
        Self::UnsupportedReturnValue { reason: reason.to_string() }
    }

    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    pub fn invalid_response_type(content_type: Option<&HeaderValue>) -> Self {
        let content_type = content_type.map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        Self::InvalidResponseType { content_type }
    }

    pub fn body<E: Into<BoxError>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }

    pub fn other<E: Into<BoxError>>(e: E) -> Self {
        Self::Other(e.into())
    }

    /// Whether the [`ErrorDispatcher`](crate::dispatch::ErrorDispatcher) can turn this error
    /// into a response without extra configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Json(_) | Error::Http(_))
    }
}

/// An application-level failure which is converted to a JSON response.
///
/// It carries the HTTP status (400 unless told otherwise), extra response headers and the
/// fields to put in the JSON body:
///
/// ```
/// # use http::StatusCode;
/// # use micro_json::JsonError;
/// let error = JsonError::new().description("text");
/// let error = JsonError::with_status(StatusCode::UNAUTHORIZED).field("one", "text").field("two", 12);
/// ```
#[derive(Debug)]
pub struct JsonError {
    status: StatusCode,
    headers: HeaderMap,
    fields: Fields,
}

impl JsonError {
    /// Creates a `400 Bad Request` error with no fields.
    pub fn new() -> Self {
        Self { status: StatusCode::BAD_REQUEST, headers: HeaderMap::new(), fields: Fields::new() }
    }

    /// Creates an error with the given status.
    ///
    /// # Panics
    ///
    /// Panics if `status` is `200 OK`: an error must never look like a success.
    pub fn with_status(status: StatusCode) -> Self {
        assert_ne!(status, StatusCode::OK, "JsonError status must not be 200");
        Self { status, ..Self::new() }
    }

    /// Appends a response header. Names or values which are not valid HTTP are logged and skipped.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: fmt::Display,
        V: TryInto<HeaderValue>,
        V::Error: fmt::Display,
    {
        match key.try_into() {
            Ok(key) => match value.try_into() {
                Ok(value) => {
                    self.headers.append(key, value);
                }
                Err(e) => warn!(header = %key, cause = %e, "skipping invalid error header value"),
            },
            Err(e) => warn!(cause = %e, "skipping invalid error header name"),
        }
        self
    }

    /// Appends all `headers`, keeping values already set under the same names.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (key, value) in &headers {
            self.headers.append(key.clone(), value.clone());
        }
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.field("description", description.into())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Fields) {
        (self.status, self.headers, self.fields)
    }
}

impl Default for JsonError {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "json error with status {}", self.status)
    }
}

impl std::error::Error for JsonError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_error_is_bad_request() {
        let error = JsonError::new();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.fields().is_empty());
        assert!(error.header_map().is_empty());
    }

    #[test]
    fn headers_are_appended() {
        let mut extra = HeaderMap::new();
        extra.insert("x-a", HeaderValue::from_static("2"));

        let error = JsonError::new().header("x-a", "1").headers(extra);

        let values: Vec<_> = error.header_map().get_all("x-a").iter().collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    #[should_panic(expected = "must not be 200")]
    fn ok_status_is_rejected() {
        let _ = JsonError::with_status(StatusCode::OK);
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let error = JsonError::new().header("X-Valid", "1").header("bad header", "2").header("x-b", "bad\nvalue");
        assert_eq!(error.header_map().len(), 1);
        assert_eq!(error.header_map()["x-valid"], "1");
    }

    #[test]
    fn recoverable_variants() {
        assert!(Error::from(JsonError::new()).is_recoverable());
        assert!(Error::from(HttpError::not_found()).is_recoverable());
        assert!(!Error::unsupported("nope").is_recoverable());
        assert!(!Error::NotSerializable { type_name: "Foo" }.is_recoverable());
    }
}
