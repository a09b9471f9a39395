//! Generic HTTP errors raised by handlers or by the host framework (`404`, `405`, ...).
//!
//! When `JSONIFY_HTTP_ERRORS` is enabled the [`JsonExt`](crate::JsonExt) registers an
//! [`HttpErrorTable`] once at build time, and every error it knows about is rendered as
//! `{"reason": .., "description": .., "status": ..}` instead of a plain text page.

use crate::body::ResponseBody;
use http::{header, HeaderValue, Response, StatusCode};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

static DEFAULT_DESCRIPTIONS: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (400, "The browser (or proxy) sent a request that this server could not understand."),
        (
            401,
            "The server could not verify that you are authorized to access the URL requested. You either supplied \
             the wrong credentials (e.g. a bad password), or your browser doesn't understand how to supply the \
             credentials required.",
        ),
        (
            403,
            "You don't have the permission to access the requested resource. It is either read-protected or not \
             readable by the server.",
        ),
        (
            404,
            "The requested URL was not found on the server. If you entered the URL manually please check your \
             spelling and try again.",
        ),
        (405, "The method is not allowed for the requested URL."),
        (
            406,
            "The resource identified by the request is only capable of generating response entities which have \
             content characteristics not acceptable according to the accept headers sent in the request.",
        ),
        (
            408,
            "The server closed the network connection because the browser didn't finish the request within the \
             specified time.",
        ),
        (
            409,
            "A conflict happened while processing the request. The resource might have been modified while the \
             request was being processed.",
        ),
        (
            410,
            "The requested URL is no longer available on this server and there is no forwarding address. If you \
             followed a link from a foreign page, please contact the author of this page.",
        ),
        (411, "A request with this method requires a valid Content-Length header."),
        (412, "The precondition on the request for the URL failed positive evaluation."),
        (413, "The data value transmitted exceeds the capacity limit."),
        (
            414,
            "The length of the requested URL exceeds the capacity limit for this server. The request cannot be \
             processed.",
        ),
        (415, "The server does not support the media type transmitted in the request."),
        (416, "The server cannot provide the requested range."),
        (417, "The server could not meet the requirements of the Expect header"),
        (418, "This server is a teapot, not a coffee machine"),
        (422, "The request was well-formed but was unable to be followed due to semantic errors."),
        (423, "The resource that is being accessed is locked."),
        (
            424,
            "The method could not be performed on the resource because the requested action depended on another \
             action and that action failed.",
        ),
        (428, "This request is required to be conditional; try using \"If-Match\" or \"If-Unmodified-Since\"."),
        (429, "This user has exceeded an allotted request count. Try again later."),
        (431, "One or more header fields exceeds the maximum size."),
        (451, "Unavailable for legal reasons."),
        (
            500,
            "The server encountered an internal error and was unable to complete your request. Either the server is \
             overloaded or there is an error in the application.",
        ),
        (501, "The server does not support the action requested by the browser."),
        (502, "The proxy server received an invalid response from an upstream server."),
        (503, "The server is temporarily overloaded or down for maintenance. Please try again later."),
        (504, "The connection to an upstream server timed out."),
        (505, "The server does not support the HTTP protocol version used in the request."),
    ])
});

const FALLBACK_DESCRIPTION: &str = "An error occurred while processing the request.";

/// An HTTP error with an optional human readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    description: Option<String>,
}

impl HttpError {
    pub fn new(status: StatusCode) -> Self {
        Self { status, description: None }
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The error raised by JSONP handlers when a callback is required but not given.
    pub fn missing_callback() -> Self {
        Self::bad_request().with_description("Missing JSONP callback parameter.")
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The description given on construction; `None` when it was never set or is empty.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown Error")
    }

    pub fn default_description(&self) -> &'static str {
        DEFAULT_DESCRIPTIONS.get(&self.status.as_u16()).copied().unwrap_or(FALLBACK_DESCRIPTION)
    }

    /// Renders the error the way the host framework does when JSON errors are disabled.
    pub fn into_plain_response(self) -> Response<ResponseBody> {
        let text = format!(
            "{} {}\n\n{}\n",
            self.status.as_u16(),
            self.reason(),
            self.description().unwrap_or(self.default_description())
        );

        let mut response = Response::new(ResponseBody::from(text));
        *response.status_mut() = self.status;
        response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "{} {}: {}", self.status.as_u16(), self.reason(), description),
            None => write!(f, "{} {}", self.status.as_u16(), self.reason()),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<StatusCode> for HttpError {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

/// Reason phrase and default description of a registered error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpErrorInfo {
    pub reason: &'static str,
    pub description: &'static str,
}

/// The error codes which are rendered as JSON.
#[derive(Debug, Clone, Default)]
pub struct HttpErrorTable {
    entries: HashMap<StatusCode, HttpErrorInfo>,
}

impl HttpErrorTable {
    /// Registers every 4xx and 5xx status which has a standard reason phrase.
    pub fn standard() -> Self {
        let entries = (400u16..600)
            .filter_map(|code| StatusCode::from_u16(code).ok())
            .filter_map(|status| {
                let reason = status.canonical_reason()?;
                let description = HttpError::new(status).default_description();
                Some((status, HttpErrorInfo { reason, description }))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, status: StatusCode) -> Option<&HttpErrorInfo> {
        self.entries.get(&status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_and_description() {
        let error = HttpError::not_found();
        assert_eq!(error.reason(), "Not Found");
        assert!(error.default_description().starts_with("The requested URL was not found"));
        assert_eq!(error.description(), None);
    }

    #[test]
    fn test_empty_description_is_none() {
        let error = HttpError::not_found().with_description("");
        assert_eq!(error.description(), None);
    }

    #[test]
    fn test_standard_table() {
        let table = HttpErrorTable::standard();
        assert!(table.get(StatusCode::OK).is_none());
        assert_eq!(table.get(StatusCode::NOT_FOUND).unwrap().reason, "Not Found");
        assert_eq!(table.get(StatusCode::IM_A_TEAPOT).unwrap().reason, "I'm a teapot");
        assert!(table.get(StatusCode::from_u16(599).unwrap()).is_none());
        assert!(table.len() > 30);
    }

    #[test]
    fn test_plain_response() {
        let response = HttpError::bad_request().with_description("Custom message").into_plain_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.body().as_bytes().unwrap().as_ref(), b"400 Bad Request\n\nCustom message\n");
    }
}
