//! JSONP support: wrapping a view's result in a javascript callback call.
//!
//! With `?callback=foo` a view returning `"hello"` produces `foo("hello");`, a view returning a
//! mapping produces `foo({"key":"value"});`. The response is always `200 OK` with
//! `Content-Type: application/javascript`, so a status or headers returned by the view are lost.
//! The status field is never added to JSONP bodies.

use crate::body::ResponseBody;
use crate::error::Error;
use crate::http_error::HttpError;
use crate::normalize::{normalize, ReturnValue};
use crate::payload::Payload;
use crate::request::JsonRequest;
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::Response;
use serde_json::Value;
use tracing::debug;

/// Per view overrides of the `JSONP_*` options.
#[derive(Debug, Clone, Default)]
pub struct JsonpOptions {
    callbacks: Option<Vec<String>>,
    optional: Option<bool>,
    add_quotes: Option<bool>,
}

impl JsonpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query parameters holding the callback name, checked in order.
    #[must_use]
    pub fn callbacks<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.callbacks = Some(callbacks.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a request without callback gets a plain JSON response instead of a `400`.
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Whether string results are passed to the callback as string literals.
    #[must_use]
    pub fn add_quotes(mut self, add_quotes: bool) -> Self {
        self.add_quotes = Some(add_quotes);
        self
    }
}

/// Builds the JSONP response for a view's return value.
///
/// # Errors
///
/// The `400` "missing callback" [`HttpError`] when a callback is required but the request has
/// none, otherwise the errors of building a JSON response.
pub fn wrap_jsonp(request: &JsonRequest, rv: ReturnValue, options: &JsonpOptions) -> Result<Response<ResponseBody>, Error> {
    let ext = request.ext();
    let config = ext.config();

    let names = options
        .callbacks
        .as_deref()
        .filter(|names| !names.is_empty())
        .unwrap_or(config.jsonp_query_callbacks());
    let Some(callback) = names.iter().find_map(|name| request.query_param(name)) else {
        if options.optional.unwrap_or(config.jsonp_optional()) {
            return normalize(rv)?.into_response(ext.response());
        }
        debug!(?names, "jsonp callback is required");
        return Err(HttpError::missing_callback().into());
    };

    let data = match rv {
        ReturnValue::Payload(Payload::Value(Value::String(text))) => {
            let text = text.strip_suffix('\n').unwrap_or(&text);
            if options.add_quotes.unwrap_or(config.jsonp_string_quotes()) {
                format!("\"{}\"", text.replace('"', "\\\""))
            } else {
                text.to_owned()
            }
        }
        rv => {
            let response = normalize(rv)?.into_response(ext.response().add_status(false))?;
            let body = response.body().as_bytes().cloned().unwrap_or_default();
            let body = String::from_utf8_lossy(&body);
            body.strip_suffix('\n').unwrap_or(&body).to_owned()
        }
    };

    let bytes = Bytes::from(format!("{callback}({data});"));

    let mut response = Response::new(ResponseBody::empty());
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/javascript"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    *response.body_mut() = ResponseBody::once(bytes);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonConfig;
    use crate::ext::JsonExt;
    use crate::normalize::IntoReturnValue;
    use http::{HeaderMap, Request, StatusCode};
    use http_body_util::Empty;
    use serde_json::json;
    use std::sync::Arc;

    fn request_with(ext: &Arc<JsonExt>, uri: &str) -> JsonRequest {
        ext.request(Request::builder().uri(uri).body(Empty::<Bytes>::new()).unwrap())
    }

    fn request(uri: &str) -> JsonRequest {
        request_with(&JsonExt::builder().build(), uri)
    }

    fn body_text(response: &Response<ResponseBody>) -> String {
        String::from_utf8(response.body().as_bytes().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_quoted_string() {
        let response = wrap_jsonp(&request("/?callback=foo"), "hello".into_return_value(), &JsonpOptions::new()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(body_text(&response), r#"foo("hello");"#);
    }

    #[test]
    fn test_string_escaping_and_newline() {
        let rv = "say \"hi\"\n".into_return_value();
        let response = wrap_jsonp(&request("/?callback=foo"), rv, &JsonpOptions::new()).unwrap();
        assert_eq!(body_text(&response), r#"foo("say \"hi\"");"#);
    }

    #[test]
    fn test_unquoted_string() {
        let options = JsonpOptions::new().add_quotes(false);
        let response = wrap_jsonp(&request("/?callback=foo"), "hello".into_return_value(), &options).unwrap();
        assert_eq!(body_text(&response), "foo(hello);");

        let config = JsonConfig::builder().jsonp_string_quotes(false).build();
        let ext = JsonExt::builder().config(config).build();
        let rv = "hello".into_return_value();
        let response = wrap_jsonp(&request_with(&ext, "/?callback=foo"), rv, &JsonpOptions::new()).unwrap();
        assert_eq!(body_text(&response), "foo(hello);");
    }

    #[test]
    fn test_json_without_status_field() {
        let rv = (json!({"x": 1}), StatusCode::CREATED, HeaderMap::new()).into_return_value();
        let response = wrap_jsonp(&request("/?jsonp=bar"), rv, &JsonpOptions::new()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(&response), r#"bar({"x":1});"#);

        let response = wrap_jsonp(&request("/?callback=foo"), ReturnValue::None, &JsonpOptions::new()).unwrap();
        assert_eq!(body_text(&response), "foo({});");

        let response = wrap_jsonp(&request("/?callback=foo"), json!([1, 2]).into_return_value(), &JsonpOptions::new()).unwrap();
        assert_eq!(body_text(&response), "foo([1,2]);");
    }

    #[test]
    fn test_callback_order() {
        let rv = || 1_i32.into_return_value();

        let response = wrap_jsonp(&request("/?jsonp=b&callback=a"), rv(), &JsonpOptions::new()).unwrap();
        assert_eq!(body_text(&response), "a(1);");

        let options = JsonpOptions::new().callbacks(["cb"]);
        let response = wrap_jsonp(&request("/?callback=a&cb=c"), rv(), &options).unwrap();
        assert_eq!(body_text(&response), "c(1);");

        let options = JsonpOptions::new().callbacks(Vec::<String>::new());
        let response = wrap_jsonp(&request("/?callback=a"), rv(), &options).unwrap();
        assert_eq!(body_text(&response), "a(1);");
    }

    #[test]
    fn test_optional_callback() {
        let rv = json!({"x": 1}).into_return_value();
        let response = wrap_jsonp(&request("/"), rv, &JsonpOptions::new()).unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_text(&response), r#"{"x":1,"status":200}"#);
    }

    #[test]
    fn test_required_callback() {
        let options = JsonpOptions::new().optional(false);
        let result = wrap_jsonp(&request("/?other=1"), "hello".into_return_value(), &options);

        let Err(Error::Http(error)) = result else {
            panic!("expected http error");
        };
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.description(), Some("Missing JSONP callback parameter."));
    }
}
