//! Turns whatever a view returns into the pieces of a JSON response.
//!
//! Typed returns implement [`IntoReturnValue`]: a payload alone, a pre-built JSON response, or a
//! payload paired with a status and/or headers:
//!
//! ```
//! # use http::{HeaderMap, StatusCode};
//! # use micro_json::normalize::IntoReturnValue;
//! # use serde_json::json;
//! let _ = json!({"value": 1}).into_return_value();
//! let _ = (json!({"value": 1}), StatusCode::UNAUTHORIZED).into_return_value();
//! let _ = (json!({"value": 1}), HeaderMap::new(), StatusCode::UNAUTHORIZED).into_return_value();
//! ```
//!
//! Returns whose shape is only known at runtime can be given as a [`ReturnValue::Tuple`] of one
//! to three [`TupleItem`]s. If the second item is a status the order is
//! `(payload, status, headers)`, otherwise `(payload, headers, status)`.

use crate::body::ResponseBody;
use crate::error::Error;
use crate::payload::{Fields, Payload};
use crate::response::JsonResponse;
use http::{header, HeaderMap, Response, StatusCode};
use serde_json::Value;
use tracing::trace;

/// The value produced by a view.
#[derive(Debug)]
pub enum ReturnValue {
    /// Nothing; rendered as an empty JSON object.
    None,
    /// A pre-built response, passed through as long as it is JSON.
    Response(Response<ResponseBody>),
    Payload(Payload),
    Tuple(Vec<TupleItem>),
    Normalized(NormalizedReturn),
}

#[derive(Debug)]
pub enum TupleItem {
    Null,
    Payload(Payload),
    Status(u16),
    Headers(HeaderMap),
}

/// A payload with an optional status and optional headers.
#[derive(Debug, Default)]
pub struct NormalizedReturn {
    payload: Option<Payload>,
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
}

impl NormalizedReturn {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self { payload: Some(payload.into()), status: None, headers: None }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn into_parts(self) -> (Option<Payload>, Option<StatusCode>, Option<HeaderMap>) {
        (self.payload, self.status, self.headers)
    }

    /// Feeds the parts into a response builder; the status defaults to `200 OK`.
    pub fn apply<'ext>(self, response: JsonResponse<'ext>) -> JsonResponse<'ext> {
        let mut response = response.status(self.status.unwrap_or(StatusCode::OK));
        if let Some(headers) = self.headers {
            response = response.headers(headers);
        }
        if let Some(payload) = self.payload {
            response = response.data(payload);
        }
        response
    }
}

/// The outcome of [`normalize`].
#[derive(Debug)]
pub enum Normalized {
    Response(Response<ResponseBody>),
    Return(NormalizedReturn),
}

impl Normalized {
    /// Builds the final response, or hands back the passthrough one.
    ///
    /// # Errors
    ///
    /// See [`JsonResponse::build`].
    pub fn into_response(self, response: JsonResponse<'_>) -> Result<Response<ResponseBody>, Error> {
        match self {
            Normalized::Response(passthrough) => Ok(passthrough),
            Normalized::Return(normalized) => normalized.apply(response).build(),
        }
    }
}

/// Normalizes a view's return value.
///
/// # Errors
///
/// * [`Error::InvalidResponseType`] for a pre-built response which is not `application/json`.
/// * [`Error::UnsupportedReturnValue`] for a tuple with a bad length, a mistyped slot or a status
///   code out of range.
pub fn normalize(rv: ReturnValue) -> Result<Normalized, Error> {
    let normalized = match rv {
        ReturnValue::None => NormalizedReturn::empty(),
        ReturnValue::Response(response) => return check_json_response(response).map(Normalized::Response),
        ReturnValue::Payload(payload) if payload.is_null() => NormalizedReturn::empty(),
        ReturnValue::Payload(payload) => NormalizedReturn::new(payload),
        ReturnValue::Tuple(items) => normalize_tuple(items)?,
        ReturnValue::Normalized(mut normalized) => {
            if normalized.payload.as_ref().is_some_and(Payload::is_null) {
                normalized.payload = None;
            }
            normalized
        }
    };
    Ok(Normalized::Return(normalized))
}

fn check_json_response(response: Response<ResponseBody>) -> Result<Response<ResponseBody>, Error> {
    let content_type = response.headers().get(header::CONTENT_TYPE);

    let is_json = content_type
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_JSON.essence_str());

    if is_json {
        Ok(response)
    } else {
        trace!(?content_type, "pre-built response is not json");
        Err(Error::invalid_response_type(content_type))
    }
}

fn normalize_tuple(items: Vec<TupleItem>) -> Result<NormalizedReturn, Error> {
    if items.is_empty() || items.len() > 3 {
        return Err(Error::unsupported(format!("tuple must have 1 to 3 items, got {}", items.len())));
    }

    let mut items = items.into_iter();
    let first = items.next().unwrap_or(TupleItem::Null);
    let second = items.next().unwrap_or(TupleItem::Null);
    let third = items.next().unwrap_or(TupleItem::Null);

    let (status, headers) = match second {
        TupleItem::Status(_) => (second, third),
        _ => (third, second),
    };

    let payload = match first {
        TupleItem::Null => None,
        TupleItem::Payload(payload) if payload.is_null() => None,
        TupleItem::Payload(payload) => Some(payload),
        TupleItem::Status(code) => Some(Payload::from(code)),
        TupleItem::Headers(_) => return Err(Error::unsupported("headers can not be the payload")),
    };

    let status = match status {
        TupleItem::Null => None,
        TupleItem::Status(code @ 100..=599) => Some(StatusCode::from_u16(code).map_err(Error::unsupported)?),
        TupleItem::Status(code) => return Err(Error::unsupported(format!("status code {code} is out of range"))),
        TupleItem::Payload(_) | TupleItem::Headers(_) => return Err(Error::unsupported("expected a status code")),
    };

    let headers = match headers {
        TupleItem::Null => None,
        TupleItem::Headers(headers) => Some(headers),
        TupleItem::Payload(_) | TupleItem::Status(_) => return Err(Error::unsupported("expected headers")),
    };

    Ok(NormalizedReturn { payload, status, headers })
}

/// Conversion of view results into a [`ReturnValue`].
pub trait IntoReturnValue {
    fn into_return_value(self) -> ReturnValue;
}

impl IntoReturnValue for ReturnValue {
    fn into_return_value(self) -> ReturnValue {
        self
    }
}

impl IntoReturnValue for () {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::None
    }
}

impl<T: IntoReturnValue> IntoReturnValue for Option<T> {
    fn into_return_value(self) -> ReturnValue {
        self.map_or(ReturnValue::None, IntoReturnValue::into_return_value)
    }
}

impl IntoReturnValue for Response<ResponseBody> {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Response(self)
    }
}

impl IntoReturnValue for NormalizedReturn {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(self)
    }
}

impl IntoReturnValue for Vec<TupleItem> {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Tuple(self)
    }
}

macro_rules! impl_into_return_value_for_payload {
    ($($ty:ty)*) => {
        $(
        impl IntoReturnValue for $ty {
            #[inline]
            fn into_return_value(self) -> ReturnValue {
                ReturnValue::Payload(Payload::from(self))
            }
        }
        )*
    };
}

impl_into_return_value_for_payload! { Payload Value Fields Vec<Payload> String &'static str bool i32 i64 u32 u64 f64 }

impl<P: Into<Payload>> IntoReturnValue for (P,) {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(NormalizedReturn::new(self.0))
    }
}

impl<P: Into<Payload>> IntoReturnValue for (P, StatusCode) {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(NormalizedReturn::new(self.0).with_status(self.1))
    }
}

impl<P: Into<Payload>> IntoReturnValue for (P, HeaderMap) {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(NormalizedReturn::new(self.0).with_headers(self.1))
    }
}

impl<P: Into<Payload>> IntoReturnValue for (P, StatusCode, HeaderMap) {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(NormalizedReturn::new(self.0).with_status(self.1).with_headers(self.2))
    }
}

impl<P: Into<Payload>> IntoReturnValue for (P, HeaderMap, StatusCode) {
    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Normalized(NormalizedReturn::new(self.0).with_headers(self.1).with_status(self.2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::JsonExt;
    use http::HeaderValue;
    use serde_json::json;

    fn normalized(rv: impl IntoReturnValue) -> NormalizedReturn {
        match normalize(rv.into_return_value()).unwrap() {
            Normalized::Return(normalized) => normalized,
            Normalized::Response(_) => panic!("unexpected passthrough response"),
        }
    }

    fn payload_json(normalized: &NormalizedReturn) -> Option<Value> {
        normalized.payload().map(|payload| match payload {
            Payload::Value(value) => value.clone(),
            other => panic!("unexpected payload {other:?}"),
        })
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-test", HeaderValue::from_static("1"));
        headers
    }

    #[test]
    fn test_none_is_empty() {
        let rv = normalized(());
        assert!(rv.payload().is_none());
        assert!(rv.status().is_none());
        assert!(rv.headers().is_none());

        assert!(normalized(Value::Null).payload().is_none());
        assert!(normalized(None::<Value>).payload().is_none());
    }

    #[test]
    fn test_payload_only() {
        let rv = normalized(json!({"value": 1}));
        assert_eq!(payload_json(&rv), Some(json!({"value": 1})));
        assert!(rv.status().is_none());

        let rv = normalized(json!([1, 2, 3]));
        assert_eq!(payload_json(&rv), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_typed_tuples() {
        let rv = normalized((json!({"value": 1}), StatusCode::UNAUTHORIZED));
        assert_eq!(payload_json(&rv), Some(json!({"value": 1})));
        assert_eq!(rv.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(rv.headers().is_none());

        let rv = normalized((json!({}), headers()));
        assert!(rv.status().is_none());
        assert_eq!(rv.headers().unwrap()["x-test"], "1");

        let rv = normalized((json!({}), headers(), StatusCode::CREATED));
        assert_eq!(rv.status(), Some(StatusCode::CREATED));
        assert!(rv.headers().is_some());
    }

    #[test]
    fn test_dynamic_tuple_sniffing() {
        let rv = normalized(vec![TupleItem::Payload(json!({"value": 1}).into()), TupleItem::Status(401)]);
        assert_eq!(payload_json(&rv), Some(json!({"value": 1})));
        assert_eq!(rv.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(rv.headers().is_none());

        let rv = normalized(vec![TupleItem::Payload(json!({}).into()), TupleItem::Headers(headers())]);
        assert!(rv.status().is_none());
        assert!(rv.headers().is_some());

        let rv = normalized(vec![TupleItem::Null, TupleItem::Headers(headers()), TupleItem::Status(404)]);
        assert!(rv.payload().is_none());
        assert_eq!(rv.status(), Some(StatusCode::NOT_FOUND));
        assert!(rv.headers().is_some());

        let rv = normalized(vec![TupleItem::Payload(json!([1]).into())]);
        assert_eq!(payload_json(&rv), Some(json!([1])));
    }

    #[test]
    fn test_unsupported_tuples() {
        let unsupported = |items: Vec<TupleItem>| {
            matches!(normalize(ReturnValue::Tuple(items)), Err(Error::UnsupportedReturnValue { .. }))
        };

        assert!(unsupported(vec![]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Null, TupleItem::Null, TupleItem::Null]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Status(1000)]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Status(600)]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Status(99)]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Payload(Payload::from(1))]));
        assert!(unsupported(vec![TupleItem::Null, TupleItem::Status(200), TupleItem::Status(201)]));
        assert!(unsupported(vec![TupleItem::Headers(headers())]));
    }

    #[test]
    fn test_idempotent() {
        let first = normalized((json!({"value": 1}), StatusCode::UNAUTHORIZED, headers()));
        let (payload, status, headers) = first.into_parts();

        let mut again = NormalizedReturn::new(payload.unwrap());
        again = again.with_status(status.unwrap()).with_headers(headers.unwrap());
        let second = normalized(again);

        assert_eq!(payload_json(&second), Some(json!({"value": 1})));
        assert_eq!(second.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(second.headers().unwrap()["x-test"], "1");
    }

    #[test]
    fn test_passthrough_response() {
        let mut response = Response::new(ResponseBody::from("{}"));
        response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(matches!(normalize(response.into_return_value()), Ok(Normalized::Response(_))));

        let mut response = Response::new(ResponseBody::from("<html/>"));
        response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let result = normalize(response.into_return_value());
        assert!(matches!(result, Err(Error::InvalidResponseType { content_type: Some(ref ct) }) if ct == "text/html"));

        let response = Response::new(ResponseBody::empty());
        assert!(matches!(normalize(response.into_return_value()), Err(Error::InvalidResponseType { content_type: None })));
    }

    #[test]
    fn test_into_response() {
        let ext = JsonExt::builder().build();
        let rv = normalize((json!({"value": 1}), StatusCode::UNAUTHORIZED).into_return_value()).unwrap();

        let response = rv.into_response(ext.response()).unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.body().as_bytes().unwrap().as_ref(), br#"{"value":1,"status":401}"#);
    }

    #[test]
    fn test_null_payload_is_empty_mapping() {
        let ext = JsonExt::builder().build();
        let render = |rv: ReturnValue| {
            let response = normalize(rv).unwrap().into_response(ext.response()).unwrap();
            response.body().as_bytes().unwrap().clone()
        };

        let typed = render((Value::Null, StatusCode::CREATED).into_return_value());
        let optional = render((None::<Value>, StatusCode::CREATED).into_return_value());
        let dynamic = render(ReturnValue::Tuple(vec![TupleItem::Null, TupleItem::Status(201)]));

        assert_eq!(typed.as_ref(), br#"{"status":201}"#);
        assert_eq!(optional, typed);
        assert_eq!(dynamic, typed);
    }
}
