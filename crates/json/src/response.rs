//! The JSON response builder.
//!
//! ```
//! # use http::StatusCode;
//! # use micro_json::JsonExt;
//! let ext = JsonExt::builder().build();
//!
//! let response = ext.response().status(StatusCode::CREATED).field("id", 7).build().unwrap();
//! assert_eq!(response.status(), StatusCode::CREATED);
//! assert_eq!(response.body().as_bytes().unwrap().as_ref(), br#"{"id":7,"status":201}"#);
//! ```

use crate::body::ResponseBody;
use crate::config::JsonConfig;
use crate::encoder::EncoderChain;
use crate::error::Error;
use crate::payload::{Fields, Payload};
use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Response, StatusCode};
use std::fmt::Display;

/// Builds an `application/json` response.
///
/// The body is the `data` payload when given, the keyword fields otherwise. When `data` is a
/// mapping the fields are merged into it and take precedence. When the status policy is on
/// (the `ADD_STATUS` option unless overridden by [`JsonResponse::add_status`]) and the body is a
/// mapping, the HTTP status code is added under `STATUS_FIELD_NAME`, unless the body already has
/// that key.
#[derive(Debug)]
#[must_use]
pub struct JsonResponse<'ext> {
    config: &'ext JsonConfig,
    encoders: &'ext EncoderChain,
    status: StatusCode,
    headers: HeaderMap,
    add_status: Option<bool>,
    data: Option<Payload>,
    fields: Fields,
    error: Option<Error>,
}

impl<'ext> JsonResponse<'ext> {
    pub(crate) fn new(config: &'ext JsonConfig, encoders: &'ext EncoderChain) -> Self {
        Self {
            config,
            encoders,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            add_status: None,
            data: None,
            fields: Fields::new(),
            error: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a response header.
    ///
    /// An invalid name or value is reported by [`JsonResponse::build`].
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: Display,
        V: TryInto<HeaderValue>,
        V::Error: Display,
    {
        let header = key
            .try_into()
            .map_err(Error::invalid_header)
            .and_then(|key| value.try_into().map(|value| (key, value)).map_err(Error::invalid_header));

        match header {
            Ok((key, value)) => {
                self.headers.append(key, value);
            }
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (key, value) in &headers {
            self.headers.append(key.clone(), value.clone());
        }
        self
    }

    /// Overrides the `ADD_STATUS` option for this response.
    pub fn add_status(mut self, add_status: bool) -> Self {
        self.add_status = Some(add_status);
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Encodes the body and assembles the response.
    ///
    /// # Errors
    ///
    /// Fails when a header was invalid, when fields were given together with non-mapping
    /// `data`, or when the payload can not be encoded.
    pub fn build(self) -> Result<Response<ResponseBody>, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let add_status = self.add_status.unwrap_or(self.config.add_status());

        let data = self.data.filter(|data| !data.is_null());
        let mut fields = match data.map(Payload::into_fields) {
            None => self.fields,
            Some(Ok(mut data)) => {
                data.extend(self.fields);
                data
            }
            Some(Err(_)) if !self.fields.is_empty() => {
                return Err(Error::unsupported("fields can only be merged into mapping data"));
            }
            Some(Err(payload)) => {
                let value = self.encoders.encode(payload)?;
                return finish(self.status, &self.headers, &value);
            }
        };

        if add_status {
            fields.entry(self.config.status_field_name().to_owned()).or_insert_with(|| self.status.as_u16().into());
        }

        let value = self.encoders.encode(Payload::Map(fields))?;
        finish(self.status, &self.headers, &value)
    }
}

fn finish(status: StatusCode, extra: &HeaderMap, value: &serde_json::Value) -> Result<Response<ResponseBody>, Error> {
    let bytes = Bytes::from(serde_json::to_vec(value)?);

    let mut response = Response::new(ResponseBody::empty());
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    for (key, value) in extra {
        headers.append(key.clone(), value.clone());
    }

    *response.body_mut() = ResponseBody::once(bytes);
    Ok(response)
}
