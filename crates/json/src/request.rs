use crate::body::OptionReqBody;
use crate::error::{BoxError, Error, JsonError};
use crate::ext::JsonExt;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri};
use http_body::Body as HttpBody;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// A request as seen by JSON views.
///
/// Cloning is cheap: clones share the request head, the body and the extension.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    parts: Arc<Parts>,
    body: OptionReqBody,
    ext: Arc<JsonExt>,
}

impl JsonRequest {
    pub(crate) fn new<B>(request: Request<B>, ext: Arc<JsonExt>) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        Self { parts: Arc::new(parts), body: OptionReqBody::new(body), ext }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn ext(&self) -> &Arc<JsonExt> {
        &self.ext
    }

    /// The first value of the query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.parts.uri.query()?;
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                trace!(error = %e, query, "can't parse query string");
                return None;
            }
        };
        pairs.into_iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// The raw request body. It is read on the first call, later calls get the same bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Body`] when the body can not be read.
    pub async fn body_bytes(&self) -> Result<Bytes, Error> {
        self.body.bytes().await
    }

    /// Parses the body as JSON.
    ///
    /// A malformed body goes through the decode error hook, which may substitute a value.
    ///
    /// # Errors
    ///
    /// The body can not be read, or it is malformed and no substitute was given.
    pub async fn get_json(&self) -> Result<Value, Error> {
        let bytes = self.body_bytes().await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => self.ext.dispatcher().decode_error(e),
        }
    }

    /// Deserializes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// As [`JsonRequest::get_json`]; a body which does not fit `T` is a `400` [`JsonError`].
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let value = self.get_json().await?;
        serde_json::from_value(value).map_err(|e| JsonError::new().description(e.to_string()).into())
    }
}
