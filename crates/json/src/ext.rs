use crate::body::ResponseBody;
use crate::config::JsonConfig;
use crate::dispatch::{DecodeErrorHook, ErrorDispatcher, ErrorHook};
use crate::encoder::{Encoder, EncoderChain};
use crate::error::{BoxError, Error};
use crate::handler::RequestHandler;
use crate::http_error::HttpErrorTable;
use crate::request::JsonRequest;
use crate::response::JsonResponse;
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body as HttpBody;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// The JSON extension: configuration plus every registered hook.
///
/// It is assembled once by [`JsonExtBuilder`] and shared as `Arc<JsonExt>` by all requests.
pub struct JsonExt {
    config: JsonConfig,
    encoders: EncoderChain,
    error_hook: Option<Box<dyn ErrorHook>>,
    decode_error_hook: Option<Box<dyn DecodeErrorHook>>,
    http_errors: Option<HttpErrorTable>,
}

impl JsonExt {
    pub fn builder() -> JsonExtBuilder {
        JsonExtBuilder::new()
    }

    pub fn config(&self) -> &JsonConfig {
        &self.config
    }

    pub fn encoders(&self) -> &EncoderChain {
        &self.encoders
    }

    /// Starts a JSON response using this extension's configuration and encoders.
    pub fn response(&self) -> JsonResponse<'_> {
        JsonResponse::new(&self.config, &self.encoders)
    }

    pub fn dispatcher(&self) -> ErrorDispatcher<'_> {
        ErrorDispatcher::new(self)
    }

    /// The error codes rendered as JSON; `None` unless `JSONIFY_HTTP_ERRORS` is on.
    pub fn http_errors(&self) -> Option<&HttpErrorTable> {
        self.http_errors.as_ref()
    }

    pub(crate) fn error_hook(&self) -> Option<&dyn ErrorHook> {
        self.error_hook.as_deref()
    }

    pub(crate) fn decode_error_hook(&self) -> Option<&dyn DecodeErrorHook> {
        self.decode_error_hook.as_deref()
    }

    pub fn request<B>(self: &Arc<Self>, request: Request<B>) -> JsonRequest
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        JsonRequest::new(request, Arc::clone(self))
    }

    /// Runs a handler for a request coming from the host framework.
    ///
    /// Handler failures go through [`ErrorDispatcher::dispatch_error`].
    ///
    /// # Errors
    ///
    /// The errors which can not be rendered as a response.
    pub async fn handle<H, B>(self: &Arc<Self>, handler: &H, request: Request<B>) -> Result<Response<ResponseBody>, Error>
    where
        H: RequestHandler + ?Sized,
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let request = self.request(request);
        match handler.invoke(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                debug!(error = %e, "handler failed");
                self.dispatcher().dispatch_error(e)
            }
        }
    }
}

impl fmt::Debug for JsonExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonExt")
            .field("config", &self.config)
            .field("encoders", &self.encoders)
            .field("error_hook", &self.error_hook.is_some())
            .field("decode_error_hook", &self.decode_error_hook.is_some())
            .field("http_errors", &self.http_errors.as_ref().map(HttpErrorTable::len))
            .finish()
    }
}

/// Registers hooks and builds a [`JsonExt`].
///
/// ```
/// # use micro_json::{JsonConfig, JsonExt};
/// # use serde_json::Value;
/// # use std::any::Any;
/// struct UserId(u64);
///
/// let ext = JsonExt::builder()
///     .config(JsonConfig::builder().jsonify_http_errors(true).build())
///     .encoder(|value: &dyn Any| value.downcast_ref::<UserId>().map(|id| Value::from(id.0)))
///     .build();
/// ```
#[derive(Default)]
pub struct JsonExtBuilder {
    config: JsonConfig,
    encoders: Vec<Box<dyn Encoder>>,
    error_hook: Option<Box<dyn ErrorHook>>,
    decode_error_hook: Option<Box<dyn DecodeErrorHook>>,
}

impl JsonExtBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: JsonConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an encoder. Encoders registered later are consulted first.
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoders.push(Box::new(encoder));
        self
    }

    /// Sets the handler of [`JsonError`](crate::JsonError)s, replacing any previous one.
    pub fn error_handler<H: ErrorHook + 'static>(mut self, hook: H) -> Self {
        self.error_hook = Some(Box::new(hook));
        self
    }

    /// Sets the handler of malformed request JSON, replacing any previous one.
    pub fn invalid_json_error<H: DecodeErrorHook + 'static>(mut self, hook: H) -> Self {
        self.decode_error_hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Arc<JsonExt> {
        let http_errors = self.config.jsonify_http_errors().then(HttpErrorTable::standard);

        info!(
            encoders = self.encoders.len(),
            jsonify_http_errors = http_errors.is_some(),
            "json extension initialized"
        );

        Arc::new(JsonExt {
            encoders: EncoderChain::new(&self.config, self.encoders),
            config: self.config,
            error_hook: self.error_hook,
            decode_error_hook: self.decode_error_hook,
            http_errors,
        })
    }
}

impl fmt::Debug for JsonExtBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonExtBuilder")
            .field("config", &self.config)
            .field("encoders", &self.encoders.len())
            .finish_non_exhaustive()
    }
}
