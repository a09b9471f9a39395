//! Turning errors into JSON responses.
//!
//! The [`ErrorDispatcher`] offers each [`JsonError`] to the user registered [`ErrorHook`] first and
//! falls back to a response built from the error's status, headers and fields. Malformed request
//! JSON goes through the [`DecodeErrorHook`] the same way. HTTP errors are rendered as JSON when
//! `JSONIFY_HTTP_ERRORS` is on.

use crate::body::ResponseBody;
use crate::error::{Error, JsonError};
use crate::ext::JsonExt;
use crate::http_error::HttpError;
use crate::payload::Payload;
use http::Response;
use serde_json::Value;
use tracing::{debug, error, warn};

/// A user handler for [`JsonError`]s.
///
/// Returning `Ok(None)` defers to the default response, `Err` propagates to the host framework.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorHook: Send + Sync {
    fn handle(&self, ext: &JsonExt, error: &JsonError) -> Result<Option<Response<ResponseBody>>, Error>;
}

impl<F> ErrorHook for F
where
    F: Fn(&JsonExt, &JsonError) -> Result<Option<Response<ResponseBody>>, Error> + Send + Sync,
{
    fn handle(&self, ext: &JsonExt, error: &JsonError) -> Result<Option<Response<ResponseBody>>, Error> {
        (self)(ext, error)
    }
}

/// A user handler for request bodies which are not valid JSON.
///
/// `Ok(Some(value))` substitutes the parsed body, `Ok(None)` raises the default [`JsonError`] and
/// `Err` propagates as is.
#[cfg_attr(test, mockall::automock)]
pub trait DecodeErrorHook: Send + Sync {
    fn handle(&self, error: &serde_json::Error) -> Result<Option<Value>, Error>;
}

impl<F> DecodeErrorHook for F
where
    F: Fn(&serde_json::Error) -> Result<Option<Value>, Error> + Send + Sync,
{
    fn handle(&self, error: &serde_json::Error) -> Result<Option<Value>, Error> {
        (self)(error)
    }
}

/// Who produced the response for a dispatched error.
#[derive(Debug)]
pub enum Resolution {
    UserHook(Response<ResponseBody>),
    Default(Response<ResponseBody>),
}

impl Resolution {
    pub fn is_user_hook(&self) -> bool {
        matches!(self, Resolution::UserHook(_))
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        match self {
            Resolution::UserHook(response) | Resolution::Default(response) => response,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorDispatcher<'ext> {
    ext: &'ext JsonExt,
}

impl<'ext> ErrorDispatcher<'ext> {
    pub(crate) fn new(ext: &'ext JsonExt) -> Self {
        Self { ext }
    }

    /// Renders a [`JsonError`].
    ///
    /// # Errors
    ///
    /// Whatever the error hook fails with, or a build error of the default response.
    pub fn dispatch(&self, error: JsonError) -> Result<Response<ResponseBody>, Error> {
        self.resolve(error).map(Resolution::into_response)
    }

    /// Like [`ErrorDispatcher::dispatch`], but tells who handled the error.
    ///
    /// # Errors
    ///
    /// See [`ErrorDispatcher::dispatch`].
    pub fn resolve(&self, error: JsonError) -> Result<Resolution, Error> {
        if let Some(hook) = self.ext.error_hook() {
            if let Some(response) = hook.handle(self.ext, &error)? {
                debug!(status = %error.status(), "json error handled by user hook");
                return Ok(Resolution::UserHook(response));
            }
        }

        let (status, headers, fields) = error.into_parts();
        let response = self.ext.response().status(status).headers(headers).data(Payload::Map(fields)).build()?;
        Ok(Resolution::Default(response))
    }

    /// Handles a request body which failed to parse.
    ///
    /// # Errors
    ///
    /// Without a substitute from the hook this is always an error: the hook's own error, or a
    /// `400` [`JsonError`] described by `DECODE_ERROR_MESSAGE`.
    pub fn decode_error(&self, e: serde_json::Error) -> Result<Value, Error> {
        if let Some(hook) = self.ext.decode_error_hook() {
            if let Some(value) = hook.handle(&e)? {
                debug!(error = %e, "malformed request json replaced by hook");
                return Ok(value);
            }
        }

        warn!(error = %e, "malformed request json");
        let json_error = match self.ext.config().decode_error_message() {
            Some(message) => JsonError::new().description(message),
            None => JsonError::new(),
        };
        Err(json_error.into())
    }

    /// Renders an HTTP error, as JSON if the status is registered, as plain text otherwise.
    ///
    /// # Errors
    ///
    /// A build error of the JSON response.
    pub fn http_error(&self, e: HttpError) -> Result<Response<ResponseBody>, Error> {
        let Some(info) = self.ext.http_errors().and_then(|table| table.get(e.status())) else {
            return Ok(e.into_plain_response());
        };

        self.ext
            .response()
            .status(e.status())
            .field("reason", info.reason)
            .field("description", e.description().unwrap_or(info.description))
            .build()
    }

    /// Routes any crate error to the matching handler.
    ///
    /// # Errors
    ///
    /// Contract violations, and [`Error::Other`] unless `JSONIFY_HTTP_ERRORS` is on, are given back
    /// to the caller.
    pub fn dispatch_error(&self, e: Error) -> Result<Response<ResponseBody>, Error> {
        match e {
            Error::Json(e) => self.dispatch(e),
            Error::Http(e) => self.http_error(e),
            Error::Other(e) if self.ext.config().jsonify_http_errors() => {
                error!(cause = %e, "unhandled error rendered as internal server error");
                self.http_error(HttpError::internal_server_error())
            }
            e => {
                error!(cause = %e, "unrecoverable error");
                Err(e)
            }
        }
    }
}
