use crate::body::ResponseBody;
use crate::error::Error;
use crate::normalize::{IntoReturnValue, ReturnValue};
use crate::request::JsonRequest;
use async_trait::async_trait;
use http::Response;
use std::future::Future;
use std::sync::Arc;

/// A handler producing the final HTTP response.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error>;
}

/// A view producing a value to be rendered as JSON, see [`as_json`](crate::as_json).
#[async_trait]
pub trait ViewHandler: Send + Sync {
    async fn call(&self, request: JsonRequest) -> Result<ReturnValue, Error>;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error> {
        (**self).invoke(request).await
    }
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error> {
        (**self).invoke(request).await
    }
}

/// an async fn used as a [`ViewHandler`]
#[derive(Debug, Clone, Copy)]
pub struct FnView<F> {
    f: F,
}

/// Wraps an async fn taking a [`JsonRequest`] and returning `Result<impl IntoReturnValue, E>`.
pub fn view_fn<F>(f: F) -> FnView<F> {
    FnView { f }
}

#[async_trait]
impl<F, Fut, R, E> ViewHandler for FnView<F>
where
    F: Fn(JsonRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoReturnValue + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    async fn call(&self, request: JsonRequest) -> Result<ReturnValue, Error> {
        match (self.f)(request).await {
            Ok(rv) => Ok(rv.into_return_value()),
            Err(e) => Err(e.into()),
        }
    }
}

/// an async fn used as a [`RequestHandler`]
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<F, Fut, E> RequestHandler for FnHandler<F>
where
    F: Fn(JsonRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<ResponseBody>, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error> {
        (self.f)(request).await.map_err(Into::into)
    }
}
