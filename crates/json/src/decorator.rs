//! Decorators turning a [`ViewHandler`] into a [`RequestHandler`].
//!
//! ```
//! # use micro_json::{as_json, view_fn, Error, JsonRequest};
//! # use serde_json::json;
//! let handler = as_json(view_fn(|_req: JsonRequest| async { Ok::<_, Error>(json!({"value": 1})) }));
//! ```

use crate::body::ResponseBody;
use crate::error::Error;
use crate::handler::{RequestHandler, ViewHandler};
use crate::jsonp::{wrap_jsonp, JsonpOptions};
use crate::normalize::normalize;
use crate::request::JsonRequest;
use async_trait::async_trait;
use http::Response;

pub trait HandlerDecorator<In: ViewHandler> {
    type Output: RequestHandler;

    fn decorate(&self, view: In) -> Self::Output;
}

/// Renders the view's return value as a JSON response.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsJson;

impl<V: ViewHandler> HandlerDecorator<V> for AsJson {
    type Output = JsonHandler<V>;

    fn decorate(&self, view: V) -> Self::Output {
        JsonHandler { view }
    }
}

/// Renders the view's return value as JSONP, see [`wrap_jsonp`].
#[derive(Debug, Default, Clone)]
pub struct AsJsonP {
    options: JsonpOptions,
}

impl AsJsonP {
    pub fn new(options: JsonpOptions) -> Self {
        Self { options }
    }
}

impl<V: ViewHandler> HandlerDecorator<V> for AsJsonP {
    type Output = JsonpHandler<V>;

    fn decorate(&self, view: V) -> Self::Output {
        JsonpHandler { view, options: self.options.clone() }
    }
}

#[derive(Debug)]
pub struct JsonHandler<V> {
    view: V,
}

#[async_trait]
impl<V: ViewHandler> RequestHandler for JsonHandler<V> {
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error> {
        let rv = self.view.call(request.clone()).await?;
        normalize(rv)?.into_response(request.ext().response())
    }
}

#[derive(Debug)]
pub struct JsonpHandler<V> {
    view: V,
    options: JsonpOptions,
}

#[async_trait]
impl<V: ViewHandler> RequestHandler for JsonpHandler<V> {
    async fn invoke(&self, request: JsonRequest) -> Result<Response<ResponseBody>, Error> {
        let rv = self.view.call(request.clone()).await?;
        wrap_jsonp(&request, rv, &self.options)
    }
}

pub fn as_json<V: ViewHandler>(view: V) -> JsonHandler<V> {
    AsJson.decorate(view)
}

/// JSONP with the `JSONP_*` options of the extension.
pub fn as_json_p<V: ViewHandler>(view: V) -> JsonpHandler<V> {
    as_json_p_with(JsonpOptions::default(), view)
}

pub fn as_json_p_with<V: ViewHandler>(options: JsonpOptions, view: V) -> JsonpHandler<V> {
    AsJsonP::new(options).decorate(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonError;
    use crate::ext::JsonExt;
    use crate::handler::view_fn;
    use crate::normalize::ReturnValue;
    use bytes::Bytes;
    use http::{header, HeaderValue, Request, StatusCode};
    use http_body_util::Empty;
    use serde_json::json;

    fn request(uri: &str) -> JsonRequest {
        JsonExt::builder().build().request(Request::builder().uri(uri).body(Empty::<Bytes>::new()).unwrap())
    }

    fn body_text(response: &Response<ResponseBody>) -> String {
        String::from_utf8(response.body().as_bytes().unwrap().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_as_json() {
        let handler = as_json(view_fn(|_req: JsonRequest| async { Ok::<_, Error>((json!({"value": 1}), StatusCode::UNAUTHORIZED)) }));

        let response = handler.invoke(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(&response), r#"{"value":1,"status":401}"#);
    }

    #[tokio::test]
    async fn test_as_json_passthrough() {
        let handler = as_json(view_fn(|_req: JsonRequest| async {
            let mut response = Response::new(ResponseBody::from("[]"));
            response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok::<_, Error>(response)
        }));

        let response = handler.invoke(request("/")).await.unwrap();
        assert_eq!(body_text(&response), "[]");
    }

    #[tokio::test]
    async fn test_as_json_errors_propagate() {
        let handler = as_json(view_fn(|_req: JsonRequest| async { Err::<(), _>(JsonError::new()) }));
        assert!(matches!(handler.invoke(request("/")).await, Err(Error::Json(_))));

        let handler = as_json(view_fn(|_req: JsonRequest| async { Ok::<_, Error>(ReturnValue::Tuple(vec![])) }));
        assert!(matches!(handler.invoke(request("/")).await, Err(Error::UnsupportedReturnValue { .. })));
    }

    #[tokio::test]
    async fn test_as_json_p() {
        let handler = as_json_p(view_fn(|_req: JsonRequest| async { Ok::<_, Error>("hello") }));

        let response = handler.invoke(request("/?callback=foo")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(body_text(&response), r#"foo("hello");"#);

        let response = handler.invoke(request("/")).await.unwrap();
        assert_eq!(body_text(&response), r#""hello""#);
    }

    #[tokio::test]
    async fn test_as_json_p_with_options() {
        let options = JsonpOptions::new().callbacks(["cb"]).optional(false).add_quotes(false);
        let handler = as_json_p_with(options, view_fn(|_req: JsonRequest| async { Ok::<_, Error>("x + 1") }));

        let response = handler.invoke(request("/?cb=f")).await.unwrap();
        assert_eq!(body_text(&response), "f(x + 1);");

        let result = handler.invoke(request("/?callback=f")).await;
        assert!(matches!(result, Err(Error::Http(e)) if e.status() == StatusCode::BAD_REQUEST));
    }
}
