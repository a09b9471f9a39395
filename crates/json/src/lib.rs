//! JSON responses, JSON error handling and JSONP for `http` based web frameworks.
//!
//! ```
//! # use micro_json::{as_json, view_fn, Error, JsonError, JsonExt, JsonRequest};
//! # use http::{Request, StatusCode};
//! # use http_body_util::Empty;
//! # use bytes::Bytes;
//! # use serde_json::json;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ext = JsonExt::builder().build();
//!
//! let handler = as_json(view_fn(|req: JsonRequest| async move {
//!     match req.query_param("name") {
//!         Some(name) => Ok((json!({"hello": name}), StatusCode::OK)),
//!         None => Err(JsonError::new().description("name is required")),
//!     }
//! }));
//!
//! let request = Request::builder().uri("/?name=json").body(Empty::<Bytes>::new()).unwrap();
//! let response = ext.handle(&handler, request).await.unwrap();
//! assert_eq!(response.body().as_bytes().unwrap().as_ref(), br#"{"hello":"json","status":200}"#);
//! # }
//! ```

mod body;
mod decorator;
mod error;
mod ext;
mod handler;
mod http_error;
mod jsonp;
mod payload;
mod request;
mod response;

pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod normalize;

pub use body::ResponseBody;
pub use config::JsonConfig;
pub use decorator::{as_json, as_json_p, as_json_p_with, AsJson, AsJsonP, HandlerDecorator, JsonHandler, JsonpHandler};
pub use dispatch::{DecodeErrorHook, ErrorDispatcher, ErrorHook, Resolution};
pub use encoder::{Encoder, EncoderChain};
pub use error::{BoxError, Error, JsonError};
pub use ext::{JsonExt, JsonExtBuilder};
pub use handler::{handler_fn, view_fn, FnHandler, FnView, RequestHandler, ViewHandler};
pub use http_error::{HttpError, HttpErrorInfo, HttpErrorTable};
pub use jsonp::{wrap_jsonp, JsonpOptions};
pub use normalize::{normalize, IntoReturnValue, Normalized, NormalizedReturn, ReturnValue, TupleItem};
pub use payload::{Encodable, Fields, Payload};
pub use request::JsonRequest;
pub use response::JsonResponse;
