use crate::error::{BoxError, Error};
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;

pub(crate) type ReqBody = UnsyncBoxBody<Bytes, BoxError>;

/// The request body shared by every clone of a [`JsonRequest`](crate::JsonRequest).
///
/// The body is collected the first time it is read; later reads get the cached bytes.
#[derive(Clone)]
pub(crate) struct OptionReqBody {
    inner: Arc<Mutex<BodyState>>,
}

enum BodyState {
    Pending(ReqBody),
    Collected(Bytes),
    Failed,
}

impl OptionReqBody {
    pub(crate) fn new<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let body = body.map_err(Into::into).boxed_unsync();
        Self { inner: Arc::new(Mutex::new(BodyState::Pending(body))) }
    }

    pub(crate) async fn bytes(&self) -> Result<Bytes, Error> {
        let mut guard = self.inner.lock().await;

        let body = match std::mem::replace(&mut *guard, BodyState::Failed) {
            BodyState::Collected(bytes) => {
                *guard = BodyState::Collected(bytes.clone());
                return Ok(bytes);
            }
            BodyState::Failed => return Err(Error::body("request body has failed to read before")),
            BodyState::Pending(body) => body,
        };

        let bytes = body.collect().await.map_err(Error::body)?.to_bytes();
        *guard = BodyState::Collected(bytes.clone());
        Ok(bytes)
    }
}

impl std::fmt::Debug for OptionReqBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionReqBody").finish_non_exhaustive()
    }
}

/// A response body which is fully built in memory.
#[derive(Debug, Clone, Default)]
pub struct ResponseBody {
    inner: Option<Bytes>,
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Some(bytes) } }
    }

    /// The bytes not yet polled out of the body, `None` if the body is empty.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        self.inner.as_ref()
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<()> for ResponseBody {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl From<Option<Bytes>> for ResponseBody {
    fn from(option: Option<Bytes>) -> Self {
        option.map_or_else(Self::empty, Self::once)
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().inner.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use crate::body::{OptionReqBody, ResponseBody};
    use bytes::Bytes;
    use http_body::Body as HttpBody;
    use http_body_util::{BodyExt, Full};

    fn check_send<T: Send + Sync>() {}

    #[test]
    fn is_send() {
        check_send::<ResponseBody>();
        check_send::<OptionReqBody>();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_string_body() {
        let s = "Hello world".to_string();
        let len = s.len() as u64;

        let mut body = ResponseBody::from(s);

        assert_eq!(body.size_hint().exact(), Some(len));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from("Hello world"));

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_empty_body() {
        let mut body = ResponseBody::from("");

        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));

        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn test_request_body_is_cached() {
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"{\"a\": 1}")));
        let cloned = body.clone();

        assert_eq!(body.bytes().await.unwrap(), Bytes::from_static(b"{\"a\": 1}"));
        assert_eq!(cloned.bytes().await.unwrap(), Bytes::from_static(b"{\"a\": 1}"));
    }
}
