// ABOUTME: Transport seam between the engine client and the daemon socket.
// ABOUTME: Defines body types, the Transport trait and connection-scoped body guards.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Frame, SizeHint};
use hyper::{Request, Response};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Boxed error carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body of a request sent to the daemon.
pub type OutgoingBody = UnsyncBoxBody<Bytes, BoxError>;

/// Body of a response received from the daemon.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Sends one HTTP exchange to the daemon.
///
/// Implementations must not retry. A response body keeps whatever
/// connection it came from alive until the body is dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: Request<OutgoingBody>,
    ) -> Result<Response<ResponseBody>, TransportError>;
}

/// Connection-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    #[error("{0}")]
    Other(String),
}

/// An empty request body.
pub fn empty_body() -> OutgoingBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A request body held fully in memory.
pub fn full_body(bytes: impl Into<Bytes>) -> OutgoingBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Owns the task driving one HTTP connection.
///
/// Dropping the guard aborts the task, which closes the socket on every
/// exit path: normal end of body, an error, or the caller dropping a stream.
pub struct ConnectionGuard<S> {
    task: JoinHandle<()>,
    _sender: Option<S>,
}

impl<S> ConnectionGuard<S> {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self {
            task,
            _sender: None,
        }
    }

    /// Keep the request handle alive for as long as the body is read.
    pub fn hold(mut self, sender: S) -> Self {
        self._sender = Some(sender);
        self
    }
}

impl<S> Drop for ConnectionGuard<S> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A response body that releases its connection when dropped.
pub struct GuardedBody<B, S> {
    inner: B,
    _guard: ConnectionGuard<S>,
}

impl<B, S> GuardedBody<B, S> {
    pub fn new(inner: B, guard: ConnectionGuard<S>) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl<B, S> Body for GuardedBody<B, S>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
    S: Unpin,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner)
            .poll_frame(cx)
            .map_err(Into::into)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn driver() -> (JoinHandle<()>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        (task, rx)
    }

    #[tokio::test]
    async fn guarded_body_passes_data_through() {
        let (task, _rx) = driver();
        let body = GuardedBody::new(
            Full::new(Bytes::from_static(b"payload")),
            ConnectionGuard::<()>::new(task),
        );

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"payload");
    }

    #[tokio::test]
    async fn dropping_the_body_aborts_the_connection_task() {
        let (task, rx) = driver();
        let body = GuardedBody::new(Empty::<Bytes>::new(), ConnectionGuard::new(task).hold(42_u8));

        drop(body);

        let closed = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("task should be aborted");
        assert!(closed.is_err());
    }
}
