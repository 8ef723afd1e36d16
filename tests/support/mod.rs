// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted in-memory transport and wire fixture helpers.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dockwire::EngineClient;
use dockwire::transport::{
    BoxError, ConnectionGuard, GuardedBody, OutgoingBody, ResponseBody, Transport,
    TransportError,
};
use futures::StreamExt;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use tokio::sync::oneshot;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("dockwire=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.uri.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> &str {
        self.uri.split_once('?').map(|(_, q)| q).unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Status plus a body delivered in the given chunks.
    Chunks(StatusCode, Vec<Bytes>),
    /// Chunks, then a body read error.
    Broken(StatusCode, Vec<Bytes>),
    /// Chunks, then a body that never ends, held open by a connection task.
    /// The sender is dropped when that task is aborted.
    Open(StatusCode, Vec<Bytes>, Arc<Mutex<Option<oneshot::Sender<()>>>>),
    /// Fail before any response arrives.
    Refused,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self::bytes(status, body.as_bytes().to_vec())
    }

    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self::Chunks(StatusCode::from_u16(status).unwrap(), vec![body.into()])
    }

    pub fn empty(status: u16) -> Self {
        Self::Chunks(StatusCode::from_u16(status).unwrap(), Vec::new())
    }

    pub fn chunks(status: u16, chunks: Vec<Vec<u8>>) -> Self {
        Self::Chunks(
            StatusCode::from_u16(status).unwrap(),
            chunks.into_iter().map(Bytes::from).collect(),
        )
    }

    /// A body that stays open after `chunks`, plus a receiver that resolves
    /// once the connection behind it has been torn down.
    pub fn open(chunks: Vec<Vec<u8>>) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self::Open(
            StatusCode::OK,
            chunks.into_iter().map(Bytes::from).collect(),
            Arc::new(Mutex::new(Some(tx))),
        );
        (reply, rx)
    }

    pub fn broken(chunks: Vec<Vec<u8>>) -> Self {
        Self::Broken(
            StatusCode::OK,
            chunks.into_iter().map(Bytes::from).collect(),
        )
    }
}

/// Transport that replays scripted replies and records every request.
///
/// When the script runs out it answers `200 {}`.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: Request<OutgoingBody>,
    ) -> Result<Response<ResponseBody>, TransportError> {
        let (parts, body) = request.into_parts();
        let body = body.collect().await.map_err(TransportError::Body)?.to_bytes();

        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri.to_string(),
            content_type: parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::json(200, "{}"));

        let (status, body) = match reply {
            Reply::Chunks(status, chunks) => (status, chunked(chunks, None)),
            Reply::Broken(status, chunks) => {
                (status, chunked(chunks, Some(BoxError::from("connection reset by peer"))))
            }
            Reply::Open(status, chunks, connection) => {
                (status, held_open(chunks, connection.lock().unwrap().take()))
            }
            Reply::Refused => {
                return Err(TransportError::Connect {
                    endpoint: "unix:///mock.sock".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                });
            }
        };

        Ok(Response::builder().status(status).body(body).unwrap())
    }
}

fn chunked(chunks: Vec<Bytes>, tail: Option<BoxError>) -> ResponseBody {
    if chunks.len() <= 1 && tail.is_none() {
        let body = chunks.into_iter().next().unwrap_or_default();
        return Full::new(body).map_err(|never| match never {}).boxed_unsync();
    }

    let frames = chunks
        .into_iter()
        .map(|chunk| Ok::<_, BoxError>(Frame::data(chunk)))
        .chain(tail.map(Err));
    StreamBody::new(futures::stream::iter(frames)).boxed_unsync()
}

/// Body guarded the way the HTTP transport guards it: a spawned task
/// stands in for the connection driver and lives until the guard aborts it.
fn held_open(chunks: Vec<Bytes>, connection: Option<oneshot::Sender<()>>) -> ResponseBody {
    let task = tokio::spawn(async move {
        let _connection = connection;
        std::future::pending::<()>().await;
    });

    let frames = chunks
        .into_iter()
        .map(|chunk| Ok::<_, BoxError>(Frame::data(chunk)))
        .collect::<Vec<_>>();
    let body = StreamBody::new(futures::stream::iter(frames).chain(futures::stream::pending()));
    GuardedBody::new(body, ConnectionGuard::<()>::new(task)).boxed_unsync()
}

/// Client over a fresh mock with the given script.
pub fn mock_client(replies: impl IntoIterator<Item = Reply>) -> (EngineClient, Arc<MockTransport>) {
    let transport = MockTransport::new(replies);
    let client = EngineClient::with_transport(transport.clone(), None);
    (client, transport)
}

/// One multiplexed log frame.
pub fn frame(stream: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![stream, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Newline-terminated JSON lines.
pub fn lines(records: &[&str]) -> Vec<u8> {
    records.iter().flat_map(|r| format!("{r}\n").into_bytes()).collect()
}
