// ABOUTME: HTTP/1.1 transport over a Unix domain socket or plain TCP.
// ABOUTME: Opens one connection per operation and ties its lifetime to the response body.

use super::{
    ConnectionGuard, GuardedBody, OutgoingBody, ResponseBody, Transport, TransportError,
};
use crate::config::Endpoint;
use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::header::{HOST, HeaderValue};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::{TcpStream, UnixStream};

/// Transport speaking HTTP/1.1 to a daemon endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Endpoint,
    connect_timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: Endpoint, connect_timeout: Duration) -> Self {
        Self {
            endpoint,
            connect_timeout,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn connect_with_timeout<F, T>(&self, connect: F) -> Result<T, TransportError>
    where
        F: std::future::Future<Output = std::io::Result<T>>,
    {
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            }),
            Err(_) => Err(TransportError::Timeout {
                endpoint: self.endpoint.to_string(),
                timeout: self.connect_timeout,
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        mut request: Request<OutgoingBody>,
    ) -> Result<Response<ResponseBody>, TransportError> {
        if !request.headers().contains_key(HOST) {
            let host = HeaderValue::from_str(&self.endpoint.host_header())
                .map_err(|e| TransportError::Other(format!("invalid host header: {e}")))?;
            request.headers_mut().insert(HOST, host);
        }

        match &self.endpoint {
            Endpoint::Unix(path) => {
                let stream = self.connect_with_timeout(UnixStream::connect(path)).await?;
                exchange(TokioIo::new(stream), request).await
            }
            Endpoint::Tcp { host, port } => {
                let stream = self
                    .connect_with_timeout(TcpStream::connect((host.as_str(), *port)))
                    .await?;
                stream.set_nodelay(true).ok();
                exchange(TokioIo::new(stream), request).await
            }
        }
    }
}

/// Run a single request/response exchange on a fresh connection.
async fn exchange<I>(
    io: I,
    request: Request<OutgoingBody>,
) -> Result<Response<ResponseBody>, TransportError>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(TransportError::Handshake)?;

    let task = tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("engine connection closed with error: {}", e);
        }
    });
    // From here on, any early return drops the guard and closes the socket.
    let guard = ConnectionGuard::new(task);

    let response = sender
        .send_request(request)
        .await
        .map_err(TransportError::Request)?;

    let (parts, body) = response.into_parts();
    let body = GuardedBody::new(body, guard.hold(sender)).boxed_unsync();

    Ok(Response::from_parts(parts, body))
}
