// ABOUTME: Engine client: the public operation set over a daemon connection.
// ABOUTME: Drives request building, transport, status mapping and response decoding.

mod containers;
mod images;
mod logs;
mod system;
mod traits;

pub use traits::{
    AttachOptions, BuildOptions, BuildOutput, ContainerOps, FullEngine, ImageOps, LogOps,
    LogOptions, RemoveContainerOptions, RemoveImageOptions, SystemOps,
};

use crate::config::{ClientConfig, ConfigError};
use crate::error::{self, Error, ErrorContext, Result};
use crate::request::ApiRequest;
use crate::transport::{HttpTransport, ResponseBody, Transport, TransportError};
use crate::wire;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use traits::sealed::Sealed;

/// Client for one daemon.
///
/// Holds only connection configuration. Each operation opens its own
/// connection, so clones can be used concurrently without coordination.
#[derive(Clone)]
pub struct EngineClient {
    transport: Arc<dyn Transport>,
    api_version: Option<String>,
}

impl Sealed for EngineClient {}

impl EngineClient {
    pub fn new(config: &ClientConfig) -> Self {
        let transport = HttpTransport::new(config.host.clone(), config.connect_timeout);
        Self {
            transport: Arc::new(transport),
            api_version: config.api_version.clone(),
        }
    }

    /// Client configured from `DOCKER_HOST` and `DOCKER_API_VERSION`.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(&ClientConfig::from_env()?))
    }

    /// Client over a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>, api_version: Option<String>) -> Self {
        Self {
            transport,
            api_version,
        }
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
    ) -> Result<(ErrorContext, Response<ResponseBody>)> {
        let context = request.context();
        let method = request.method.clone();
        let uri = request.path_and_query(self.api_version.as_deref());
        tracing::debug!(operation = %context.operation, "{} {}", method, uri);

        let http = request.into_http(self.api_version.as_deref())?;
        let response = self
            .transport
            .send(http)
            .await
            .map_err(|source| Error::Transport {
                context: context.clone(),
                source,
            })?;

        Ok((context, response))
    }

    /// Send a request and map any non-2xx status onto the error taxonomy.
    async fn execute(
        &self,
        request: ApiRequest,
    ) -> Result<(ErrorContext, Response<ResponseBody>)> {
        self.execute_allowing(request, &[]).await
    }

    /// Like [`execute`](Self::execute), but treat the `tolerated` statuses as success.
    async fn execute_allowing(
        &self,
        request: ApiRequest,
        tolerated: &[StatusCode],
    ) -> Result<(ErrorContext, Response<ResponseBody>)> {
        let (context, response) = self.dispatch(request).await?;
        let status = response.status();

        if status.is_success() || tolerated.contains(&status) {
            return Ok((context, response));
        }

        let body = collect_body(&context, response.into_body()).await?;
        tracing::debug!(operation = %context.operation, %status, "daemon rejected request");
        Err(error::from_status(context, status, &body))
    }

    async fn read_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let (context, response) = self.execute(request).await?;
        let body = collect_body(&context, response.into_body()).await?;
        wire::decode(&body).map_err(|source| Error::Decode { context, source })
    }

    /// For operations whose only result is the side effect.
    async fn send_unit(&self, request: ApiRequest) -> Result<()> {
        let (context, response) = self.execute(request).await?;
        collect_body(&context, response.into_body()).await?;
        Ok(())
    }
}

impl fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineClient")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

async fn collect_body(context: &ErrorContext, body: ResponseBody) -> Result<Bytes> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|source| Error::Transport {
            context: context.clone(),
            source: TransportError::Body(source),
        })
}
