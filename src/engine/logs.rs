// ABOUTME: LogOps for EngineClient.
// ABOUTME: Hands the open response body to a multiplexed stream reader.

use super::EngineClient;
use super::traits::{AttachOptions, LogOps, LogOptions};
use crate::error::Result;
use crate::request;
use crate::stream::LogStream;
use crate::types::ContainerId;
use async_trait::async_trait;

#[async_trait]
impl LogOps for EngineClient {
    async fn container_logs(&self, id: &ContainerId, opts: &LogOptions) -> Result<LogStream> {
        let (context, response) = self.execute(request::container_logs(id, opts)?).await?;
        Ok(LogStream::new(response.into_body(), context))
    }

    async fn attach_container(
        &self,
        id: &ContainerId,
        opts: &AttachOptions,
    ) -> Result<LogStream> {
        let (context, response) = self
            .execute(request::attach_container(id, opts)?)
            .await?;
        Ok(LogStream::new(response.into_body(), context))
    }
}
