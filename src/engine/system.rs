// ABOUTME: SystemOps for EngineClient.
// ABOUTME: Ping, version and info against the daemon.

use super::EngineClient;
use super::traits::SystemOps;
use crate::error::Result;
use crate::request;
use crate::wire::{Info, Version};
use async_trait::async_trait;

#[async_trait]
impl SystemOps for EngineClient {
    async fn ping(&self) -> Result<()> {
        self.send_unit(request::ping()).await
    }

    async fn version(&self) -> Result<Version> {
        self.read_json(request::version()).await
    }

    async fn info(&self) -> Result<Info> {
        self.read_json(request::info()).await
    }
}
