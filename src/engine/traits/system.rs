// ABOUTME: Daemon-wide operations trait for the engine client.
// ABOUTME: Ping, version and aggregate info.

use super::sealed::Sealed;
use crate::error::Result;
use crate::wire::{Info, Version};
use async_trait::async_trait;

#[async_trait]
pub trait SystemOps: Sealed + Send + Sync {
    /// Check the daemon answers.
    async fn ping(&self) -> Result<()>;

    async fn version(&self) -> Result<Version>;

    /// Aggregate counters (images, containers) and driver details.
    async fn info(&self) -> Result<Info>;
}
