// ABOUTME: Composable capability traits for the engine client.
// ABOUTME: Defines ContainerOps, ImageOps, LogOps and SystemOps plus their options.

mod container;
mod image;
mod logs;
pub(crate) mod sealed;
mod system;

pub use container::{ContainerOps, RemoveContainerOptions};
pub use image::{BuildOptions, BuildOutput, ImageOps, RemoveImageOptions};
pub use logs::{AttachOptions, LogOps, LogOptions};
pub use system::SystemOps;

/// Everything the engine client can do.
///
/// The capability traits are sealed; only this crate implements them.
///
/// ```compile_fail,E0277
/// use dockwire::engine::SystemOps;
/// use dockwire::wire::{Info, Version};
///
/// struct FakeEngine;
///
/// #[async_trait::async_trait]
/// impl SystemOps for FakeEngine {
///     async fn ping(&self) -> dockwire::Result<()> {
///         Ok(())
///     }
///
///     async fn version(&self) -> dockwire::Result<Version> {
///         Ok(Version::default())
///     }
///
///     async fn info(&self) -> dockwire::Result<Info> {
///         Ok(Info::default())
///     }
/// }
/// ```
pub trait FullEngine: ContainerOps + ImageOps + LogOps + SystemOps {}

impl<T> FullEngine for T where T: ContainerOps + ImageOps + LogOps + SystemOps {}
