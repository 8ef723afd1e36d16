// ABOUTME: Image operations trait for the engine client.
// ABOUTME: List, inspect, pull, build, tag, commit, search and remove images.

use super::sealed::Sealed;
use crate::context::BuildContext;
use crate::error::Result;
use crate::stream::ProgressStream;
use crate::types::{ImageId, ImageRef};
use crate::wire::{CommitConfig, Image, ImageDetails, ProgressRecord, SearchItem};
use async_trait::async_trait;

/// Image operations.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// List images. Intermediate layers are included only when `all` is set.
    async fn list_images(&self, all: bool) -> Result<Vec<Image>>;

    /// Get details of an image by name, tag or id.
    async fn inspect_image(&self, name: &str) -> Result<ImageDetails>;

    /// Remove an image. Images used by containers are refused unless forced.
    async fn remove_image(&self, name: &str, opts: &RemoveImageOptions) -> Result<()>;

    /// Add `target` as a new repository tag of `name`.
    async fn tag_image(&self, name: &str, target: &ImageRef, force: bool) -> Result<()>;

    /// Start pulling an image and return its progress as it arrives.
    async fn pull_image_stream(&self, reference: &ImageRef) -> Result<ProgressStream>;

    /// Pull an image, consuming the progress stream to completion.
    ///
    /// If the stream reported any error, fails with [`Error::Incomplete`]
    /// carrying the records received and every error seen.
    ///
    /// [`Error::Incomplete`]: crate::error::Error::Incomplete
    async fn pull_image(&self, reference: &ImageRef) -> Result<Vec<ProgressRecord>>;

    /// Start a build and return its output as it arrives.
    async fn build_image_stream(
        &self,
        context: BuildContext,
        opts: &BuildOptions,
    ) -> Result<ProgressStream>;

    /// Build an image and return the id announced at the end of the output.
    async fn build_image(&self, context: BuildContext, opts: &BuildOptions)
    -> Result<BuildOutput>;

    /// Commit a container's filesystem as a new image.
    async fn commit_container(&self, config: &CommitConfig) -> Result<ImageId>;

    /// Search the registry.
    async fn search_images(&self, term: &str) -> Result<Vec<SearchItem>>;
}

/// Options for removing an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveImageOptions {
    pub force: bool,
    /// Keep untagged parent images.
    pub no_prune: bool,
}

/// Options for building an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Repository and optional tag for the result.
    pub tag: Option<String>,
    /// Suppress step output; the stream then carries only the image id.
    pub quiet: bool,
    pub no_cache: bool,
    /// Remove intermediate containers after a successful build.
    pub remove_intermediate: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            tag: None,
            quiet: false,
            no_cache: false,
            remove_intermediate: true,
        }
    }
}

impl BuildOptions {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }
}

/// Result of a completed build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub image_id: ImageId,
    pub records: Vec<ProgressRecord>,
}
