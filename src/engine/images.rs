// ABOUTME: ImageOps for EngineClient.
// ABOUTME: Pull and build consume line-framed progress; build extracts the new image id.

use super::EngineClient;
use super::traits::{BuildOptions, BuildOutput, ImageOps, RemoveImageOptions};
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::request;
use crate::stream::ProgressStream;
use crate::types::{ImageId, ImageRef};
use crate::wire::{
    CommitConfig, DecodeError, IdResponse, Image, ImageDetails, ProgressRecord, SearchItem,
};
use async_trait::async_trait;
use futures::StreamExt;

#[async_trait]
impl ImageOps for EngineClient {
    async fn list_images(&self, all: bool) -> Result<Vec<Image>> {
        self.read_json(request::list_images(all)).await
    }

    async fn inspect_image(&self, name: &str) -> Result<ImageDetails> {
        self.read_json(request::inspect_image(name)?).await
    }

    async fn remove_image(&self, name: &str, opts: &RemoveImageOptions) -> Result<()> {
        self.send_unit(request::remove_image(name, opts)?).await
    }

    async fn tag_image(&self, name: &str, target: &ImageRef, force: bool) -> Result<()> {
        self.send_unit(request::tag_image(name, target, force)?)
            .await
    }

    async fn pull_image_stream(&self, reference: &ImageRef) -> Result<ProgressStream> {
        let (context, response) = self.execute(request::pull_image(reference)).await?;
        Ok(ProgressStream::new(response.into_body(), context))
    }

    async fn pull_image(&self, reference: &ImageRef) -> Result<Vec<ProgressRecord>> {
        let stream = self.pull_image_stream(reference).await?;
        let records = drain(stream).await?;
        tracing::debug!(image = %reference, records = records.len(), "pull complete");
        Ok(records)
    }

    async fn build_image_stream(
        &self,
        context: BuildContext,
        opts: &BuildOptions,
    ) -> Result<ProgressStream> {
        let (context, response) = self
            .execute(request::build_image(context, opts)?)
            .await?;
        Ok(ProgressStream::new(response.into_body(), context))
    }

    async fn build_image(
        &self,
        context: BuildContext,
        opts: &BuildOptions,
    ) -> Result<BuildOutput> {
        let stream = self.build_image_stream(context, opts).await?;
        let error_context = stream.context().clone();
        let records = drain(stream).await?;

        let image_id = records
            .iter()
            .rev()
            .find_map(ProgressRecord::built_image_id)
            .or_else(|| opts.quiet.then(|| quiet_image_id(&records)).flatten())
            .map(ImageId::new)
            .ok_or_else(|| Error::Build {
                context: error_context,
                message: "build output ended without a \"Successfully built\" line".to_string(),
            })?;

        tracing::debug!(image = %image_id, "build complete");
        Ok(BuildOutput { image_id, records })
    }

    async fn commit_container(&self, config: &CommitConfig) -> Result<ImageId> {
        let request = request::commit_container(config)?;
        let context = request.context();
        let response: IdResponse = self.read_json(request).await?;

        if response.id.trim().is_empty() {
            return Err(Error::Decode {
                context,
                source: DecodeError {
                    field: "Id".to_string(),
                    expected: "non-empty string".to_string(),
                    message: "daemon returned an empty image id".to_string(),
                },
            });
        }
        Ok(ImageId::new(response.id))
    }

    async fn search_images(&self, term: &str) -> Result<Vec<SearchItem>> {
        self.read_json(request::search_images(term)?).await
    }
}

/// Consume a progress stream to its end.
///
/// Any error item fails the whole call, but only after the stream is done,
/// so the caller gets every record alongside the errors.
async fn drain(mut stream: ProgressStream) -> Result<Vec<ProgressRecord>> {
    let context = stream.context().clone();
    let mut records = Vec::new();
    let mut errors = Vec::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(error = %e, fatal = stream.has_failed(), "progress stream error");
                errors.push(e);
            }
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(Error::Incomplete {
            context,
            records,
            errors,
        })
    }
}

/// In quiet mode the daemon prints only the image id.
fn quiet_image_id(records: &[ProgressRecord]) -> Option<&str> {
    records
        .iter()
        .rev()
        .filter_map(|r| r.stream.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty() && !s.contains(char::is_whitespace))
}
