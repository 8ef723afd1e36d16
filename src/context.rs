// ABOUTME: Build contexts: the tar archive submitted to the build operation.
// ABOUTME: Wraps in-memory bytes, a caller-provided byte stream, or a packed directory.

use crate::transport::{BoxError, OutgoingBody, full_body};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use std::fmt;
use std::path::{Path, PathBuf};

/// Control file the daemon reads from the archive root.
pub const DOCKERFILE: &str = "Dockerfile";

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("no Dockerfile in build context {}", .0.display())]
    MissingDockerfile(PathBuf),

    #[error("failed to pack build context {}: {source}", path.display())]
    Pack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("packing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A tar archive streamed to the daemon as the build request body.
pub struct BuildContext {
    body: OutgoingBody,
}

impl BuildContext {
    pub fn from_bytes(archive: impl Into<Bytes>) -> Self {
        Self {
            body: full_body(archive),
        }
    }

    /// Stream an archive without holding it in memory.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let frames = stream.map_ok(Frame::data).map_err(Into::into);
        Self {
            body: StreamBody::new(frames).boxed_unsync(),
        }
    }

    /// Pack `dir` into an archive with paths relative to `dir`.
    ///
    /// `dir` must contain a `Dockerfile`.
    pub async fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ContextError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.join(DOCKERFILE).is_file() {
            return Err(ContextError::MissingDockerfile(dir));
        }

        let archive = tokio::task::spawn_blocking(move || pack_dir(&dir)).await??;
        Ok(Self::from_bytes(archive))
    }

    pub(crate) fn into_body(self) -> OutgoingBody {
        self.body
    }
}

fn pack_dir(dir: &Path) -> Result<Vec<u8>, ContextError> {
    let pack_err = |source: std::io::Error| ContextError::Pack {
        path: dir.to_path_buf(),
        source,
    };

    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(false);
    builder.append_dir_all("", dir).map_err(pack_err)?;
    builder.into_inner().map_err(pack_err)
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_dir_requires_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildContext::from_dir(dir.path()).await.unwrap_err();
        assert!(matches!(err, ContextError::MissingDockerfile(_)));
    }

    #[tokio::test]
    async fn from_dir_packs_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DOCKERFILE), "FROM busybox\n").unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/run.sh"), "true\n").unwrap();

        let context = BuildContext::from_dir(dir.path()).await.unwrap();
        let bytes = context.into_body().collect().await.unwrap().to_bytes();

        let mut archive = tar::Archive::new(bytes.as_ref());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();

        assert!(names.iter().any(|n| n.trim_start_matches("./") == DOCKERFILE));
        assert!(names.iter().any(|n| n.trim_start_matches("./") == "app/run.sh"));
    }
}
