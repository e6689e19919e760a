//! Docker Engine adapter
//!
//! Wraps a `bollard::Docker` handle injected at startup. Builds stream the
//! workspace to the daemon as a gzipped tar and drain the progress stream,
//! keeping only the informational lines in a bounded tail so the response
//! stays small no matter how chatty the build is. Push is a separate,
//! optional operation against the configured registry.

use std::collections::VecDeque;
use std::path::Path;

use bollard::auth::DockerCredentials;
use bollard::image::{BuildImageOptions, PushImageOptions};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, info, trace};

use crate::error::BuildError;

/// Most recent build-log lines retained in the response.
pub const LOG_TAIL: usize = 20;

/// Output of a successful image build.
#[derive(Debug)]
pub struct BuildOutput {
    /// Fully-qualified image reference the build was tagged with
    pub image: String,
    /// Bounded tail of informational build-log lines, oldest first
    pub logs: Vec<String>,
}

/// Bounded ring of log lines: pushing beyond [`LOG_TAIL`] drops the oldest.
#[derive(Debug, Default)]
pub struct LogTail {
    lines: VecDeque<String>,
}

impl LogTail {
    pub fn push(&mut self, line: &str) {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            return;
        }
        if self.lines.len() == LOG_TAIL {
            self.lines.pop_front();
        }
        self.lines.push_back(trimmed.to_string());
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Handle to the container engine, shared across requests. bollard's client
/// is safe for concurrent use, so no additional synchronization is needed.
#[derive(Clone)]
pub struct BuildEngine {
    docker: Docker,
}

impl BuildEngine {
    /// Wraps an explicitly constructed Docker handle.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connects via the local daemon socket.
    pub fn connect() -> Result<Self, bollard::errors::Error> {
        Ok(Self::new(Docker::connect_with_local_defaults()?))
    }

    /// True when the daemon answers a ping.
    pub async fn is_available(&self) -> bool {
        self.docker.ping().await.is_ok()
    }

    /// Daemon version string, when reachable.
    pub async fn version(&self) -> Option<String> {
        self.docker
            .version()
            .await
            .ok()
            .and_then(|v| v.version)
    }

    /// Builds an image from the workspace contents using the Dockerfile at
    /// its root, tagged `image_tag`. Returns the tag and the retained log
    /// tail. An error item in the progress stream aborts the build with the
    /// engine's own diagnostic.
    pub async fn build(&self, context_dir: &Path, image_tag: &str) -> Result<BuildOutput, BuildError> {
        info!(image = image_tag, context = %context_dir.display(), "Building image");

        let context = pack_context(context_dir).await?;
        debug!(bytes = context.len(), "Build context packed");

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: image_tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut tail = LogTail::default();
        let mut stream =
            self.docker
                .build_image(options, None, Some(context.into()));

        while let Some(item) = stream.next().await {
            let progress = item.map_err(|e| BuildError::BuildFailure(e.to_string()))?;

            if let Some(line) = progress.stream.as_deref() {
                trace!(line = line.trim_end(), "build output");
                tail.push(line);
            }

            if let Some(message) = progress.error {
                let detail = progress
                    .error_detail
                    .and_then(|d| d.message)
                    .unwrap_or(message);
                return Err(BuildError::BuildFailure(detail));
            }
        }

        info!(image = image_tag, "Image built");
        Ok(BuildOutput {
            image: image_tag.to_string(),
            logs: tail.into_lines(),
        })
    }

    /// Pushes a built image to the configured registry. Independent of
    /// `build`; callers decide whether the workflow includes it.
    pub async fn push(
        &self,
        image: &str,
        username: &str,
        password: &str,
    ) -> Result<(), BuildError> {
        let (name, tag) = image.rsplit_once(':').unwrap_or((image, "latest"));
        info!(image = name, tag, "Pushing image");

        let credentials = DockerCredentials {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        };

        let mut stream = self.docker.push_image(
            name,
            Some(PushImageOptions { tag }),
            Some(credentials),
        );

        while let Some(item) = stream.next().await {
            let progress = item.map_err(|e| BuildError::PublishFailure(e.to_string()))?;
            if let Some(message) = progress.error {
                return Err(BuildError::PublishFailure(message));
            }
        }

        info!(image = name, tag, "Image pushed");
        Ok(())
    }
}

/// Tars and gzips the workspace into an in-memory build context. The clone's
/// `.git` directory is left out so repository history never reaches the
/// daemon or the image.
async fn pack_context(dir: &Path) -> Result<Vec<u8>, BuildError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_name() == ".git" {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                builder.append_dir_all(entry.file_name(), &path)?;
            } else {
                builder.append_path_with_name(&path, entry.file_name())?;
            }
        }
        let encoder = builder.into_inner()?;
        encoder.finish()
    })
    .await
    .map_err(|e| BuildError::Unexpected(anyhow::anyhow!("context packing task failed: {}", e)))?
    .map_err(|e| BuildError::BuildFailure(format!("failed to pack build context: {}", e)))
}
