//! Per-build workspace lifecycle
//!
//! Each build gets its own disposable directory under the configured
//! workspace root, keyed by the sanitized repository name plus a per-request
//! token so concurrent builds of the same repository never collide. The
//! directory is created fresh (stale contents removed) and must be destroyed
//! on every exit path of a build.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::BuildError;

/// Attempts before workspace preparation is declared fatal.
const MAX_PREPARE_ATTEMPTS: u32 = 3;

/// Fixed backoff between preparation attempts.
const PREPARE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// An exclusively-owned build directory.
///
/// Normal teardown goes through [`Workspace::destroy`]; the `Drop` impl is a
/// last-resort guard so the directory is removed even when a panic unwinds
/// past the pipeline's explicit cleanup.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    destroyed: bool,
}

impl Workspace {
    /// Creates a clean directory for one build.
    ///
    /// Any stale tree at the derived path is removed first. Removal and
    /// recreation are retried up to [`MAX_PREPARE_ATTEMPTS`] times with a
    /// short fixed backoff; only then does preparation fail.
    pub async fn prepare(
        root: &Path,
        repo_name: &str,
        request_token: &str,
    ) -> Result<Self, BuildError> {
        let path = root.join(format!("{}-{}", repo_name, request_token));

        let mut last_error = None;
        for attempt in 1..=MAX_PREPARE_ATTEMPTS {
            match Self::recreate(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), attempt, "Workspace prepared");
                    return Ok(Self {
                        path,
                        destroyed: false,
                    });
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "Workspace preparation attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < MAX_PREPARE_ATTEMPTS {
                        tokio::time::sleep(PREPARE_RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(BuildError::WorkspaceFailure(format!(
            "could not prepare {} after {} attempts: {}",
            path.display(),
            MAX_PREPARE_ATTEMPTS,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn recreate(path: &Path) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(path).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort removal. Errors are logged and suppressed; callers must
    /// invoke this on every exit path, success or failure.
    pub async fn destroy(mut self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Workspace cleanup failed");
            }
        } else {
            debug!(path = %self.path.display(), "Workspace destroyed");
        }
        self.destroyed = true;
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        // Reached only when `destroy` was skipped, i.e. an unwind.
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Workspace cleanup failed");
            }
        }
    }
}

/// Derives a filesystem-safe identifier from the path component of a
/// repository URL: lower-cased, `.git` suffix stripped, everything outside
/// `[a-z0-9-]` mapped to `-`, leading/trailing dashes trimmed.
pub fn sanitize_repo_name(url_path: &str) -> String {
    let last = url_path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(url_path);
    let trimmed = last.strip_suffix(".git").unwrap_or(last);

    let mapped: String = trimmed
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = mapped.trim_matches('-').to_string();
    if cleaned.is_empty() {
        "repository".to_string()
    } else {
        cleaned
    }
}
