//! Shallow repository fetch via the git CLI
//!
//! One revision of the default branch, no history. Failures are classified
//! from git's stderr into the caller-facing taxonomy: absent/private
//! repositories and missing credentials are the caller's problem, anything
//! else surfaces the tool's diagnostic verbatim. There is no retry here;
//! a URL that 404s or needs credentials will keep doing so.

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::error::BuildError;

/// Clones `url` at depth 1 into `dest`, which must already exist.
pub async fn fetch(url: &Url, dest: &Path) -> Result<(), BuildError> {
    info!(repo = %url, dest = %dest.display(), "Fetching repository");

    let output = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg("--single-branch")
        .arg(url.as_str())
        .arg(dest)
        // Never hang on an interactive credential prompt; fail so stderr
        // carries the authentication diagnostic instead.
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await
        .map_err(|e| BuildError::FetchFailed {
            detail: format!("failed to spawn git: {}", e),
        })?;

    if output.status.success() {
        debug!(repo = %url, "Fetch completed");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(classify_fetch_failure(url.as_str(), &stderr))
}

/// Maps git's stderr to a typed failure. Pure, so the mapping is testable
/// without a network.
pub fn classify_fetch_failure(url: &str, stderr: &str) -> BuildError {
    let lowered = stderr.to_lowercase();

    if lowered.contains("not found") || lowered.contains("does not exist") {
        return BuildError::RepositoryNotFound {
            url: url.to_string(),
        };
    }

    if lowered.contains("authentication")
        || lowered.contains("could not read username")
        || lowered.contains("could not read password")
        || lowered.contains("terminal prompts disabled")
        || lowered.contains("permission denied")
    {
        return BuildError::AuthenticationRequired {
            url: url.to_string(),
        };
    }

    BuildError::FetchFailed {
        detail: stderr.trim().to_string(),
    }
}
