//! Build pipeline error taxonomy
//!
//! Every failure a build can hit maps to exactly one variant here, and the
//! HTTP layer derives both the status code and the caller-visible message
//! from the variant alone. Nothing below the orchestration layer decides
//! response shape.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by the build pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Request body malformed, or the repository URL is missing/not absolute
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The fetch tool reported the repository as absent (or private without credentials)
    #[error("Repository not found or private: {url}")]
    RepositoryNotFound { url: String },

    /// The fetch tool required credentials that were not supplied
    #[error("Authentication required for {url}")]
    AuthenticationRequired { url: String },

    /// Fetch failed for a reason other than not-found/auth; carries the tool's stderr
    #[error("Failed to fetch repository: {detail}")]
    FetchFailed { detail: String },

    /// Workspace could not be prepared after the retry budget was exhausted
    #[error("Workspace setup failed: {0}")]
    WorkspaceFailure(String),

    /// Writing the synthesized Dockerfile into the workspace failed
    #[error("Failed to write build recipe: {0}")]
    MaterializeFailure(#[source] std::io::Error),

    /// The container engine rejected or aborted the build
    #[error("Image build failed: {0}")]
    BuildFailure(String),

    /// Pushing the built image to the registry failed
    #[error("Image push failed: {0}")]
    PublishFailure(String),

    /// Anything the taxonomy did not anticipate; detail is logged, not returned
    #[error("internal error")]
    Unexpected(#[from] anyhow::Error),
}

impl BuildError {
    /// HTTP status for this failure. Client errors mean the caller must change
    /// the request (different URL, credentials); server errors are
    /// operator-actionable.
    pub fn status(&self) -> StatusCode {
        match self {
            BuildError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BuildError::RepositoryNotFound { .. } => StatusCode::NOT_FOUND,
            BuildError::AuthenticationRequired { .. } => StatusCode::UNAUTHORIZED,
            BuildError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            BuildError::WorkspaceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuildError::MaterializeFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuildError::BuildFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuildError::PublishFailure(_) => StatusCode::BAD_GATEWAY,
            BuildError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller. `Unexpected` deliberately hides
    /// its cause; the full chain goes to the logs instead.
    pub fn public_message(&self) -> String {
        match self {
            BuildError::Unexpected(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
