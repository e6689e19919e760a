//! End-to-end build orchestration
//!
//! The one place that sequences validate → prepare → fetch → classify →
//! materialize → build → (publish) and owns the guaranteed-teardown contract:
//! once a workspace exists it is destroyed on every exit path. Nothing below
//! this layer decides response shape; it returns either a [`BuildReport`] or
//! a typed [`BuildError`] for the HTTP layer to map.

use tracing::{info, instrument};
use url::Url;
use uuid::Uuid;

use crate::catalog::{self, Catalog};
use crate::config::SlipwayConfig;
use crate::engine::BuildEngine;
use crate::error::BuildError;
use crate::fetch;
use crate::workspace::{sanitize_repo_name, Workspace};

/// Everything a successful build reports back to the caller.
#[derive(Debug)]
pub struct BuildReport {
    pub image: String,
    pub project_type: &'static str,
    pub port: u16,
    pub logs: Vec<String>,
    pub run_command: String,
}

/// Validates the repository URL: absolute, with both a scheme and a host.
/// Runs before any side effect.
pub fn validate_repo_url(repo_url: &str) -> Result<Url, BuildError> {
    if repo_url.trim().is_empty() {
        return Err(BuildError::InvalidRequest("repo_url is empty".to_string()));
    }

    let url = Url::parse(repo_url)
        .map_err(|e| BuildError::InvalidRequest(format!("repo_url is not a valid URL: {}", e)))?;

    if url.host_str().is_none() {
        return Err(BuildError::InvalidRequest(
            "repo_url must be an absolute URL with a host".to_string(),
        ));
    }

    Ok(url)
}

/// Runs one build end to end.
#[instrument(skip_all, fields(repo = repo_url))]
pub async fn run(
    engine: &BuildEngine,
    catalog: &Catalog,
    config: &SlipwayConfig,
    repo_url: &str,
) -> Result<BuildReport, BuildError> {
    let url = validate_repo_url(repo_url)?;
    let repo_name = sanitize_repo_name(url.path());
    let request_token = Uuid::new_v4().simple().to_string()[..8].to_string();

    let workspace =
        Workspace::prepare(&config.workspace_root, &repo_name, &request_token).await?;

    // Teardown must run whether the build succeeded or not.
    let result = execute(engine, catalog, config, &url, &repo_name, &workspace).await;
    workspace.destroy().await;
    result
}

async fn execute(
    engine: &BuildEngine,
    catalog: &Catalog,
    config: &SlipwayConfig,
    url: &Url,
    repo_name: &str,
    workspace: &Workspace,
) -> Result<BuildReport, BuildError> {
    // Cheap probe up front: a dead engine fails the request before the
    // expensive fetch, not twenty layers into a build.
    if !engine.is_available().await {
        return Err(BuildError::BuildFailure(
            "container engine unavailable".to_string(),
        ));
    }

    fetch::fetch(url, workspace.path()).await?;

    let recipe = catalog.classify(workspace.path());
    info!(project_type = recipe.label, "Selected recipe");

    catalog::materialize(recipe, workspace.path()).await?;

    let image_tag = config.image_reference(repo_name);
    let output = engine.build(workspace.path(), &image_tag).await?;

    if config.push {
        let username = config
            .registry_username
            .as_deref()
            .ok_or_else(|| BuildError::PublishFailure("registry username not configured".into()))?;
        let password = config
            .registry_password
            .as_deref()
            .ok_or_else(|| BuildError::PublishFailure("registry password not configured".into()))?;
        engine.push(&output.image, username, password).await?;
    }

    Ok(BuildReport {
        run_command: format!("docker run -p {}:{} {}", recipe.port, recipe.port, output.image),
        image: output.image,
        project_type: recipe.label,
        port: recipe.port,
        logs: output.logs,
    })
}
