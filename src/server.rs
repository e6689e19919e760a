//! HTTP surface: routing, request/response models, error mapping
//!
//! Three routes: `GET /` (service status), `GET /health` (liveness), and
//! `POST /build` (the pipeline). This module is the only place that turns a
//! [`BuildError`] into a response, and the build future runs under
//! `tokio::spawn` so even a panicking build comes back as a generic 500
//! instead of taking the worker down.

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::SlipwayConfig;
use crate::engine::BuildEngine;
use crate::error::BuildError;
use crate::pipeline;

/// Shared handles for request handlers. Cheap to clone; the engine client is
/// safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BuildEngine>,
    pub catalog: Arc<Catalog>,
    pub config: Arc<SlipwayConfig>,
}

#[derive(Debug, Deserialize)]
pub struct BuildRequest {
    pub repo_url: String,
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub status: String,
    pub image: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub port: u16,
    pub logs: Vec<String>,
    pub run_command: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub version: String,
    pub engine: String,
    pub supported_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub free_disk_bytes: u64,
    pub timestamp: DateTime<Utc>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_status))
        .route("/health", get(health))
        .route("/build", post(build))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.listen_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn error_response(err: &BuildError) -> Response {
    (
        err.status(),
        Json(ErrorBody {
            error: err.public_message(),
        }),
    )
        .into_response()
}

async fn service_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let engine = if state.engine.is_available().await {
        "connected"
    } else {
        "unreachable"
    };

    Json(ServiceStatus {
        service: "slipway".to_string(),
        version: crate::VERSION.to_string(),
        engine: engine.to_string(),
        supported_types: state.catalog.labels().iter().map(|s| s.to_string()).collect(),
    })
}

/// Liveness probe. Engine trouble degrades the payload rather than failing
/// the request.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_version = state.engine.version().await;
    let status = if engine_version.is_some() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        engine: engine_version.unwrap_or_else(|| "unreachable".to_string()),
        free_disk_bytes: free_disk_bytes(),
        timestamp: Utc::now(),
    })
}

/// Available space on the root filesystem (first disk when no root mount is
/// reported, as on some containers).
fn free_disk_bytes() -> u64 {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first())
        .map(|d| d.available_space())
        .unwrap_or(0)
}

async fn build(
    State(state): State<AppState>,
    payload: Result<Json<BuildRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(&BuildError::InvalidRequest(rejection.body_text()));
        }
    };

    let task_state = state.clone();
    let repo_url = request.repo_url.clone();
    let outcome = tokio::spawn(async move {
        pipeline::run(
            &task_state.engine,
            &task_state.catalog,
            &task_state.config,
            &repo_url,
        )
        .await
    })
    .await;

    match outcome {
        Ok(Ok(report)) => {
            info!(image = %report.image, project_type = report.project_type, "Build succeeded");
            Json(BuildResponse {
                status: "success".to_string(),
                image: report.image,
                project_type: report.project_type.to_string(),
                port: report.port,
                logs: report.logs,
                run_command: report.run_command,
            })
            .into_response()
        }
        Ok(Err(err)) => {
            if err.is_client_error() {
                warn!(repo = %request.repo_url, error = %err, "Build rejected");
            } else {
                error!(repo = %request.repo_url, error = ?err, "Build failed");
            }
            error_response(&err)
        }
        // The build task panicked. Full detail stays in the logs; the caller
        // gets a generic 500.
        Err(join_error) => {
            error!(repo = %request.repo_url, error = %join_error, "Build task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
