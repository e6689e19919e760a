//! slipway - repo-to-image build service
//!
//! Exposes an HTTP endpoint that takes a git repository URL, clones it
//! shallowly, infers the project type from file signatures, synthesizes a
//! Dockerfile from a fixed recipe catalog, builds an image through the Docker
//! Engine API, and reports the resulting image reference. Optionally pushes
//! the image to a configured registry.
//!
//! # Core Concepts
//!
//! - **Workspace**: the isolated, disposable directory holding one build's
//!   fetched source and generated Dockerfile. Always destroyed when the
//!   request finishes, success or failure.
//! - **Catalog**: the ordered list of project-type signatures and their
//!   Dockerfile recipes, with a static-content fallback so classification
//!   never fails.
//! - **Pipeline**: the validate → prepare → fetch → classify → materialize →
//!   build → publish sequence, the single place failures are typed and
//!   teardown is guaranteed.
//!
//! # Project Structure
//!
//! - [`server`]: axum routes and response mapping
//! - [`pipeline`]: build orchestration
//! - [`catalog`]: project classification and recipe materialization
//! - [`engine`]: Docker Engine adapter (build, push, probes)
//! - [`fetch`]: shallow git clone with failure classification
//! - [`workspace`]: per-build directory lifecycle
//! - [`config`]: environment-driven configuration
//! - [`error`]: the failure taxonomy

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod server;
pub mod workspace;

pub use catalog::{Catalog, ProjectRecipe};
pub use config::SlipwayConfig;
pub use engine::BuildEngine;
pub use error::BuildError;
pub use server::AppState;

/// Crate version, reported by `GET /`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
