//! End-to-end pipeline tests against local git repositories.
//!
//! Repositories are addressed as `file://localhost/...` URLs: git clones them
//! from disk, and the host component means they pass request validation, so
//! the full pipeline runs without any network. The image-building test talks
//! to the local Docker daemon and skips itself when none is reachable.

use std::path::Path;

use slipway::engine::LOG_TAIL;
use slipway::workspace::Workspace;
use slipway::{catalog, fetch, pipeline, BuildEngine, Catalog, SlipwayConfig};
use url::Url;

fn git(dir: &Path, args: &[&str]) {
    let out = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
}

fn init_repo(dir: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q", "--initial-branch=main"]);
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
    git(dir, &["add", "."]);
    git(
        dir,
        &["-c", "user.email=ci@local", "-c", "user.name=ci", "commit", "-qm", "init"],
    );
}

fn repo_url(dir: &Path) -> String {
    format!("file://localhost{}", dir.display())
}

#[tokio::test]
async fn static_site_builds_end_to_end() {
    let engine = BuildEngine::connect().unwrap();
    if !engine.is_available().await {
        eprintln!("skipping: no container engine reachable");
        return;
    }

    let repos = tempfile::tempdir().unwrap();
    let repo = repos.path().join("my-static-site");
    init_repo(
        &repo,
        &[("index.html", "<html><body>hello</body></html>")],
    );

    let root = tempfile::tempdir().unwrap();
    let mut config = SlipwayConfig::default();
    config.workspace_root = root.path().to_path_buf();
    config.push = false;
    let catalog = Catalog::builtin();

    let report = pipeline::run(&engine, &catalog, &config, &repo_url(&repo))
        .await
        .unwrap();

    assert_eq!(report.project_type, "static");
    assert_eq!(report.port, 80);
    assert!(report.image.contains("my-static-site"));
    assert!(report.logs.len() <= LOG_TAIL);
    assert!(report.run_command.contains("-p 80:80"));
    assert!(report.run_command.contains(&report.image));
    assert_eq!(
        std::fs::read_dir(root.path()).unwrap().count(),
        0,
        "workspace must not outlive the request"
    );
}

#[tokio::test]
async fn nextjs_repo_classifies_through_fetch() {
    let repos = tempfile::tempdir().unwrap();
    let repo = repos.path().join("app");
    init_repo(
        &repo,
        &[
            ("next.config.js", "module.exports = {};"),
            ("package.json", r#"{"name": "app"}"#),
        ],
    );

    let root = tempfile::tempdir().unwrap();
    let ws = Workspace::prepare(root.path(), "app", "e2e").await.unwrap();

    let url = Url::parse(&repo_url(&repo)).unwrap();
    fetch::fetch(&url, ws.path()).await.unwrap();

    let catalog = Catalog::builtin();
    let recipe = catalog.classify(ws.path());
    assert_eq!(recipe.label, "nextjs");
    assert_eq!(recipe.port, 3000);

    catalog::materialize(recipe, ws.path()).await.unwrap();
    let written = std::fs::read_to_string(ws.path().join("Dockerfile")).unwrap();
    assert_eq!(written, recipe.dockerfile);

    ws.destroy().await;
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
