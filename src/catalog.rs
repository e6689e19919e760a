//! Project-type catalog: signatures, Dockerfile templates, classification
//!
//! The catalog is an ordered list of recipes plus an explicit static-content
//! fallback, so classification always terminates with a recipe: order is the
//! disambiguation policy (a Next.js tree also has `package.json`, so the
//! Next.js entry must be checked before the generic Node one). Matching is a
//! pure read-only check that every marker file exists under the tree root.

use std::path::Path;
use tracing::debug;

use crate::error::BuildError;

/// One catalog entry: a type label, the marker files whose simultaneous
/// presence selects it, the Dockerfile synthesized for it, and the port the
/// resulting container listens on.
#[derive(Debug, Clone)]
pub struct ProjectRecipe {
    pub label: &'static str,
    pub markers: &'static [&'static str],
    pub dockerfile: &'static str,
    pub port: u16,
}

/// Ordered recipe entries with a structurally-guaranteed fallback.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ProjectRecipe>,
    fallback: ProjectRecipe,
}

const NEXTJS_DOCKERFILE: &str = r#"FROM node:20-alpine
WORKDIR /app
COPY package*.json ./
RUN npm install
COPY . .
RUN npm run build
EXPOSE 3000
CMD ["npm", "start"]
"#;

const NODE_DOCKERFILE: &str = r#"FROM node:20-alpine
WORKDIR /app
COPY package*.json ./
RUN npm install --omit=dev
COPY . .
EXPOSE 3000
CMD ["npm", "start"]
"#;

const FLASK_DOCKERFILE: &str = r#"FROM python:3.12-slim
WORKDIR /app
COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt
COPY . .
EXPOSE 5000
CMD ["python", "app.py"]
"#;

const PYTHON_DOCKERFILE: &str = r#"FROM python:3.12-slim
WORKDIR /app
COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt
COPY . .
EXPOSE 8000
CMD ["python", "main.py"]
"#;

const GOLANG_DOCKERFILE: &str = r#"FROM golang:1.22-alpine AS build
WORKDIR /src
COPY go.* ./
RUN go mod download
COPY . .
RUN go build -o /out/app .

FROM alpine:3.20
COPY --from=build /out/app /usr/local/bin/app
EXPOSE 8080
CMD ["app"]
"#;

const STATIC_DOCKERFILE: &str = r#"FROM nginx:alpine
COPY . /usr/share/nginx/html
EXPOSE 80
CMD ["nginx", "-g", "daemon off;"]
"#;

impl Catalog {
    /// The built-in catalog, most specific signatures first.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ProjectRecipe {
                    label: "nextjs",
                    markers: &["next.config.js", "package.json"],
                    dockerfile: NEXTJS_DOCKERFILE,
                    port: 3000,
                },
                ProjectRecipe {
                    label: "node",
                    markers: &["package.json"],
                    dockerfile: NODE_DOCKERFILE,
                    port: 3000,
                },
                ProjectRecipe {
                    label: "flask",
                    markers: &["app.py", "requirements.txt"],
                    dockerfile: FLASK_DOCKERFILE,
                    port: 5000,
                },
                ProjectRecipe {
                    label: "python",
                    markers: &["requirements.txt"],
                    dockerfile: PYTHON_DOCKERFILE,
                    port: 8000,
                },
                ProjectRecipe {
                    label: "golang",
                    markers: &["go.mod"],
                    dockerfile: GOLANG_DOCKERFILE,
                    port: 8080,
                },
            ],
            fallback: ProjectRecipe {
                label: "static",
                markers: &[],
                dockerfile: STATIC_DOCKERFILE,
                port: 80,
            },
        }
    }

    /// Selects the first entry whose every marker exists under `tree`.
    /// Never fails: trees matching nothing get the static fallback.
    pub fn classify(&self, tree: &Path) -> &ProjectRecipe {
        for recipe in &self.entries {
            if recipe.markers.iter().all(|m| tree.join(m).is_file()) {
                debug!(project_type = recipe.label, "Classified project");
                return recipe;
            }
        }
        debug!(project_type = self.fallback.label, "No signature matched, using fallback");
        &self.fallback
    }

    /// Ordered type labels, fallback last. Reported by `GET /`.
    pub fn labels(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .map(|r| r.label)
            .chain(std::iter::once(self.fallback.label))
            .collect()
    }
}

/// Writes the recipe's Dockerfile verbatim into the workspace, overwriting
/// anything the source tree itself shipped at that path.
pub async fn materialize(recipe: &ProjectRecipe, workspace: &Path) -> Result<(), BuildError> {
    tokio::fs::write(workspace.join("Dockerfile"), recipe.dockerfile)
        .await
        .map_err(BuildError::MaterializeFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), "x").unwrap();
        }
        dir
    }

    #[test]
    fn test_nextjs_wins_over_node() {
        let tree = tree_with(&["next.config.js", "package.json"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());
        assert_eq!(recipe.label, "nextjs");
        assert_eq!(recipe.port, 3000);
    }

    #[test]
    fn test_plain_node() {
        let tree = tree_with(&["package.json"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());
        assert_eq!(recipe.label, "node");
    }

    #[test]
    fn test_flask_wins_over_python() {
        let tree = tree_with(&["app.py", "requirements.txt"]);
        assert_eq!(Catalog::builtin().classify(tree.path()).label, "flask");

        let tree = tree_with(&["requirements.txt"]);
        assert_eq!(Catalog::builtin().classify(tree.path()).label, "python");
    }

    #[test]
    fn test_golang() {
        let tree = tree_with(&["go.mod", "main.go"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());
        assert_eq!(recipe.label, "golang");
        assert_eq!(recipe.port, 8080);
    }

    #[test]
    fn test_static_fallback() {
        let tree = tree_with(&["index.html"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());
        assert_eq!(recipe.label, "static");
        assert_eq!(recipe.port, 80);
    }

    #[test]
    fn test_empty_tree_still_classifies() {
        let tree = tempfile::tempdir().unwrap();
        assert_eq!(Catalog::builtin().classify(tree.path()).label, "static");
    }

    #[test]
    fn test_marker_must_be_a_file() {
        // A directory named package.json must not match the node signature
        let tree = tempfile::tempdir().unwrap();
        fs::create_dir(tree.path().join("package.json")).unwrap();
        assert_eq!(Catalog::builtin().classify(tree.path()).label, "static");
    }

    #[test]
    fn test_labels_end_with_fallback() {
        let labels = Catalog::builtin().labels();
        assert_eq!(labels.first(), Some(&"nextjs"));
        assert_eq!(labels.last(), Some(&"static"));
    }

    #[tokio::test]
    async fn test_materialize_writes_template_verbatim() {
        let tree = tree_with(&["index.html"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());

        materialize(recipe, tree.path()).await.unwrap();

        let written = fs::read_to_string(tree.path().join("Dockerfile")).unwrap();
        assert_eq!(written, STATIC_DOCKERFILE);
    }

    #[tokio::test]
    async fn test_materialize_overwrites_existing_dockerfile() {
        let tree = tree_with(&["package.json", "Dockerfile"]);
        let catalog = Catalog::builtin();
        let recipe = catalog.classify(tree.path());

        materialize(recipe, tree.path()).await.unwrap();

        let written = fs::read_to_string(tree.path().join("Dockerfile")).unwrap();
        assert_eq!(written, NODE_DOCKERFILE);
    }
}
