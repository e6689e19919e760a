//! Configuration loaded from environment variables
//!
//! All settings come from `SLIPWAY_*` environment variables with sensible
//! defaults, so the service runs out of the box against a local Docker
//! socket. Registry credentials are only required when pushing is enabled.
//!
//! # Environment Variables
//!
//! - `SLIPWAY_REGISTRY_NAMESPACE`: image name prefix (registry user/org) - default: "local"
//! - `SLIPWAY_REGISTRY_USERNAME`: registry login for push - optional
//! - `SLIPWAY_REGISTRY_PASSWORD`: registry password/token for push - optional
//! - `SLIPWAY_PUSH`: push built images to the registry (true|false) - default: "false"
//! - `SLIPWAY_WORKSPACE_ROOT`: parent directory for per-build workspaces - default: temp dir + "slipway-builds"
//! - `SLIPWAY_LISTEN_ADDR`: socket address to bind - default: "0.0.0.0:5000"
//! - `SLIPWAY_LOG_LEVEL`: logging level - default: "info"
//! - `SLIPWAY_LOG_JSON`: JSON log output (true|false) - default: "false"

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_REGISTRY_NAMESPACE: &str = "local";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Process-wide configuration for the build service.
///
/// Constructed with `Default::default()`, which reads the environment and
/// falls back to defaults for anything unset.
#[derive(Debug, Clone)]
pub struct SlipwayConfig {
    /// Registry namespace prefixed onto every image name
    pub registry_namespace: String,

    /// Registry login, used only when `push` is enabled
    pub registry_username: Option<String>,

    /// Registry password or token, used only when `push` is enabled
    pub registry_password: Option<String>,

    /// Push built images to the configured registry
    pub push: bool,

    /// Parent directory under which per-build workspaces are created
    pub workspace_root: PathBuf,

    /// Socket address the HTTP server binds to
    pub listen_addr: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON-formatted logs
    pub log_json: bool,
}

impl Default for SlipwayConfig {
    fn default() -> Self {
        let registry_namespace = env::var("SLIPWAY_REGISTRY_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_REGISTRY_NAMESPACE.to_string());

        let registry_username = env::var("SLIPWAY_REGISTRY_USERNAME").ok();
        let registry_password = env::var("SLIPWAY_REGISTRY_PASSWORD").ok();

        let push = env::var("SLIPWAY_PUSH")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let workspace_root = env::var("SLIPWAY_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("slipway-builds"));

        let listen_addr =
            env::var("SLIPWAY_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        let log_level = env::var("SLIPWAY_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("SLIPWAY_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            registry_namespace,
            registry_username,
            registry_password,
            push,
            workspace_root,
            listen_addr,
            log_level,
            log_json,
        }
    }
}

impl SlipwayConfig {
    /// Validates the configuration.
    ///
    /// Pushing requires credentials; the namespace must be non-empty because
    /// it becomes part of every image reference.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_namespace.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Registry namespace must not be empty".to_string(),
            ));
        }

        if self.push && (self.registry_username.is_none() || self.registry_password.is_none()) {
            return Err(ConfigError::ValidationFailed(
                "SLIPWAY_PUSH is enabled but SLIPWAY_REGISTRY_USERNAME / SLIPWAY_REGISTRY_PASSWORD are not set"
                    .to_string(),
            ));
        }

        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid listen address: {}",
                self.listen_addr
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Fully-qualified image reference for a repository name.
    pub fn image_reference(&self, repo_name: &str) -> String {
        format!("{}/{}:latest", self.registry_namespace, repo_name)
    }
}

impl fmt::Display for SlipwayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Slipway Configuration:")?;
        writeln!(f, "  Registry Namespace: {}", self.registry_namespace)?;
        writeln!(f, "  Push Enabled: {}", self.push)?;
        writeln!(f, "  Workspace Root: {}", self.workspace_root.display())?;
        writeln!(f, "  Listen Addr: {}", self.listen_addr)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("SLIPWAY_REGISTRY_NAMESPACE"),
            EnvGuard::unset("SLIPWAY_PUSH"),
            EnvGuard::unset("SLIPWAY_LISTEN_ADDR"),
            EnvGuard::unset("SLIPWAY_LOG_LEVEL"),
        ];

        let config = SlipwayConfig::default();

        assert_eq!(config.registry_namespace, DEFAULT_REGISTRY_NAMESPACE);
        assert!(!config.push);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("SLIPWAY_REGISTRY_NAMESPACE", "acme"),
            EnvGuard::set("SLIPWAY_PUSH", "true"),
            EnvGuard::set("SLIPWAY_REGISTRY_USERNAME", "acme-bot"),
            EnvGuard::set("SLIPWAY_REGISTRY_PASSWORD", "hunter2"),
            EnvGuard::set("SLIPWAY_LISTEN_ADDR", "127.0.0.1:9000"),
            EnvGuard::set("SLIPWAY_LOG_LEVEL", "DEBUG"),
        ];

        let config = SlipwayConfig::default();

        assert_eq!(config.registry_namespace, "acme");
        assert!(config.push);
        assert_eq!(config.registry_username.as_deref(), Some("acme-bot"));
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_push_without_credentials_fails_validation() {
        let _guards = vec![
            EnvGuard::set("SLIPWAY_PUSH", "true"),
            EnvGuard::unset("SLIPWAY_REGISTRY_USERNAME"),
            EnvGuard::unset("SLIPWAY_REGISTRY_PASSWORD"),
        ];

        let config = SlipwayConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_listen_addr_fails_validation() {
        let _guard = EnvGuard::set("SLIPWAY_LISTEN_ADDR", "not-an-addr");
        let config = SlipwayConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_log_level_fails_validation() {
        let _guard = EnvGuard::set("SLIPWAY_LOG_LEVEL", "loud");
        let config = SlipwayConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_image_reference() {
        let _guards = vec![
            EnvGuard::set("SLIPWAY_REGISTRY_NAMESPACE", "acme"),
            EnvGuard::unset("SLIPWAY_PUSH"),
        ];
        let config = SlipwayConfig::default();
        assert_eq!(config.image_reference("my-app"), "acme/my-app:latest");
    }
}
