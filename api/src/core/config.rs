//! Process configuration.
//!
//! Two layers: environment variables for the broker process itself (host,
//! port, paths) and a project-local TOML file consumed by orchestrators
//! (`review.enabled`, granularity, execution mode, reviewer pool). A missing
//! config file means defaults; a malformed one is a boot error.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default loopback bind. The broker trusts all connections and must never
/// listen on a routable interface.
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8321;

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("cannot resolve repository root: {0}")]
    RepoRoot(std::io::Error),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("assets dir {path} does not resolve: {source}")]
    Assets {
        path: String,
        source: std::io::Error,
    },
}

/// How reviews are batched by the outer workflow. The broker itself only
/// stores and reports this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewGranularity {
    #[default]
    PerTask,
    PerPlan,
}

/// Whether the orchestrator blocks on verdicts or proceeds optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Blocking,
    Optimistic,
}

/// `[review]` section of the project config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewSection {
    pub enabled: bool,
    pub review_granularity: ReviewGranularity,
    pub execution_mode: ExecutionMode,
    /// Opaque to the broker; the reviewer spawner interprets it.
    pub reviewer_pool: toml::Table,
}

impl Default for ReviewSection {
    fn default() -> Self {
        Self {
            enabled: true,
            review_granularity: ReviewGranularity::default(),
            execution_mode: ExecutionMode::default(),
            reviewer_pool: toml::Table::new(),
        }
    }
}

/// Whole project config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub review: ReviewSection,
}

/// Fully resolved broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Working tree the diff dry-runs check against.
    pub repo_root: PathBuf,
    /// SQLite file under the project's planning directory.
    pub db_path: PathBuf,
    /// Dashboard static assets; canonicalized at startup, `None` disables.
    pub assets_dir: Option<PathBuf>,
    /// JSON-Lines logs the push channel may tail. Read-only for the broker.
    pub log_dir: PathBuf,
    pub project: ProjectConfig,
}

impl BrokerConfig {
    /// Resolves configuration from the environment and the project config
    /// file (if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("GSD_BROKER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("GSD_BROKER_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "GSD_BROKER_PORT",
                value: raw,
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let repo_root = match env::var("GSD_BROKER_REPO_ROOT") {
            Ok(raw) => PathBuf::from(raw),
            Err(_) => env::current_dir().map_err(ConfigError::RepoRoot)?,
        };
        let planning = repo_root.join(".planning");
        let db_path = planning.join("gsd_review_broker.sqlite3");

        let config_path = env::var("GSD_BROKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| planning.join("gsd-review.toml"));
        let project = load_project_config(&config_path)?;

        let assets_dir = match env::var("GSD_BROKER_ASSETS_DIR") {
            Ok(raw) => Some(
                // Canonical absolute form; ServeDir then contains traversal.
                std::fs::canonicalize(&raw).map_err(|source| ConfigError::Assets {
                    path: raw,
                    source,
                })?,
            ),
            Err(_) => None,
        };

        let log_dir = env::var("GSD_BROKER_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| repo_root.join(".planning"))
                    .join("gsd-review-broker")
                    .join("logs")
            });

        Ok(Self {
            host,
            port,
            repo_root,
            db_path,
            assets_dir,
            log_dir,
            project,
        })
    }
}

fn load_project_config(path: &std::path::Path) -> Result<ProjectConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no project config file, using defaults");
        return Ok(ProjectConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_config_defaults_are_permissive() {
        let cfg = ProjectConfig::default();
        assert!(cfg.review.enabled);
        assert_eq!(cfg.review.review_granularity, ReviewGranularity::PerTask);
        assert_eq!(cfg.review.execution_mode, ExecutionMode::Blocking);
    }

    #[test]
    fn parses_review_section() {
        let cfg: ProjectConfig = toml::from_str(
            r#"
            [review]
            enabled = false
            review_granularity = "per_plan"
            execution_mode = "optimistic"

            [review.reviewer_pool]
            size = 2
            "#,
        )
        .expect("parse");
        assert!(!cfg.review.enabled);
        assert_eq!(cfg.review.review_granularity, ReviewGranularity::PerPlan);
        assert_eq!(cfg.review.execution_mode, ExecutionMode::Optimistic);
        assert_eq!(
            cfg.review.reviewer_pool.get("size").and_then(|v| v.as_integer()),
            Some(2)
        );
    }
}
