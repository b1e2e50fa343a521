use crate::error::{BqSyncError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "bq_sync.toml";

/// GCP project configuration (`[project]`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectConfig {
    pub id: String,
    pub default_region: String,
}

/// Which datasets to sync and where (`[sync]`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncSection {
    pub datasets: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Top-level contents of `bq_sync.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncConfig {
    pub project: ProjectConfig,
    pub sync: SyncSection,
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl SyncConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn datasets(&self) -> &[String] {
        &self.sync.datasets
    }

    /// Narrows the run to a single dataset, as `pull --dataset` does.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.sync.datasets = vec![dataset.into()];
        self
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BqSyncError::ConfigNotFound(path.display().to_string())
        } else {
            BqSyncError::Io(e)
        }
    })?;
    SyncConfig::from_toml(&contents)
}

/// Walks from `start` up to the filesystem root looking for `bq_sync.toml`.
pub fn discover_config(start: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start.as_ref();
    let mut current = std::fs::canonicalize(start)?;

    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            break;
        }
    }

    Err(BqSyncError::ConfigNotFound(format!(
        "{} not found (searched from {})",
        CONFIG_FILENAME,
        start.display()
    )))
}

/// `<config dir>/<output_dir>/<project_id>`, so several projects can share
/// one output directory.
pub fn resolve_output_dir(config: &SyncConfig, config_path: &Path) -> PathBuf {
    let base = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(&config.sync.output_dir).join(&config.project.id)
}
