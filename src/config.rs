use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TzError};
use crate::index::ArtifactFormat;

/// How candidate rings are loaded and tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One candidate at a time in descent order, stopping at the first match.
    #[default]
    Sequential,
    /// All candidates on the rayon pool, winner picked in descent order.
    Parallel,
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationMode::Sequential => write!(f, "sequential"),
            EvaluationMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Where the dataset lives and how queries are evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// BVH artifact, loaded once at startup.
    pub bvh_path: PathBuf,
    pub bvh_format: ArtifactFormat,
    /// Root of the per-ring binary files.
    pub ring_dir: PathBuf,
    pub evaluation: EvaluationMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from_data_dir("data")
    }
}

impl ResolverConfig {
    /// Standard layout: `<dir>/bvh.json` and `<dir>/tz_bin/`.
    pub fn from_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            bvh_path: dir.join("bvh.json"),
            bvh_format: ArtifactFormat::Nested,
            ring_dir: dir.join("tz_bin"),
            evaluation: EvaluationMode::Sequential,
        }
    }

    /// Read a JSON config file. Missing fields take their defaults and
    /// relative paths are resolved against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TzError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        let mut config: ResolverConfig = serde_json::from_str(&text)
            .map_err(|e| TzError::Config(format!("invalid config {}: {e}", path.display())))?;

        if let Some(base) = path.parent() {
            config.bvh_path = rebase(base, config.bvh_path);
            config.ring_dir = rebase(base, config.ring_dir);
        }
        Ok(config)
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationMode) -> Self {
        self.evaluation = evaluation;
        self
    }
}

fn rebase(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
