use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util::write_string;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockCount {
    pub label: String,
    pub trials: usize,
}

/// Sidecar written next to every generated trial file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunMeta {
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub subject: String,
    pub seed: i64,
    pub profile: String,
    pub layout: String,
    pub conditions: String,
    pub output: String,
    pub header: Vec<String>,
    pub trial_count: usize,
    pub blocks: Vec<BlockCount>,
    pub draws: u64,
    pub sha256: String,
    pub fastapi_output_mode: Option<String>,
    pub sqlmodel_output_mode: Option<String>,
}

impl RunMeta {
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_string(path, &content)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&content)?)
    }
}

/// `trials/s1_trials.txt` -> `trials/s1_trials.meta.json`.
#[must_use]
pub fn meta_path_for(output: &Path) -> PathBuf {
    output.with_extension("meta.json")
}
