//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where results and trust records are kept
///
/// Paths default to the platform data directory
/// (`~/.local/share/verity/` on Linux).
///
/// # Example
///
/// ```toml
/// [storage]
/// enabled = true
/// results_file = "./results.jsonl"
/// trust_file = "./trust.json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub enabled: bool,
    pub results_file: Option<PathBuf>,
    pub trust_file: Option<PathBuf>,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            results_file: None,
            trust_file: None,
        }
    }
}

impl FileStorageConfig {
    fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("verity"))
    }

    pub fn results_path(&self) -> Option<PathBuf> {
        self.results_file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("results.jsonl")))
    }

    pub fn trust_path(&self) -> Option<PathBuf> {
        self.trust_file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("trust.json")))
    }
}
