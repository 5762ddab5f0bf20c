//! Debate configuration from TOML (`[debate]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verity_application::DebateParams;

/// Raw debate configuration from TOML
///
/// # Example
///
/// ```toml
/// [debate]
/// enabled = true
/// max_rounds = 3
/// round_timeout_ms = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDebateConfig {
    pub enabled: bool,
    pub max_rounds: usize,
    pub round_timeout_ms: u64,
}

impl Default for FileDebateConfig {
    fn default() -> Self {
        let params = DebateParams::default();
        Self {
            enabled: params.enabled,
            max_rounds: params.max_rounds,
            round_timeout_ms: params.round_timeout.as_millis() as u64,
        }
    }
}

impl FileDebateConfig {
    pub fn to_debate_params(&self) -> DebateParams {
        DebateParams {
            enabled: self.enabled,
            max_rounds: self.max_rounds,
            round_timeout: Duration::from_millis(self.round_timeout_ms),
        }
    }
}
