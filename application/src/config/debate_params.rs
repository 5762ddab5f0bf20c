//! Debate parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls escalation to adversarial debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateParams {
    /// When false, contested results are returned without debate
    pub enabled: bool,
    pub max_rounds: usize,
    /// Budget for each side's argument in one round, and for the ruling
    pub round_timeout: Duration,
}

impl Default for DebateParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rounds: 3,
            round_timeout: Duration::from_secs(10),
        }
    }
}

impl DebateParams {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }
}
