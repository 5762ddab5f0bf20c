//! Consensus parameters

use serde::{Deserialize, Serialize};

/// Tunables of the weighted vote.
///
/// All defaults are configuration, not contract: operators may tighten or
/// loosen the Byzantine penalty and escalation threshold per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusPolicy {
    /// Top two categories whose shares of total weight differ by less than
    /// this are treated as a tie, resolved to UNCERTAIN
    pub tie_epsilon: f64,
    /// Confidence below which a contested result escalates to debate
    pub escalation_threshold: f64,
    /// Weight multiplier for verdicts with anomalous confidence
    pub byzantine_penalty: f64,
    /// Standard deviations from an agent's own history that count as anomalous
    pub deviation_sigmas: f64,
    /// History required before deviation checks apply
    pub min_history: u64,
    /// Floor for an agent's confidence standard deviation
    pub min_std_dev: f64,
    /// Weight multiplier for the debate moderator's verdict
    pub moderator_weight: f64,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            tie_epsilon: 0.05,
            escalation_threshold: 0.6,
            byzantine_penalty: 0.25,
            deviation_sigmas: 2.0,
            min_history: 5,
            min_std_dev: 0.05,
            moderator_weight: 2.0,
        }
    }
}
