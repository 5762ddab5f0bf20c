//! Trust records and the reputation update rule

use super::stats::ConfidenceStats;
use crate::agent::{AgentId, NEUTRAL_TRUST};
use crate::core::clock::current_timestamp;
use serde::{Deserialize, Serialize};

/// Parameters of the reputation model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Score for agents without history, and the target of `decay`
    pub neutral_prior: f64,
    /// Base EMA learning rate (α)
    pub learning_rate: f64,
    /// Floor for the effective learning rate
    pub min_learning_rate: f64,
    /// Sample count at which the effective learning rate has halved
    pub half_life_samples: f64,
    /// Fraction of the distance to the prior removed by one `decay` call
    pub decay_rate: f64,
    /// Health transitions within the flap window that trigger a penalty
    pub flap_threshold: usize,
    /// Multiplier applied to the score of a flapping agent
    pub flap_penalty: f64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            neutral_prior: NEUTRAL_TRUST,
            learning_rate: 0.1,
            min_learning_rate: 0.01,
            half_life_samples: 50.0,
            decay_rate: 0.05,
            flap_threshold: 4,
            flap_penalty: 0.9,
        }
    }
}

impl TrustPolicy {
    /// Effective learning rate after `samples` updates.
    ///
    /// Shrinks as history grows so a single bad result cannot over-correct an
    /// agent with a long good record; never drops below `min_learning_rate`.
    pub fn effective_learning_rate(&self, samples: u64) -> f64 {
        let half_life = self.half_life_samples.max(1.0);
        let scaled = self.learning_rate / (1.0 + samples as f64 / half_life);
        scaled.max(self.min_learning_rate).clamp(0.0, 1.0)
    }
}

/// Persistent reputation state of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustRecord {
    pub agent_id: AgentId,
    /// Running accuracy estimate (0.0 to 1.0), the agent's trust score
    pub score: f64,
    /// Number of consensus outcomes folded into `score`
    pub sample_count: u64,
    /// Distribution of the confidences this agent has reported
    #[serde(default)]
    pub confidence: ConfidenceStats,
    /// Last update (milliseconds since epoch)
    pub updated_at: u64,
}

impl TrustRecord {
    pub fn new(agent_id: AgentId, policy: &TrustPolicy) -> Self {
        Self::with_score(agent_id, policy.neutral_prior)
    }

    pub fn with_score(agent_id: AgentId, score: f64) -> Self {
        Self {
            agent_id,
            score: score.clamp(0.0, 1.0),
            sample_count: 0,
            confidence: ConfidenceStats::default(),
            updated_at: current_timestamp(),
        }
    }

    /// Fold one consensus outcome into the score.
    ///
    /// `new = old * (1 - a) + a * outcome` where `outcome` is 1.0 when the
    /// agent matched the consensus and 0.0 otherwise, and `a` is the effective
    /// learning rate scaled by `weight` (the agent's confidence in its own
    /// verdict). Weight sets the step size, not the target, so repeated
    /// matches converge to 1.0. Returns the new score.
    pub fn apply_outcome(&mut self, matched: bool, weight: f64, policy: &TrustPolicy) -> f64 {
        let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        let alpha = policy.effective_learning_rate(self.sample_count) * weight;
        let outcome = if matched { 1.0 } else { 0.0 };

        self.score = (self.score * (1.0 - alpha) + alpha * outcome).clamp(0.0, 1.0);
        self.sample_count += 1;
        self.updated_at = current_timestamp();
        self.score
    }

    /// Record a reported confidence in the agent's history
    pub fn observe_confidence(&mut self, confidence: f64) {
        self.confidence.observe(confidence);
    }

    /// Move the score toward the neutral prior
    pub fn decay(&mut self, policy: &TrustPolicy) -> f64 {
        let rate = policy.decay_rate.clamp(0.0, 1.0);
        self.score = (self.score + (policy.neutral_prior - self.score) * rate).clamp(0.0, 1.0);
        self.updated_at = current_timestamp();
        self.score
    }

    /// Penalize an agent whose health keeps flapping
    pub fn apply_flap_penalty(&mut self, policy: &TrustPolicy) -> f64 {
        self.score = (self.score * policy.flap_penalty.clamp(0.0, 1.0)).clamp(0.0, 1.0);
        self.updated_at = current_timestamp();
        self.score
    }
}
