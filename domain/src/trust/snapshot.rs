//! Point-in-time trust view used for weighting

use super::stats::ConfidenceStats;
use crate::agent::{AgentId, NEUTRAL_TRUST};
use std::collections::BTreeMap;

/// Trust state of one agent at snapshot time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentTrust {
    pub score: f64,
    pub confidence: ConfidenceStats,
}

/// Immutable trust view handed to the consensus engine.
///
/// Taking one snapshot per request keeps `resolve` deterministic while other
/// requests keep updating the live scores.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustSnapshot {
    entries: BTreeMap<AgentId, AgentTrust>,
    default_score: f64,
}

impl Default for TrustSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustSnapshot {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            default_score: NEUTRAL_TRUST,
        }
    }

    /// Score used for agents missing from the snapshot
    pub fn with_default_score(mut self, score: f64) -> Self {
        self.default_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn insert(&mut self, agent_id: AgentId, score: f64, confidence: ConfidenceStats) {
        self.entries.insert(
            agent_id,
            AgentTrust {
                score: score.clamp(0.0, 1.0),
                confidence,
            },
        );
    }

    /// Builder-style insert with empty confidence history
    pub fn with_score(mut self, agent_id: impl Into<AgentId>, score: f64) -> Self {
        self.insert(agent_id.into(), score, ConfidenceStats::default());
        self
    }

    pub fn score(&self, agent_id: &AgentId) -> f64 {
        self.entries
            .get(agent_id)
            .map(|t| t.score)
            .unwrap_or(self.default_score)
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentTrust> {
        self.entries.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_agent_gets_default() {
        let snapshot = TrustSnapshot::new().with_score("a", 0.9);
        assert_eq!(snapshot.score(&AgentId::new("a")), 0.9);
        assert_eq!(snapshot.score(&AgentId::new("b")), NEUTRAL_TRUST);

        let strict = TrustSnapshot::new().with_default_score(0.1);
        assert_eq!(strict.score(&AgentId::new("b")), 0.1);
    }
}
