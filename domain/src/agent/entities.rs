//! Agent entity

use super::value_objects::{AgentId, Capability, HealthStatus};
use crate::core::clock::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Trust score assigned to agents with no history
pub const NEUTRAL_TRUST: f64 = 0.5;

/// A verification agent known to the registry
///
/// # Example
///
/// ```
/// use verity_domain::agent::{Agent, Capability};
///
/// let agent = Agent::new("sci-1", [Capability::Science]);
/// assert!(agent.matches(&[Capability::Science].into_iter().collect()));
/// assert_eq!(agent.trust_score, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Domains this agent specializes in
    pub capabilities: BTreeSet<Capability>,
    pub health: HealthStatus,
    /// Running reputation (0.0 to 1.0)
    pub trust_score: f64,
    /// Last time the agent produced a verdict (milliseconds since epoch)
    pub last_active: u64,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            id: id.into(),
            capabilities: capabilities.into_iter().collect(),
            health: HealthStatus::Healthy,
            trust_score: NEUTRAL_TRUST,
            last_active: 0,
        }
    }

    pub fn with_trust(mut self, score: f64) -> Self {
        self.trust_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    /// Whether this agent can serve a request for the given capabilities.
    ///
    /// An empty request matches every agent; `General` agents match any request.
    pub fn matches(&self, requested: &BTreeSet<Capability>) -> bool {
        requested.is_empty()
            || self.capabilities.contains(&Capability::General)
            || !self.capabilities.is_disjoint(requested)
    }

    /// Whether this agent specializes in exactly this domain
    pub fn specializes_in(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether the agent may be dispatched work for `requested`
    pub fn is_eligible(&self, requested: &BTreeSet<Capability>) -> bool {
        self.health.is_dispatchable() && self.matches(requested)
    }

    /// Capability used when asking this agent about a claim in `domain`
    pub fn capability_for(&self, domain: Capability) -> Capability {
        if self.specializes_in(domain) {
            domain
        } else if self.specializes_in(Capability::General) {
            Capability::General
        } else {
            self.capabilities
                .iter()
                .next()
                .copied()
                .unwrap_or(Capability::General)
        }
    }

    pub fn touch(&mut self) {
        self.last_active = current_timestamp();
    }
}
