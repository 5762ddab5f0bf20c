//! Agent selection
//!
//! Pure function deciding which eligible agents receive a request. Ranking
//! prefers specialists in the claim's domain, then generalists, then healthy
//! over degraded agents, then higher trust. Agent id breaks remaining ties so
//! the same registry state always yields the same selection.

use super::entities::Agent;
use super::value_objects::{Capability, HealthStatus};
use crate::claim::Priority;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How many agents a request fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Agents per `low`/`normal` request (K)
    pub max_agents: usize,
    /// Upper bound for `high` priority requests
    pub high_priority_cap: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_agents: 3,
            high_priority_cap: 7,
        }
    }
}

impl SelectionPolicy {
    pub fn limit_for(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low | Priority::Normal => self.max_agents,
            Priority::High => self.high_priority_cap.max(self.max_agents),
        }
    }
}

fn domain_rank(agent: &Agent, domain: Capability) -> u8 {
    if agent.specializes_in(domain) {
        0
    } else if agent.specializes_in(Capability::General) {
        1
    } else {
        2
    }
}

fn health_rank(health: HealthStatus) -> u8 {
    match health {
        HealthStatus::Healthy => 0,
        HealthStatus::Degraded => 1,
        HealthStatus::Unavailable => 2,
    }
}

fn compare(a: &Agent, b: &Agent, domain: Capability) -> Ordering {
    domain_rank(a, domain)
        .cmp(&domain_rank(b, domain))
        .then_with(|| health_rank(a.health).cmp(&health_rank(b.health)))
        .then_with(|| b.trust_score.total_cmp(&a.trust_score))
        .then_with(|| a.id.cmp(&b.id))
}

/// Select the agents that should evaluate a claim in `domain`.
///
/// Unavailable agents are never selected even if present in `eligible`.
pub fn select_agents(
    eligible: &[Agent],
    domain: Capability,
    priority: Priority,
    policy: &SelectionPolicy,
) -> Vec<Agent> {
    let mut ranked: Vec<Agent> = eligible
        .iter()
        .filter(|a| a.health.is_dispatchable())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| compare(a, b, domain));
    ranked.truncate(policy.limit_for(priority));
    ranked
}
