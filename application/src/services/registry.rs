//! Agent registry
//!
//! Holds every known agent behind its own lock. The outer map is only
//! write-locked to add or remove agents; health, trust and activity updates
//! lock a single agent entry.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use verity_domain::{Agent, AgentId, Capability, HealthStatus, current_timestamp};

/// Transitions kept per agent; older ones fall outside any sensible flap window
const MAX_TRANSITIONS: usize = 64;

/// Errors raised by registry operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(AgentId),
}

/// Public view of one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    pub agent_id: AgentId,
    pub status: HealthStatus,
    pub trust_score: f64,
    pub capabilities: Vec<Capability>,
    pub last_active: u64,
}

impl From<&Agent> for AgentStatus {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.clone(),
            status: agent.health,
            trust_score: agent.trust_score,
            capabilities: agent.capabilities.iter().copied().collect(),
            last_active: agent.last_active,
        }
    }
}

#[derive(Debug)]
struct AgentEntry {
    agent: Agent,
    /// Timestamps (ms) of health changes, oldest first
    transitions: VecDeque<u64>,
}

type EntryHandle = Arc<Mutex<AgentEntry>>;

/// Registry of verification agents
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<AgentId, EntryHandle>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of agents
    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for agent in agents {
            registry.register(agent)?;
        }
        Ok(registry)
    }

    pub fn register(&self, agent: Agent) -> Result<(), RegistryError> {
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        if agents.contains_key(&agent.id) {
            return Err(RegistryError::AlreadyRegistered(agent.id));
        }
        info!("Registered agent {} ({} capabilities)", agent.id, agent.capabilities.len());
        agents.insert(
            agent.id.clone(),
            Arc::new(Mutex::new(AgentEntry {
                agent,
                transitions: VecDeque::new(),
            })),
        );
        Ok(())
    }

    pub fn deregister(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        let entry = self
            .agents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
        info!("Deregistered agent {}", id);
        let entry = entry.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entry.agent.clone())
    }

    fn entry(&self, id: &AgentId) -> Result<EntryHandle, RegistryError> {
        self.agents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))
    }

    fn handles(&self) -> Vec<EntryHandle> {
        self.agents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn with_entry<T>(
        &self,
        id: &AgentId,
        f: impl FnOnce(&mut AgentEntry) -> T,
    ) -> Result<T, RegistryError> {
        let handle = self.entry(id)?;
        let mut entry = handle.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&mut entry))
    }

    pub fn get(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        self.with_entry(id, |e| e.agent.clone())
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered agent, ordered by id
    pub fn list_all(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .handles()
            .iter()
            .map(|h| h.lock().unwrap_or_else(|e| e.into_inner()).agent.clone())
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    /// Dispatchable agents matching `capabilities`, ordered by id.
    ///
    /// An empty capability set matches every dispatchable agent.
    pub fn list_eligible(&self, capabilities: &BTreeSet<Capability>) -> Vec<Agent> {
        self.list_all()
            .into_iter()
            .filter(|a| a.is_eligible(capabilities))
            .collect()
    }

    /// Record a health-check result.
    ///
    /// Returns `true` when the status changed; changes are kept in the
    /// transition log used for flap detection.
    pub fn mark_health(&self, id: &AgentId, status: HealthStatus) -> Result<bool, RegistryError> {
        self.with_entry(id, |entry| {
            let previous = entry.agent.health;
            if previous == status {
                return false;
            }
            entry.agent.health = status;
            if entry.transitions.len() == MAX_TRANSITIONS {
                entry.transitions.pop_front();
            }
            entry.transitions.push_back(current_timestamp());
            debug!("Agent {} health {} -> {}", id, previous, status);
            true
        })
    }

    pub fn get_trust(&self, id: &AgentId) -> Result<f64, RegistryError> {
        self.with_entry(id, |e| e.agent.trust_score)
    }

    /// Mirror a trust score computed by the trust manager
    pub(crate) fn set_trust(&self, id: &AgentId, score: f64) -> Result<(), RegistryError> {
        self.with_entry(id, |e| e.agent.trust_score = score.clamp(0.0, 1.0))
    }

    /// Update the agent's last-active timestamp
    pub fn touch(&self, id: &AgentId) -> Result<(), RegistryError> {
        self.with_entry(id, |e| e.agent.touch())
    }

    /// Health transitions within the last `window`
    pub fn flap_count(&self, id: &AgentId, window: Duration) -> Result<usize, RegistryError> {
        let cutoff = current_timestamp().saturating_sub(window.as_millis() as u64);
        self.with_entry(id, |e| e.transitions.iter().filter(|t| **t >= cutoff).count())
    }

    pub(crate) fn clear_transitions(&self, id: &AgentId) -> Result<(), RegistryError> {
        self.with_entry(id, |e| e.transitions.clear())
    }

    /// Status of every agent, ordered by id
    pub fn snapshot(&self) -> Vec<AgentStatus> {
        self.list_all().iter().map(AgentStatus::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AgentRegistry {
        AgentRegistry::with_agents([
            Agent::new("sci-1", [Capability::Science]).with_trust(0.7),
            Agent::new("gen-1", [Capability::General]),
            Agent::new("news-1", [Capability::News]).with_health(HealthStatus::Unavailable),
        ])
        .unwrap()
    }

    fn caps(list: &[Capability]) -> BTreeSet<Capability> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_register_duplicate() {
        let registry = registry();
        let err = registry
            .register(Agent::new("sci-1", [Capability::Science]))
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered(AgentId::new("sci-1")));
    }

    #[test]
    fn test_deregister_unknown() {
        let registry = registry();
        assert!(registry.deregister(&AgentId::new("sci-1")).is_ok());
        assert_eq!(
            registry.deregister(&AgentId::new("sci-1")),
            Err(RegistryError::UnknownAgent(AgentId::new("sci-1")))
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_list_eligible() {
        let registry = registry();
        let science: Vec<_> = registry
            .list_eligible(&caps(&[Capability::Science]))
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(science, vec![AgentId::new("gen-1"), AgentId::new("sci-1")]);

        // Unavailable agents never listed
        let all = registry.list_eligible(&caps(&[]));
        assert_eq!(all.len(), 2);
        assert!(registry.list_eligible(&caps(&[Capability::News])).len() == 1);
    }

    #[test]
    fn test_mark_health_logs_transitions() {
        let registry = registry();
        let id = AgentId::new("sci-1");

        assert!(registry.mark_health(&id, HealthStatus::Degraded).unwrap());
        assert!(!registry.mark_health(&id, HealthStatus::Degraded).unwrap());
        assert!(registry.mark_health(&id, HealthStatus::Healthy).unwrap());

        assert_eq!(registry.flap_count(&id, Duration::from_secs(60)).unwrap(), 2);
        registry.clear_transitions(&id).unwrap();
        assert_eq!(registry.flap_count(&id, Duration::from_secs(60)).unwrap(), 0);
    }

    #[test]
    fn test_unknown_agent_errors() {
        let registry = registry();
        let ghost = AgentId::new("ghost");
        assert!(matches!(
            registry.mark_health(&ghost, HealthStatus::Healthy),
            Err(RegistryError::UnknownAgent(_))
        ));
        assert!(registry.get_trust(&ghost).is_err());
        assert!(registry.touch(&ghost).is_err());
    }

    #[test]
    fn test_trust_and_touch() {
        let registry = registry();
        let id = AgentId::new("gen-1");
        registry.set_trust(&id, 1.4).unwrap();
        assert_eq!(registry.get_trust(&id).unwrap(), 1.0);

        registry.touch(&id).unwrap();
        assert!(registry.get(&id).unwrap().last_active > 0);
    }

    #[test]
    fn test_snapshot_sorted() {
        let statuses = registry().snapshot();
        let ids: Vec<&str> = statuses.iter().map(|s| s.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["gen-1", "news-1", "sci-1"]);
        assert_eq!(statuses[2].trust_score, 0.7);
        assert_eq!(statuses[1].status, HealthStatus::Unavailable);
    }
}
