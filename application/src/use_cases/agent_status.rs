//! Agent Status use case
//!
//! Reports every registered agent with its health and trust, and exposes the
//! admin trust reset.

use crate::services::registry::{AgentRegistry, AgentStatus, RegistryError};
use crate::services::trust_manager::TrustManager;
use std::sync::Arc;
use tracing::info;
use verity_domain::AgentId;

pub struct AgentStatusUseCase {
    registry: Arc<AgentRegistry>,
    trust: Arc<TrustManager>,
}

impl AgentStatusUseCase {
    pub fn new(registry: Arc<AgentRegistry>, trust: Arc<TrustManager>) -> Self {
        Self { registry, trust }
    }

    /// Status of every agent, ordered by id
    pub fn execute(&self) -> Vec<AgentStatus> {
        self.registry.snapshot()
    }

    /// Reset an agent's trust to the neutral prior
    pub async fn reset_trust(&self, id: &AgentId) -> Result<AgentStatus, RegistryError> {
        self.trust.reset(id).await?;
        info!("Admin reset trust of {}", id);
        let agent = self.registry.get(id)?;
        Ok(AgentStatus::from(&agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrustParams;
    use crate::ports::persistence::NoPersistence;
    use verity_domain::{Agent, Capability, NEUTRAL_TRUST};

    fn use_case() -> AgentStatusUseCase {
        let registry = Arc::new(
            AgentRegistry::with_agents([
                Agent::new("b", [Capability::News]).with_trust(0.9),
                Agent::new("a", [Capability::Science, Capability::Health]),
            ])
            .unwrap(),
        );
        let trust = Arc::new(TrustManager::new(
            Arc::clone(&registry),
            Arc::new(NoPersistence),
            TrustParams::default(),
        ));
        AgentStatusUseCase::new(registry, trust)
    }

    #[test]
    fn test_status_lists_all_agents() {
        let statuses = use_case().execute();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].agent_id, AgentId::new("a"));
        assert_eq!(
            statuses[0].capabilities,
            vec![Capability::Science, Capability::Health]
        );
        assert_eq!(statuses[1].trust_score, 0.9);
    }

    #[tokio::test]
    async fn test_reset_trust() {
        let use_case = use_case();
        let status = use_case.reset_trust(&AgentId::new("b")).await.unwrap();
        assert_eq!(status.trust_score, NEUTRAL_TRUST);
        assert!(use_case.reset_trust(&AgentId::new("zz")).await.is_err());
    }
}
