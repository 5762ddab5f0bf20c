//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application parameters,
//! reporting invalid values as [`ConfigIssue`]s.

mod agents;
mod consensus;
mod debate;
mod gateway;
mod logging;
mod orchestrator;
mod storage;
mod trust;

pub use agents::FileAgentEntry;
pub use consensus::FileConsensusConfig;
pub use debate::FileDebateConfig;
pub use gateway::FileGatewayConfig;
pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use storage::FileStorageConfig;
pub use trust::FileTrustConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use verity_application::EngineConfig;
use verity_domain::{Agent, ConfigIssue, ConfigIssueCode};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Dispatch, deadlines and backpressure
    pub orchestrator: FileOrchestratorConfig,
    /// Weighted vote tunables
    pub consensus: FileConsensusConfig,
    /// Reputation model
    pub trust: FileTrustConfig,
    /// Escalation to adversarial debate
    pub debate: FileDebateConfig,
    /// Default agent command
    pub gateway: FileGatewayConfig,
    /// Result and trust persistence
    pub storage: FileStorageConfig,
    pub logging: FileLoggingConfig,
    /// Verification agents
    pub agents: Vec<FileAgentEntry>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Numeric ranges of every tunable section
    /// 2. Agent ids, capabilities and initial trust
    /// 3. Duplicate agent ids and an empty agent list
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (_, mut issues) = self.to_engine_config();
        issues.extend(self.parse_agents().1);
        issues
    }

    /// Application parameters from every tunable section
    pub fn to_engine_config(&self) -> (EngineConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (verify, found) = self.orchestrator.to_verify_params();
        issues.extend(found);
        let (consensus, found) = self.consensus.to_policy();
        issues.extend(found);
        let (trust, found) = self.trust.to_trust_params();
        issues.extend(found);

        let config = EngineConfig {
            verify,
            consensus,
            trust,
            debate: self.debate.to_debate_params(),
        };
        (config, issues)
    }

    /// Domain agents from `[[agents]]`.
    ///
    /// Later duplicates of an id are dropped with an error.
    pub fn parse_agents(&self) -> (Vec<Agent>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut agents = Vec::new();

        for (index, entry) in self.agents.iter().enumerate() {
            let (agent, found) = entry.parse(index);
            issues.extend(found);
            let Some(agent) = agent else {
                continue;
            };
            if !seen.insert(agent.id.clone()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateAgent {
                        id: agent.id.to_string(),
                    },
                    format!("agents: '{}' is defined more than once", agent.id),
                ));
                continue;
            }
            agents.push(agent);
        }

        if agents.is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoAgents,
                "no [[agents]] configured; verify requests will be rejected",
            ));
        }
        (agents, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_domain::{Capability, Severity};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[orchestrator]
max_agents = 5
certainty_threshold = 0.95

[consensus]
escalation_threshold = 0.65

[debate]
max_rounds = 2

[gateway]
command = "verity-agent"
args = ["--fast"]

[storage]
enabled = false

[logging]
file = "/tmp/verity.log"

[[agents]]
id = "sci-1"
capabilities = ["science"]
trust = 0.7

[[agents]]
id = "news-1"
capabilities = ["news", "politics"]
command = "news-agent"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestrator.max_agents, 5);
        assert_eq!(config.gateway.command.as_deref(), Some("verity-agent"));
        assert!(!config.storage.enabled);
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[1].command.as_deref(), Some("news-agent"));

        let (engine, issues) = config.to_engine_config();
        assert!(issues.is_empty());
        assert_eq!(engine.verify.selection.max_agents, 5);
        assert_eq!(engine.verify.certainty_threshold, 0.95);
        assert_eq!(engine.consensus.escalation_threshold, 0.65);
        assert_eq!(engine.debate.max_rounds, 2);

        let (agents, issues) = config.parse_agents();
        assert!(issues.is_empty());
        assert_eq!(agents[0].trust_score, 0.7);
        assert!(agents[1].specializes_in(Capability::Politics));
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.agents.is_empty());
        assert!(config.storage.enabled);
        assert!(config.debate.enabled);
        assert_eq!(config.to_engine_config().0, EngineConfig::default());
    }

    #[test]
    fn test_validate_empty_agents_is_warning() {
        let issues = FileConfig::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::NoAgents);
        assert!(!ConfigIssue::any_errors(&issues));
    }

    #[test]
    fn test_validate_duplicate_agents() {
        let config: FileConfig = toml::from_str(
            r#"
[[agents]]
id = "a"

[[agents]]
id = "a"
capabilities = ["finance"]
"#,
        )
        .unwrap();
        let (agents, issues) = config.parse_agents();
        assert_eq!(agents.len(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(matches!(
            &issues[0].code,
            ConfigIssueCode::DuplicateAgent { id } if id == "a"
        ));
    }
}
