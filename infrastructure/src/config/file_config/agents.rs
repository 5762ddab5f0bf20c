//! Agent definitions from TOML (`[[agents]]` array)

use serde::{Deserialize, Serialize};
use verity_domain::{Agent, AgentId, Capability, ConfigIssue, ConfigIssueCode};

/// One configured verification agent
///
/// # Example
///
/// ```toml
/// [[agents]]
/// id = "sci-1"
/// capabilities = ["science", "health"]
/// trust = 0.7                  # initial score before any history
/// command = "sci-agent"        # overrides [gateway] command
/// args = ["--strict"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentEntry {
    pub id: String,
    pub capabilities: Vec<String>,
    pub trust: Option<f64>,
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl FileAgentEntry {
    /// Build the domain agent.
    ///
    /// Unknown capabilities are dropped with a warning; an agent without any
    /// known capability becomes a generalist. Returns `None` for an empty id.
    pub fn parse(&self, index: usize) -> (Option<Agent>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let id = match AgentId::try_new(self.id.as_str()) {
            Ok(id) => id,
            Err(_) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyValue {
                        field: format!("agents[{}].id", index),
                    },
                    format!("agents[{}].id: agent id must not be empty", index),
                ));
                return (None, issues);
            }
        };

        let mut capabilities = Vec::new();
        for raw in &self.capabilities {
            match raw.parse::<Capability>() {
                Ok(capability) => capabilities.push(capability),
                Err(_) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("agents.{}.capabilities", id),
                        value: raw.clone(),
                        valid_values: Capability::all()
                            .iter()
                            .map(|c| c.as_str().to_string())
                            .collect(),
                    },
                    format!("agents.{}: unknown capability '{}', ignored", id, raw),
                )),
            }
        }
        if capabilities.is_empty() {
            capabilities.push(Capability::General);
        }

        let mut agent = Agent::new(id.clone(), capabilities);
        if let Some(trust) = self.trust {
            if (0.0..=1.0).contains(&trust) {
                agent = agent.with_trust(trust);
            } else {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange {
                        field: format!("agents.{}.trust", id),
                        value: trust,
                    },
                    format!("agents.{}.trust: {} is outside 0.0..=1.0, clamped", id, trust),
                ));
                agent = agent.with_trust(trust.clamp(0.0, 1.0));
            }
        }

        (Some(agent), issues)
    }
}
