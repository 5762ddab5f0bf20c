//! Consensus configuration from TOML (`[consensus]` section)

use serde::{Deserialize, Serialize};
use verity_domain::{ConfigIssue, ConfigIssueCode, ConsensusPolicy};

/// Raw consensus configuration from TOML
///
/// # Example
///
/// ```toml
/// [consensus]
/// escalation_threshold = 0.6
/// tie_epsilon = 0.05
/// byzantine_penalty = 0.25   # weight multiplier for anomalous confidence
/// deviation_sigmas = 2.0
/// moderator_weight = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    pub tie_epsilon: f64,
    pub escalation_threshold: f64,
    pub byzantine_penalty: f64,
    pub deviation_sigmas: f64,
    pub min_history: u64,
    pub min_std_dev: f64,
    pub moderator_weight: f64,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        let policy = ConsensusPolicy::default();
        Self {
            tie_epsilon: policy.tie_epsilon,
            escalation_threshold: policy.escalation_threshold,
            byzantine_penalty: policy.byzantine_penalty,
            deviation_sigmas: policy.deviation_sigmas,
            min_history: policy.min_history,
            min_std_dev: policy.min_std_dev,
            moderator_weight: policy.moderator_weight,
        }
    }
}

impl FileConsensusConfig {
    /// Convert to [`ConsensusPolicy`]; out-of-range values fall back to
    /// their defaults.
    pub fn to_policy(&self) -> (ConsensusPolicy, Vec<ConfigIssue>) {
        let defaults = ConsensusPolicy::default();
        let mut issues = Vec::new();
        let mut check = |field: &str, value: f64, valid: bool, fallback: f64| {
            if valid {
                value
            } else {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: format!("consensus.{}", field),
                        value,
                    },
                    format!("consensus.{}: {} is out of range", field, value),
                ));
                fallback
            }
        };

        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let policy = ConsensusPolicy {
            tie_epsilon: check(
                "tie_epsilon",
                self.tie_epsilon,
                unit(self.tie_epsilon),
                defaults.tie_epsilon,
            ),
            escalation_threshold: check(
                "escalation_threshold",
                self.escalation_threshold,
                unit(self.escalation_threshold),
                defaults.escalation_threshold,
            ),
            byzantine_penalty: check(
                "byzantine_penalty",
                self.byzantine_penalty,
                unit(self.byzantine_penalty),
                defaults.byzantine_penalty,
            ),
            deviation_sigmas: check(
                "deviation_sigmas",
                self.deviation_sigmas,
                self.deviation_sigmas > 0.0,
                defaults.deviation_sigmas,
            ),
            min_history: self.min_history,
            min_std_dev: check(
                "min_std_dev",
                self.min_std_dev,
                self.min_std_dev >= 0.0,
                defaults.min_std_dev,
            ),
            moderator_weight: check(
                "moderator_weight",
                self.moderator_weight,
                self.moderator_weight >= 1.0,
                defaults.moderator_weight,
            ),
        };
        (policy, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section() {
        let config: super::super::FileConfig = toml::from_str(
            r#"
[consensus]
escalation_threshold = 0.7
"#,
        )
        .unwrap();
        let (policy, issues) = config.consensus.to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy.escalation_threshold, 0.7);
        assert_eq!(policy.byzantine_penalty, 0.25);
    }

    #[test]
    fn test_out_of_range_reported() {
        let config = FileConsensusConfig {
            byzantine_penalty: 3.0,
            moderator_weight: 0.5,
            ..Default::default()
        };
        let (policy, issues) = config.to_policy();
        assert_eq!(issues.len(), 2);
        assert_eq!(policy, ConsensusPolicy::default());
    }
}
