//! Trust configuration from TOML (`[trust]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verity_application::TrustParams;
use verity_domain::{ConfigIssue, ConfigIssueCode, TrustPolicy};

/// Raw trust configuration from TOML
///
/// # Example
///
/// ```toml
/// [trust]
/// learning_rate = 0.1
/// decay_rate = 0.05
/// decay_interval_secs = 3600   # omit to disable background decay
/// flap_threshold = 4
/// flap_window_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTrustConfig {
    pub neutral_prior: f64,
    pub learning_rate: f64,
    pub min_learning_rate: f64,
    pub half_life_samples: f64,
    pub decay_rate: f64,
    pub decay_interval_secs: Option<u64>,
    pub flap_threshold: usize,
    pub flap_penalty: f64,
    pub flap_window_secs: u64,
}

impl Default for FileTrustConfig {
    fn default() -> Self {
        let params = TrustParams::default();
        let policy = params.policy;
        Self {
            neutral_prior: policy.neutral_prior,
            learning_rate: policy.learning_rate,
            min_learning_rate: policy.min_learning_rate,
            half_life_samples: policy.half_life_samples,
            decay_rate: policy.decay_rate,
            decay_interval_secs: params.decay_interval.map(|d| d.as_secs()),
            flap_threshold: policy.flap_threshold,
            flap_penalty: policy.flap_penalty,
            flap_window_secs: params.flap_window.as_secs(),
        }
    }
}

impl FileTrustConfig {
    /// Convert to [`TrustParams`]. Rates outside `0.0..=1.0` fall back to
    /// their defaults; a zero decay interval disables decay.
    pub fn to_trust_params(&self) -> (TrustParams, Vec<ConfigIssue>) {
        let defaults = TrustPolicy::default();
        let mut issues = Vec::new();
        let mut rate = |field: &str, value: f64, fallback: f64| {
            if (0.0..=1.0).contains(&value) {
                value
            } else {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: format!("trust.{}", field),
                        value,
                    },
                    format!("trust.{}: {} is outside 0.0..=1.0", field, value),
                ));
                fallback
            }
        };

        let policy = TrustPolicy {
            neutral_prior: rate("neutral_prior", self.neutral_prior, defaults.neutral_prior),
            learning_rate: rate("learning_rate", self.learning_rate, defaults.learning_rate),
            min_learning_rate: rate(
                "min_learning_rate",
                self.min_learning_rate,
                defaults.min_learning_rate,
            ),
            half_life_samples: self.half_life_samples.max(1.0),
            decay_rate: rate("decay_rate", self.decay_rate, defaults.decay_rate),
            flap_threshold: self.flap_threshold.max(1),
            flap_penalty: rate("flap_penalty", self.flap_penalty, defaults.flap_penalty),
        };

        let params = TrustParams::new(policy)
            .with_flap_window(Duration::from_secs(self.flap_window_secs))
            .with_decay_interval(
                self.decay_interval_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            );
        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_interval() {
        let config: super::super::FileConfig = toml::from_str(
            r#"
[trust]
decay_interval_secs = 600
learning_rate = 0.2
"#,
        )
        .unwrap();
        let (params, issues) = config.trust.to_trust_params();
        assert!(issues.is_empty());
        assert_eq!(params.decay_interval, Some(Duration::from_secs(600)));
        assert_eq!(params.policy.learning_rate, 0.2);

        let zero = FileTrustConfig {
            decay_interval_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.to_trust_params().0.decay_interval, None);
    }

    #[test]
    fn test_invalid_rate() {
        let config = FileTrustConfig {
            learning_rate: -0.1,
            ..Default::default()
        };
        let (params, issues) = config.to_trust_params();
        assert_eq!(issues.len(), 1);
        assert_eq!(params.policy.learning_rate, 0.1);
    }
}
