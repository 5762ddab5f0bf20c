//! Orchestrator configuration from TOML (`[orchestrator]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verity_application::VerifyParams;
use verity_domain::{ConfigIssue, ConfigIssueCode, SelectionPolicy};

/// Raw orchestrator configuration from TOML
///
/// # Example
///
/// ```toml
/// [orchestrator]
/// max_agents = 3               # agents per low/normal request
/// high_priority_cap = 7        # agents per high priority request
/// certainty_threshold = 0.9    # fast-path confidence
/// default_deadline_ms = 30000
/// max_in_flight = 64           # agent tasks across all requests
/// queue_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub max_agents: usize,
    pub high_priority_cap: usize,
    pub certainty_threshold: f64,
    pub default_deadline_ms: u64,
    pub safety_margin_ms: u64,
    pub grace_ms: u64,
    pub max_in_flight: usize,
    pub queue_timeout_ms: u64,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let params = VerifyParams::default();
        Self {
            max_agents: params.selection.max_agents,
            high_priority_cap: params.selection.high_priority_cap,
            certainty_threshold: params.certainty_threshold,
            default_deadline_ms: params.default_deadline.as_millis() as u64,
            safety_margin_ms: params.safety_margin.as_millis() as u64,
            grace_ms: params.grace.as_millis() as u64,
            max_in_flight: params.max_in_flight,
            queue_timeout_ms: params.queue_timeout.as_millis() as u64,
        }
    }
}

impl FileOrchestratorConfig {
    /// Convert to [`VerifyParams`]; invalid values fall back to defaults.
    pub fn to_verify_params(&self) -> (VerifyParams, Vec<ConfigIssue>) {
        let defaults = Self::default();
        let mut issues = Vec::new();

        let max_agents = positive(
            "orchestrator.max_agents",
            self.max_agents,
            defaults.max_agents,
            &mut issues,
        );
        let max_in_flight = positive(
            "orchestrator.max_in_flight",
            self.max_in_flight,
            defaults.max_in_flight,
            &mut issues,
        );
        let default_deadline_ms = positive(
            "orchestrator.default_deadline_ms",
            self.default_deadline_ms,
            defaults.default_deadline_ms,
            &mut issues,
        );

        let certainty_threshold = if (0.0..=1.0).contains(&self.certainty_threshold) {
            self.certainty_threshold
        } else {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "orchestrator.certainty_threshold".to_string(),
                    value: self.certainty_threshold,
                },
                format!(
                    "orchestrator.certainty_threshold: {} is outside 0.0..=1.0",
                    self.certainty_threshold
                ),
            ));
            defaults.certainty_threshold
        };

        let params = VerifyParams::default()
            .with_selection(SelectionPolicy {
                max_agents,
                high_priority_cap: self.high_priority_cap.max(max_agents),
            })
            .with_certainty_threshold(certainty_threshold)
            .with_default_deadline(Duration::from_millis(default_deadline_ms))
            .with_safety_margin(Duration::from_millis(self.safety_margin_ms))
            .with_grace(Duration::from_millis(self.grace_ms))
            .with_max_in_flight(max_in_flight)
            .with_queue_timeout(Duration::from_millis(self.queue_timeout_ms));
        (params, issues)
    }
}

/// Zero is rejected for counts and durations that must be positive
pub(super) fn positive<T>(field: &str, value: T, fallback: T, issues: &mut Vec<ConfigIssue>) -> T
where
    T: Copy + PartialEq + Default,
{
    if value != T::default() {
        return value;
    }
    issues.push(ConfigIssue::error(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
            value: 0.0,
        },
        format!("{}: must be greater than zero", field),
    ));
    fallback
}
