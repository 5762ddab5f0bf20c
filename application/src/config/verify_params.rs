//! Verification parameters - orchestrator control.
//!
//! [`VerifyParams`] groups the static parameters that control dispatch,
//! deadlines and backpressure in
//! [`VerifyClaimUseCase`](crate::use_cases::verify_claim::VerifyClaimUseCase).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verity_domain::SelectionPolicy;

/// Orchestrator control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyParams {
    /// How many agents each priority dispatches to
    pub selection: SelectionPolicy,
    /// Partial confidence at which remaining tasks may be cancelled
    pub certainty_threshold: f64,
    /// Reserved at the end of the deadline for consensus and debate bookkeeping
    pub safety_margin: Duration,
    /// How long past the deadline collection may run before stragglers are abandoned
    pub grace: Duration,
    /// Longest a request waits for task permits
    pub queue_timeout: Duration,
    /// System-wide cap on in-flight agent tasks
    pub max_in_flight: usize,
    /// Deadline used when the caller does not supply one
    pub default_deadline: Duration,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            certainty_threshold: 0.9,
            safety_margin: Duration::from_millis(250),
            grace: Duration::from_millis(250),
            queue_timeout: Duration::from_secs(2),
            max_in_flight: 64,
            default_deadline: Duration::from_secs(30),
        }
    }
}

impl VerifyParams {
    // ==================== Builder Methods ====================

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_certainty_threshold(mut self, threshold: f64) -> Self {
        self.certainty_threshold = threshold;
        self
    }

    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Per-task budget for a request with the given deadline.
    ///
    /// The safety margin never takes more than half of the deadline.
    pub fn task_budget(&self, deadline: Duration) -> Duration {
        deadline.saturating_sub(self.safety_margin.min(deadline / 2))
    }
}
