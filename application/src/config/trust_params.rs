//! Trust manager parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verity_domain::TrustPolicy;

/// Reputation model plus the timing the manager needs around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustParams {
    pub policy: TrustPolicy,
    /// Window over which health transitions count toward the flap penalty
    pub flap_window: Duration,
    /// Period of background decay toward the neutral prior (`None` disables it)
    pub decay_interval: Option<Duration>,
}

impl Default for TrustParams {
    fn default() -> Self {
        Self::new(TrustPolicy::default())
    }
}

impl TrustParams {
    pub fn new(policy: TrustPolicy) -> Self {
        Self {
            policy,
            flap_window: Duration::from_secs(300),
            decay_interval: None,
        }
    }

    pub fn with_flap_window(mut self, window: Duration) -> Self {
        self.flap_window = window;
        self
    }

    pub fn with_decay_interval(mut self, interval: Option<Duration>) -> Self {
        self.decay_interval = interval;
        self
    }
}
