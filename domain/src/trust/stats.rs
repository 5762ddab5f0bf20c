//! Running confidence statistics (Welford's online algorithm)

use serde::{Deserialize, Serialize};

/// Running mean and variance of the confidences an agent has reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfidenceStats {
    pub count: u64,
    pub mean: f64,
    /// Sum of squared deviations from the mean
    pub m2: f64,
}

impl ConfidenceStats {
    pub fn observe(&mut self, confidence: f64) {
        let x = confidence.clamp(0.0, 1.0);
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Population standard deviation (0.0 with fewer than two samples)
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    /// How many standard deviations `confidence` lies from the mean.
    ///
    /// Returns `None` until `min_samples` observations exist. The standard
    /// deviation is floored at `min_std_dev` so agents with perfectly stable
    /// history still produce finite scores.
    pub fn z_score(&self, confidence: f64, min_samples: u64, min_std_dev: f64) -> Option<f64> {
        if self.count < min_samples.max(1) {
            return None;
        }
        let sd = self.std_dev().max(min_std_dev.max(f64::EPSILON));
        Some((confidence - self.mean).abs() / sd)
    }
}
