//! Weighted vote buckets

use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// Summed vote weight per verdict category (ERROR never contributes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WeightedTally {
    pub true_weight: f64,
    pub false_weight: f64,
    pub uncertain_weight: f64,
}

impl WeightedTally {
    pub fn add(&mut self, verdict: Verdict, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        match verdict {
            Verdict::True => self.true_weight += weight,
            Verdict::False => self.false_weight += weight,
            Verdict::Uncertain => self.uncertain_weight += weight,
            Verdict::Error => {}
        }
    }

    pub fn weight_of(&self, verdict: Verdict) -> f64 {
        match verdict {
            Verdict::True => self.true_weight,
            Verdict::False => self.false_weight,
            Verdict::Uncertain => self.uncertain_weight,
            Verdict::Error => 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.true_weight + self.false_weight + self.uncertain_weight
    }

    /// Categories ordered by descending weight.
    ///
    /// Equal weights keep the order TRUE, FALSE, UNCERTAIN.
    pub fn ranked(&self) -> [(Verdict, f64); 3] {
        let mut ranked = [
            (Verdict::True, self.true_weight),
            (Verdict::False, self.false_weight),
            (Verdict::Uncertain, self.uncertain_weight),
        ];
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Winning category and its weight.
    ///
    /// Returns UNCERTAIN when the total is zero or the top two shares are
    /// within `epsilon` of each other.
    pub fn winner(&self, epsilon: f64) -> (Verdict, f64) {
        let total = self.total();
        if total <= 0.0 {
            return (Verdict::Uncertain, 0.0);
        }
        let ranked = self.ranked();
        let (top, top_weight) = ranked[0];
        let (_, second_weight) = ranked[1];
        if (top_weight - second_weight) / total < epsilon {
            (Verdict::Uncertain, self.uncertain_weight)
        } else {
            (top, top_weight)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_ignored() {
        let mut tally = WeightedTally::default();
        tally.add(Verdict::Error, 5.0);
        assert_eq!(tally.total(), 0.0);
    }

    #[test]
    fn test_clear_winner() {
        let mut tally = WeightedTally::default();
        tally.add(Verdict::True, 1.14);
        tally.add(Verdict::False, 0.285);
        let (winner, weight) = tally.winner(0.05);
        assert_eq!(winner, Verdict::True);
        assert!((weight - 1.14).abs() < 1e-12);
    }

    #[test]
    fn test_near_tie_is_uncertain() {
        let mut tally = WeightedTally::default();
        tally.add(Verdict::True, 0.50);
        tally.add(Verdict::False, 0.48);
        tally.add(Verdict::Uncertain, 0.02);
        let (winner, weight) = tally.winner(0.05);
        assert_eq!(winner, Verdict::Uncertain);
        assert!((weight - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_empty_tally_is_uncertain() {
        assert_eq!(WeightedTally::default().winner(0.05), (Verdict::Uncertain, 0.0));
    }

    #[test]
    fn test_negative_and_nan_weights_ignored() {
        let mut tally = WeightedTally::default();
        tally.add(Verdict::True, -1.0);
        tally.add(Verdict::False, f64::NAN);
        assert_eq!(tally.total(), 0.0);
    }
}
