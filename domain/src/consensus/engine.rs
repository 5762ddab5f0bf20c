//! Trust-weighted, Byzantine-tolerant verdict aggregation
//!
//! Each verdict weighs `trust × confidence`. Before tallying, a verdict whose
//! confidence lies more than `deviation_sigmas` standard deviations from the
//! agent's own confidence history is multiplied by `byzantine_penalty`. The
//! outlier keeps a vote, but a colluding minority that suddenly reports
//! extreme confidence cannot outweigh the honest majority.

use super::policy::ConsensusPolicy;
use super::result::{ConsensusResult, ConsensusStatus, VoteContribution};
use super::tally::WeightedTally;
use crate::agent::AgentId;
use crate::result::{ReasoningStep, StepKind};
use crate::trust::TrustSnapshot;
use crate::verdict::{AgentFailure, AgentVerdict, Verdict, VerdictRole};
use std::collections::BTreeSet;

/// Pure consensus engine: same verdicts + same snapshot ⇒ same result
#[derive(Debug, Clone, Default)]
pub struct ConsensusEngine {
    policy: ConsensusPolicy,
}

impl ConsensusEngine {
    pub fn new(policy: ConsensusPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    /// Compute the weight one verdict contributes
    pub fn weigh(&self, verdict: &AgentVerdict, trust: &TrustSnapshot) -> VoteContribution {
        let score = trust.score(&verdict.agent_id);
        let mut contribution = VoteContribution {
            agent_id: verdict.agent_id.clone(),
            verdict: verdict.verdict,
            trust: score,
            confidence: verdict.confidence,
            weight: 0.0,
            penalized: false,
        };
        if verdict.is_error() {
            return contribution;
        }

        let mut weight = score * verdict.confidence;
        if verdict.role == VerdictRole::Moderator {
            weight *= self.policy.moderator_weight.max(0.0);
        }

        let deviation = trust.get(&verdict.agent_id).and_then(|t| {
            t.confidence.z_score(
                verdict.confidence,
                self.policy.min_history,
                self.policy.min_std_dev,
            )
        });
        if let Some(z) = deviation
            && z > self.policy.deviation_sigmas
        {
            weight *= self.policy.byzantine_penalty.clamp(0.0, 1.0);
            contribution.penalized = true;
        }

        contribution.weight = weight;
        contribution
    }

    /// Combine verdicts into one consensus result
    pub fn resolve(&self, verdicts: &[AgentVerdict], trust: &TrustSnapshot) -> ConsensusResult {
        let mut reasoning = Vec::new();
        let mut tally = WeightedTally::default();
        let mut contributions = Vec::with_capacity(verdicts.len());

        for verdict in verdicts {
            let contribution = self.weigh(verdict, trust);

            if let Some(failure) = &verdict.failure {
                let kind = match failure {
                    AgentFailure::AgentTimeout => StepKind::AgentTimeout,
                    AgentFailure::GatewayFailure(_) => StepKind::GatewayFailure,
                };
                reasoning.push(
                    ReasoningStep::new(
                        kind,
                        format!("{} produced no verdict: {}", verdict.agent_id, failure),
                    )
                    .with_meta("agent", &verdict.agent_id)
                    .with_meta("latency_ms", verdict.latency_ms),
                );
            } else if contribution.penalized {
                reasoning.push(
                    ReasoningStep::new(
                        StepKind::ByzantinePenalty,
                        format!(
                            "{} reported confidence {:.2} far outside its history; weight reduced to {:.3}",
                            verdict.agent_id, verdict.confidence, contribution.weight
                        ),
                    )
                    .with_meta("agent", &verdict.agent_id),
                );
            }

            tally.add(verdict.verdict, contribution.weight);
            contributions.push(contribution);
        }

        let usable: Vec<&AgentVerdict> = verdicts.iter().filter(|v| !v.is_error()).collect();
        if usable.is_empty() {
            reasoning.push(
                ReasoningStep::new(
                    StepKind::ConsensusUnresolved,
                    format!(
                        "No agent produced usable evidence ({} of {} failed)",
                        verdicts.len(),
                        verdicts.len()
                    ),
                )
                .with_meta("failed", verdicts.len()),
            );
            return ConsensusResult {
                verdict: Verdict::Uncertain,
                confidence: 0.0,
                status: ConsensusStatus::Unresolved,
                tally,
                contributions,
                verdicts: verdicts.to_vec(),
                reasoning,
                needs_escalation: false,
            };
        }

        reasoning.push(
            ReasoningStep::new(
                StepKind::Tally,
                format!(
                    "Weighted tally TRUE={:.3} FALSE={:.3} UNCERTAIN={:.3}",
                    tally.true_weight, tally.false_weight, tally.uncertain_weight
                ),
            )
            .with_meta("true", format!("{:.4}", tally.true_weight))
            .with_meta("false", format!("{:.4}", tally.false_weight))
            .with_meta("uncertain", format!("{:.4}", tally.uncertain_weight)),
        );

        let total = tally.total();
        let tied = self.is_tie(&tally);
        let (verdict, winning_weight) = tally.winner(self.policy.tie_epsilon);
        let confidence = if total > 0.0 {
            (winning_weight / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let status = if tied {
            ConsensusStatus::Tied
        } else {
            ConsensusStatus::Decided
        };

        let categories: BTreeSet<Verdict> = usable.iter().map(|v| v.verdict).collect();
        let needs_escalation =
            confidence < self.policy.escalation_threshold && categories.len() >= 2;

        reasoning.push(
            ReasoningStep::new(
                StepKind::Consensus,
                format!(
                    "Consensus {} with confidence {:.2} ({}, {} usable of {} verdicts)",
                    verdict,
                    confidence,
                    status,
                    usable.len(),
                    verdicts.len()
                ),
            )
            .with_meta("verdict", verdict)
            .with_meta("confidence", format!("{:.4}", confidence)),
        );

        ConsensusResult {
            verdict,
            confidence,
            status,
            tally,
            contributions,
            verdicts: verdicts.to_vec(),
            reasoning,
            needs_escalation,
        }
    }

    fn is_tie(&self, tally: &WeightedTally) -> bool {
        let total = tally.total();
        if total <= 0.0 {
            return true;
        }
        let ranked = tally.ranked();
        (ranked[0].1 - ranked[1].1) / total < self.policy.tie_epsilon
    }

    /// Upper bound on the weight the given agents could still add.
    ///
    /// Confidence is at most 1.0 and the Byzantine penalty only reduces
    /// weight, so each pending panelist contributes at most its trust.
    pub fn pending_weight_bound(&self, pending: &[AgentId], trust: &TrustSnapshot) -> f64 {
        pending.iter().map(|id| trust.score(id)).sum()
    }

    /// Whether a partial result is certain enough to stop waiting.
    ///
    /// Requires the partial confidence to reach `certainty` *and* the winner to
    /// keep a margin of at least `tie_epsilon` even if all of `pending_bound`
    /// went to the strongest competing category. The second condition makes
    /// the early answer's category identical to the one a full wait would give.
    pub fn is_settled(&self, partial: &ConsensusResult, pending_bound: f64, certainty: f64) -> bool {
        if !partial.is_decided() || partial.confidence < certainty {
            return false;
        }
        let tally = &partial.tally;
        let winner_weight = tally.weight_of(partial.verdict);
        let strongest_other = tally
            .ranked()
            .iter()
            .filter(|(v, _)| *v != partial.verdict)
            .map(|(_, w)| *w)
            .fold(0.0, f64::max);

        let pending_bound = pending_bound.max(0.0);
        let denominator = tally.total() + pending_bound;
        if denominator <= 0.0 {
            return false;
        }
        let margin = (winner_weight - strongest_other - pending_bound) / denominator;
        margin > 0.0 && margin >= self.policy.tie_epsilon
    }
}
