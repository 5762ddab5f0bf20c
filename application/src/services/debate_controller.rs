//! Adversarial debate controller
//!
//! Drives a [`DebateSession`] through its rounds against the evidence
//! gateway, then re-resolves consensus with the moderator's ruling added.

use crate::config::DebateParams;
use crate::ports::evidence_gateway::{DebateBrief, EvidenceGateway, GatewayError, ModerationBrief};
use crate::ports::progress::VerificationProgress;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use verity_domain::{
    AgentId, AgentVerdict, Argument, ConsensusEngine, ConsensusResult, DebateRole, DebateRoles,
    DebateSession, DebateSummary, DomainError, ReasoningStep, RoundEntry, StepKind, TrustSnapshot,
    VerificationRequest,
};

/// Result of an escalation
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    /// Second consensus pass, or the original result when the debate was skipped
    pub result: ConsensusResult,
    pub summary: Option<DebateSummary>,
    /// Debate steps, in order, for the reasoning trace
    pub trace: Vec<ReasoningStep>,
}

pub struct DebateController {
    gateway: Arc<dyn EvidenceGateway>,
    engine: ConsensusEngine,
    params: DebateParams,
}

impl DebateController {
    pub fn new(gateway: Arc<dyn EvidenceGateway>, engine: ConsensusEngine, params: DebateParams) -> Self {
        Self {
            gateway,
            engine,
            params,
        }
    }

    pub fn params(&self) -> &DebateParams {
        &self.params
    }

    /// Budget for the next gateway call, bounded by the request deadline
    fn call_budget(&self, deadline: Instant) -> Duration {
        self.params
            .round_timeout
            .min(deadline.saturating_duration_since(Instant::now()))
    }

    /// Run a debate over a contested consensus.
    ///
    /// `roster` lists the agents that may moderate. Errors only arise from an
    /// invalid session transition; the caller keeps the original result then.
    pub async fn run(
        &self,
        request: &VerificationRequest,
        initial: &ConsensusResult,
        trust: &TrustSnapshot,
        roster: &[AgentId],
        deadline: Instant,
        progress: &dyn VerificationProgress,
    ) -> Result<DebateOutcome, DomainError> {
        let mut trace = Vec::new();

        let roles = match DebateRoles::assign(&initial.verdicts, trust, roster) {
            Ok(roles) => roles,
            Err(reason) => {
                info!("Debate skipped: {}", reason);
                trace.push(ReasoningStep::new(
                    StepKind::DebateSkipped,
                    format!("Debate skipped: {}", reason),
                ));
                return Ok(DebateOutcome {
                    result: initial.clone(),
                    summary: None,
                    trace,
                });
            }
        };

        info!(
            "Debate opened: defender={}, prosecutor={}, moderator={}",
            roles.defender, roles.prosecutor, roles.moderator
        );
        progress.on_debate_start(&roles);

        let mut session = DebateSession::open(request.id().clone(), roles, self.params.max_rounds);
        let claim = request.claim().text().to_string();

        while let Some(round) = session.begin_round()? {
            let brief = |role: DebateRole| DebateBrief {
                agent_id: session.roles().agent_for(role).clone(),
                role,
                claim: claim.clone(),
                round,
                max_rounds: session.max_rounds(),
                rebut: role
                    .opponent()
                    .and_then(|opponent| session.last_argument(opponent))
                    .cloned(),
            };
            let prosecution_brief = brief(DebateRole::Prosecutor);
            let defense_brief = brief(DebateRole::Defender);

            let budget = self.call_budget(deadline);
            let (prosecution, defense) = tokio::join!(
                self.argue(&prosecution_brief, budget),
                self.argue(&defense_brief, budget),
            );

            for entry in [&prosecution, &defense] {
                trace.push(round_step(round, entry));
            }
            session.record_round(prosecution, defense)?;
            if let Some(recorded) = session.rounds().last() {
                progress.on_debate_round(recorded);
            }
        }

        let ruling = self.moderate(request, initial, &session, deadline).await;
        match &ruling {
            Some(verdict) => trace.push(
                ReasoningStep::new(
                    StepKind::Moderation,
                    format!(
                        "Moderator {} ruled {} with confidence {:.2}",
                        verdict.agent_id, verdict.verdict, verdict.confidence
                    ),
                )
                .with_meta("agent", &verdict.agent_id),
            ),
            None => trace.push(
                ReasoningStep::new(
                    StepKind::Moderation,
                    format!(
                        "Moderator {} unavailable; re-resolving without a ruling",
                        session.roles().moderator
                    ),
                )
                .with_meta("agent", &session.roles().moderator),
            ),
        }
        session.conclude(ruling)?;

        let mut verdicts = initial.verdicts.clone();
        if let Some(ruling) = session.ruling() {
            verdicts.push(ruling.clone());
        }
        let mut result = self.engine.resolve(&verdicts, trust);
        // The second pass is final
        result.needs_escalation = false;

        let summary = session.summary();
        info!(
            "Debate resolved after {} rounds: {} ({:.2})",
            summary.rounds, result.verdict, result.confidence
        );

        Ok(DebateOutcome {
            result,
            summary: Some(summary),
            trace,
        })
    }

    async fn argue(&self, brief: &DebateBrief, budget: Duration) -> RoundEntry {
        let forfeit = |reason: String| {
            warn!("{} {} forfeits round {}: {}", brief.role, brief.agent_id, brief.round, reason);
            RoundEntry::Forfeit {
                agent_id: brief.agent_id.clone(),
                reason,
            }
        };

        match tokio::time::timeout(budget, self.gateway.argue(brief)).await {
            Ok(Ok(argument)) => RoundEntry::Argued(Argument {
                agent_id: brief.agent_id.clone(),
                role: brief.role,
                ..argument
            }),
            Ok(Err(e)) => forfeit(e.to_string()),
            Err(_) => forfeit(GatewayError::Timeout.to_string()),
        }
    }

    async fn moderate(
        &self,
        request: &VerificationRequest,
        initial: &ConsensusResult,
        session: &DebateSession,
        deadline: Instant,
    ) -> Option<AgentVerdict> {
        let moderator = session.roles().moderator.clone();
        let brief = ModerationBrief {
            agent_id: moderator.clone(),
            claim: request.claim().text().to_string(),
            rounds: session.rounds().to_vec(),
            prior_verdict: initial.verdict,
            prior_confidence: initial.confidence,
        };

        let budget = self.call_budget(deadline);
        let started = Instant::now();
        match tokio::time::timeout(budget, self.gateway.moderate(&brief)).await {
            Ok(Ok(verdict)) if !verdict.is_error() => {
                let mut verdict = AgentVerdict {
                    agent_id: moderator,
                    latency_ms: started.elapsed().as_millis() as u64,
                    ..verdict
                };
                if request.require_sources() && verdict.demote_if_unsourced() {
                    info!("Moderator ruling cites no sources; demoted to UNCERTAIN");
                }
                Some(verdict)
            }
            Ok(Ok(_)) => {
                warn!("Moderator {} returned an error verdict", moderator);
                None
            }
            Ok(Err(e)) => {
                warn!("Moderator {} failed: {}", moderator, e);
                None
            }
            Err(_) => {
                warn!("Moderator {} timed out", moderator);
                None
            }
        }
    }
}

fn round_step(round: usize, entry: &RoundEntry) -> ReasoningStep {
    match entry {
        RoundEntry::Argued(argument) => ReasoningStep::new(
            StepKind::DebateRound,
            format!(
                "Round {}: {} {} argued: {}",
                round, argument.role, argument.agent_id, argument.content
            ),
        )
        .with_meta("round", round)
        .with_meta("role", argument.role),
        RoundEntry::Forfeit { agent_id, reason } => ReasoningStep::new(
            StepKind::DebateForfeit,
            format!("Round {}: {} forfeited: {}", round, agent_id, reason),
        )
        .with_meta("round", round)
        .with_meta("agent", agent_id),
    }
}
