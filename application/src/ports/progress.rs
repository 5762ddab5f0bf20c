//! Progress notification port
//!
//! Defines the interface for reporting progress during a verification.

use verity_domain::{AgentId, AgentVerdict, ArgumentRound, ConsensusResult, DebateRoles};

/// Callback for progress updates during a verification
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait VerificationProgress: Send + Sync {
    /// Called once the agents are selected and their tasks dispatched
    fn on_dispatch(&self, agents: &[AgentId]);

    /// Called as each agent's verdict (or failure) arrives
    fn on_agent_complete(&self, verdict: &AgentVerdict);

    /// Called after each consensus pass
    fn on_consensus(&self, result: &ConsensusResult);

    // ==================== Optional Callbacks ====================

    /// Called when outstanding tasks are cancelled after an early quorum
    fn on_fast_path(&self, _cancelled: usize) {}

    /// Called when a contested result escalates to debate
    fn on_debate_start(&self, _roles: &DebateRoles) {}

    /// Called after each recorded debate round
    fn on_debate_round(&self, _round: &ArgumentRound) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl VerificationProgress for NoProgress {
    fn on_dispatch(&self, _agents: &[AgentId]) {}
    fn on_agent_complete(&self, _verdict: &AgentVerdict) {}
    fn on_consensus(&self, _result: &ConsensusResult) {}
}
