//! Domain layer for verity
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure, presentation, or an async runtime.
//!
//! # Core Concepts
//!
//! ## Verification
//!
//! A claim is dispatched to several specialized agents. Each returns an
//! [`AgentVerdict`]; the [`ConsensusEngine`] combines them, weighting every
//! verdict by the agent's trust and its own confidence.
//!
//! ## Trust
//!
//! Agents earn trust by agreeing with decided consensus outcomes
//! ([`TrustRecord`]). Trust decays toward a neutral prior when idle.
//!
//! ## Debate
//!
//! Contested, low-confidence results escalate to a bounded
//! [`DebateSession`] between a Defender and a Prosecutor, ruled on by a
//! Moderator.

pub mod agent;
pub mod claim;
pub mod consensus;
pub mod core;
pub mod debate;
pub mod result;
pub mod trust;
pub mod verdict;

// Re-export commonly used types
pub use agent::{
    Agent, AgentId, Capability, HealthStatus, NEUTRAL_TRUST, SelectionPolicy, select_agents,
};
pub use claim::{
    Claim, MAX_CLAIM_CHARS, MAX_CONTEXT_CHARS, Priority, RequestId, VerificationRequest,
    infer_domain,
};
pub use consensus::{
    ConsensusEngine, ConsensusPolicy, ConsensusResult, ConsensusStatus, VoteContribution,
    WeightedTally,
};
pub use core::{
    clock::current_timestamp,
    error::DomainError,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use debate::{
    Argument, ArgumentRound, DebatePhase, DebateRole, DebateRoles, DebateSession, DebateSummary,
    RoundEntry, SkipReason, TerminationReason,
};
pub use result::{
    ReasoningStep, StepKind, VerificationMetadata, VerificationResult, merge_evidence,
};
pub use trust::{AgentTrust, ConfidenceStats, TrustPolicy, TrustRecord, TrustSnapshot};
pub use verdict::{AgentFailure, AgentVerdict, Evidence, Verdict, VerdictRole};
