//! Evidence gateway port
//!
//! Defines how the application layer asks an agent to evaluate a claim or to
//! take part in a debate. Implementations (adapters) live in the
//! infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use verity_domain::{
    AgentId, AgentVerdict, Argument, ArgumentRound, Capability, DebateRole, Verdict,
};

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent not available: {0}")]
    AgentNotAvailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// One agent's evaluation task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub agent_id: AgentId,
    pub claim: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Capability the agent should apply to this claim
    pub capability: Capability,
    pub require_sources: bool,
}

/// What a debater is asked to argue in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateBrief {
    pub agent_id: AgentId,
    pub role: DebateRole,
    pub claim: String,
    /// 1-based
    pub round: usize,
    pub max_rounds: usize,
    /// The opposing side's latest argument, to be rebutted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebut: Option<Argument>,
}

/// What the moderator is asked to rule on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationBrief {
    pub agent_id: AgentId,
    pub claim: String,
    pub rounds: Vec<ArgumentRound>,
    /// Verdict and confidence of the consensus that escalated
    pub prior_verdict: Verdict,
    pub prior_confidence: f64,
}

/// Gateway to the verification agents
///
/// Every call must be drop-cancellable: the orchestrator enforces timeouts by
/// dropping the future.
#[async_trait]
pub trait EvidenceGateway: Send + Sync {
    /// Ask an agent for its verdict on a claim
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<AgentVerdict, GatewayError>;

    /// Ask a debater for its argument in the current round
    async fn argue(&self, brief: &DebateBrief) -> Result<Argument, GatewayError>;

    /// Ask the moderator for a ruling after the rounds are over
    async fn moderate(&self, brief: &ModerationBrief) -> Result<AgentVerdict, GatewayError>;
}
