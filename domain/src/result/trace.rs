//! Reasoning trace entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of step recorded in a reasoning trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Selection,
    AgentVerdict,
    AgentTimeout,
    GatewayFailure,
    SourceRequirement,
    FastPath,
    ByzantinePenalty,
    Tally,
    Consensus,
    ConsensusUnresolved,
    Escalation,
    DebateRound,
    DebateForfeit,
    Moderation,
    DebateSkipped,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Selection => "Selection",
            StepKind::AgentVerdict => "AgentVerdict",
            StepKind::AgentTimeout => "AgentTimeout",
            StepKind::GatewayFailure => "GatewayFailure",
            StepKind::SourceRequirement => "SourceRequirement",
            StepKind::FastPath => "FastPath",
            StepKind::ByzantinePenalty => "ByzantinePenalty",
            StepKind::Tally => "Tally",
            StepKind::Consensus => "Consensus",
            StepKind::ConsensusUnresolved => "ConsensusUnresolved",
            StepKind::Escalation => "Escalation",
            StepKind::DebateRound => "DebateRound",
            StepKind::DebateForfeit => "DebateForfeit",
            StepKind::Moderation => "Moderation",
            StepKind::DebateSkipped => "DebateSkipped",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step in the ordered reasoning trace of a verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub kind: StepKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ReasoningStep {
    pub fn new(kind: StepKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

impl fmt::Display for ReasoningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.description)
    }
}
