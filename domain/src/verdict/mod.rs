//! Verdicts produced by agents
//!
//! A [`Verdict`] is the tagged category an agent assigns to a claim; an
//! [`AgentVerdict`] is one agent's complete answer for one request, including
//! the failure reason when the agent could not answer.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verdict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    False,
    Uncertain,
    /// The agent failed to produce a verdict
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Uncertain => "UNCERTAIN",
            Verdict::Error => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Verdict::Error)
    }

    /// Whether this verdict takes a side on the claim
    pub fn is_decisive(&self) -> bool {
        matches!(self, Verdict::True | Verdict::False)
    }

    /// +1 for TRUE, -1 for FALSE, 0 otherwise
    pub fn polarity(&self) -> f64 {
        match self {
            Verdict::True => 1.0,
            Verdict::False => -1.0,
            Verdict::Uncertain | Verdict::Error => 0.0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRUE" => Ok(Verdict::True),
            "FALSE" => Ok(Verdict::False),
            "UNCERTAIN" | "UNVERIFIED" | "UNKNOWN" => Ok(Verdict::Uncertain),
            "ERROR" => Ok(Verdict::Error),
            other => Err(format!("Unknown verdict: {}", other)),
        }
    }
}

/// A piece of supporting evidence cited by an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evidence {
    /// What the evidence says
    pub summary: String,
    /// Where it comes from (URL, citation, dataset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Evidence {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Why an agent produced an `ERROR` verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum AgentFailure {
    /// The agent did not answer before its task timeout
    AgentTimeout,
    /// The evidence gateway returned an error
    GatewayFailure(String),
}

impl AgentFailure {
    pub fn label(&self) -> &'static str {
        match self {
            AgentFailure::AgentTimeout => "AgentTimeout",
            AgentFailure::GatewayFailure(_) => "GatewayFailure",
        }
    }
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentFailure::AgentTimeout => write!(f, "AgentTimeout"),
            AgentFailure::GatewayFailure(msg) => write!(f, "GatewayFailure: {}", msg),
        }
    }
}

/// Role under which a verdict was cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerdictRole {
    /// Ordinary evaluation from a dispatched agent
    #[default]
    Panelist,
    /// Debate moderator ruling, weighted higher in the second consensus pass
    Moderator,
}

/// One agent's verdict on one request. Immutable once produced.
///
/// # Example
///
/// ```
/// use verity_domain::verdict::{AgentVerdict, Verdict};
///
/// let v = AgentVerdict::new("sci-1", Verdict::True, 1.4);
/// assert_eq!(v.confidence, 1.0); // clamped
///
/// let failed = AgentVerdict::timeout("sci-2", 3000);
/// assert!(failed.verdict.is_error());
/// assert_eq!(failed.confidence, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVerdict {
    pub agent_id: AgentId,
    pub verdict: Verdict,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub reasoning: String,
    /// Time the agent took to answer, in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<AgentFailure>,
    #[serde(default)]
    pub role: VerdictRole,
}

impl AgentVerdict {
    pub fn new(agent_id: impl Into<AgentId>, verdict: Verdict, confidence: f64) -> Self {
        let confidence = if verdict.is_error() || confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            agent_id: agent_id.into(),
            verdict,
            confidence,
            evidence: Vec::new(),
            reasoning: String::new(),
            latency_ms: 0,
            failure: None,
            role: VerdictRole::Panelist,
        }
    }

    /// An `ERROR` verdict for an agent that did not answer in time
    pub fn timeout(agent_id: impl Into<AgentId>, latency_ms: u64) -> Self {
        Self::failed(agent_id, AgentFailure::AgentTimeout, latency_ms)
    }

    /// An `ERROR` verdict for an agent whose gateway call failed
    pub fn gateway_failure(
        agent_id: impl Into<AgentId>,
        message: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self::failed(agent_id, AgentFailure::GatewayFailure(message.into()), latency_ms)
    }

    fn failed(agent_id: impl Into<AgentId>, failure: AgentFailure, latency_ms: u64) -> Self {
        let mut verdict = Self::new(agent_id, Verdict::Error, 0.0);
        verdict.reasoning = failure.to_string();
        verdict.failure = Some(failure);
        verdict.latency_ms = latency_ms;
        verdict
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn as_moderator(mut self) -> Self {
        self.role = VerdictRole::Moderator;
        self
    }

    pub fn is_error(&self) -> bool {
        self.verdict.is_error()
    }

    /// Whether at least one piece of evidence names a source
    pub fn has_sources(&self) -> bool {
        self.evidence.iter().any(|e| e.source.is_some())
    }

    /// Demote an unsourced TRUE/FALSE verdict to UNCERTAIN.
    ///
    /// Applied when the request requires sources. Returns `true` when the
    /// verdict was changed.
    pub fn demote_if_unsourced(&mut self) -> bool {
        if self.verdict.is_decisive() && !self.has_sources() {
            self.verdict = Verdict::Uncertain;
            true
        } else {
            false
        }
    }

    /// Polarity scaled by confidence: +1.0 is a certain TRUE, -1.0 a certain FALSE
    pub fn stance(&self) -> f64 {
        self.verdict.polarity() * self.confidence
    }
}
