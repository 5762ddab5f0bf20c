//! Port for operational metrics.
//!
//! [`MetricsSink::record`] is synchronous and non-fallible: adapters must
//! never block the caller, and dropping an event under load is acceptable.

use verity_domain::{AgentId, Verdict};

/// A single metrics observation
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    /// One agent task finished (or failed)
    AgentLatency {
        agent_id: AgentId,
        latency_ms: u64,
        success: bool,
    },
    /// Final consensus of a request
    ConsensusConfidence { verdict: Verdict, confidence: f64 },
    /// A request was escalated to debate
    Escalation,
    /// Remaining tasks were cancelled after an early quorum
    FastPath { cancelled: usize },
    /// A request was rejected for lack of capacity
    Overloaded,
    /// A store write failed
    PersistenceFailure { store: &'static str },
}

impl MetricEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::AgentLatency { .. } => "agent_latency",
            MetricEvent::ConsensusConfidence { .. } => "consensus_confidence",
            MetricEvent::Escalation => "escalation",
            MetricEvent::FastPath { .. } => "fast_path",
            MetricEvent::Overloaded => "overloaded",
            MetricEvent::PersistenceFailure { .. } => "persistence_failure",
        }
    }
}

/// Fire-and-forget metrics sink
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricEvent);
}

/// No-op implementation for tests and when metrics are disabled.
pub struct NoMetrics;

impl MetricsSink for NoMetrics {
    fn record(&self, _event: MetricEvent) {}
}
