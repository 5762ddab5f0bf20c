//! Final verification result

use super::trace::ReasoningStep;
use crate::claim::{RequestId, VerificationRequest};
use crate::consensus::{ConsensusResult, ConsensusStatus};
use crate::core::clock::current_timestamp;
use crate::debate::DebateSummary;
use crate::verdict::{AgentVerdict, Evidence, Verdict};
use serde::{Deserialize, Serialize};

/// Per-request execution facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationMetadata {
    pub agents_dispatched: usize,
    /// Agents that returned a usable (non-error) verdict
    pub agents_responded: usize,
    /// Remaining tasks were cancelled after an early quorum
    pub fast_path: bool,
    pub escalated: bool,
    pub debate_rounds: usize,
    pub elapsed_ms: u64,
}

/// The answer to a [`VerificationRequest`]. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub request_id: RequestId,
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub status: ConsensusStatus,
    /// Ordered trace from agent selection to the final consensus
    pub reasoning: Vec<ReasoningStep>,
    pub evidence: Vec<Evidence>,
    /// Distinct sources cited across all evidence, in first-seen order
    pub sources: Vec<String>,
    pub agent_verdicts: Vec<AgentVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debate: Option<DebateSummary>,
    pub metadata: VerificationMetadata,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl VerificationResult {
    /// Build the result from the consensus that decided it.
    ///
    /// `reasoning` is the full trace; evidence and sources are merged from the
    /// consensus verdicts.
    pub fn assemble(
        request: &VerificationRequest,
        consensus: &ConsensusResult,
        reasoning: Vec<ReasoningStep>,
        debate: Option<DebateSummary>,
        metadata: VerificationMetadata,
    ) -> Self {
        let evidence = merge_evidence(&consensus.verdicts);
        let mut sources: Vec<String> = Vec::new();
        for source in evidence.iter().filter_map(|e| e.source.as_ref()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        Self {
            request_id: request.id().clone(),
            claim: request.claim().text().to_string(),
            verdict: consensus.verdict,
            confidence: consensus.confidence,
            status: consensus.status,
            reasoning,
            evidence,
            sources,
            agent_verdicts: consensus.verdicts.clone(),
            debate,
            metadata,
            timestamp: current_timestamp(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.status == ConsensusStatus::Unresolved
    }
}

/// Evidence from all usable verdicts with exact duplicates removed
pub fn merge_evidence(verdicts: &[AgentVerdict]) -> Vec<Evidence> {
    let mut merged: Vec<Evidence> = Vec::new();
    for evidence in verdicts
        .iter()
        .filter(|v| !v.is_error())
        .flat_map(|v| v.evidence.iter())
    {
        let summary = evidence.summary.trim();
        let duplicate = merged
            .iter()
            .any(|e| e.summary.trim() == summary && e.source == evidence.source);
        if !duplicate && !summary.is_empty() {
            merged.push(evidence.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::Priority;
    use crate::consensus::ConsensusEngine;
    use crate::trust::TrustSnapshot;
    use std::time::Duration;

    #[test]
    fn test_merge_evidence_dedupes() {
        let verdicts = vec![
            AgentVerdict::new("a", Verdict::True, 0.9).with_evidence(vec![
                Evidence::new("NASA data").with_source("https://nasa.gov"),
                Evidence::new("  "),
            ]),
            AgentVerdict::new("b", Verdict::True, 0.8).with_evidence(vec![
                Evidence::new("NASA data ").with_source("https://nasa.gov"),
                Evidence::new("NASA data"),
            ]),
        ];
        let merged = merge_evidence(&verdicts);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_assemble_collects_sources() {
        let request = VerificationRequest::new(
            "Water boils at 100C at sea level",
            None,
            Priority::Normal,
            true,
            Duration::from_secs(5),
        )
        .unwrap();
        let verdicts = vec![
            AgentVerdict::new("a", Verdict::True, 0.9).with_evidence(vec![
                Evidence::new("Physics handbook").with_source("https://a.example"),
            ]),
            AgentVerdict::new("b", Verdict::True, 0.8).with_evidence(vec![
                Evidence::new("Encyclopedia").with_source("https://a.example"),
                Evidence::new("Lab notes").with_source("https://b.example"),
            ]),
        ];
        let consensus = ConsensusEngine::default().resolve(&verdicts, &TrustSnapshot::new());
        let result = VerificationResult::assemble(
            &request,
            &consensus,
            consensus.reasoning.clone(),
            None,
            VerificationMetadata::default(),
        );

        assert_eq!(result.verdict, Verdict::True);
        assert_eq!(result.sources, vec!["https://a.example", "https://b.example"]);
        assert_eq!(result.evidence.len(), 3);
        assert_eq!(result.request_id, *request.id());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "TRUE");
        assert!(json.get("debate").is_none());
    }
}
