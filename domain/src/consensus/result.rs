//! Consensus outcome types

use super::tally::WeightedTally;
use crate::agent::AgentId;
use crate::result::ReasoningStep;
use crate::verdict::{AgentVerdict, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a consensus pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStatus {
    /// A category won with a clear margin
    Decided,
    /// The top two categories were within epsilon; verdict is UNCERTAIN
    Tied,
    /// No usable verdict: every contribution was an error (or there were none)
    Unresolved,
}

impl fmt::Display for ConsensusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusStatus::Decided => write!(f, "decided"),
            ConsensusStatus::Tied => write!(f, "tied"),
            ConsensusStatus::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Weight one verdict contributed to the tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteContribution {
    pub agent_id: AgentId,
    pub verdict: Verdict,
    pub trust: f64,
    pub confidence: f64,
    pub weight: f64,
    /// Down-weighted as a Byzantine outlier
    pub penalized: bool,
}

/// Result of one consensus pass. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub verdict: Verdict,
    /// Winning weight / total non-error weight
    pub confidence: f64,
    pub status: ConsensusStatus,
    pub tally: WeightedTally,
    pub contributions: Vec<VoteContribution>,
    /// The verdicts this pass was computed from, in input order
    pub verdicts: Vec<AgentVerdict>,
    pub reasoning: Vec<ReasoningStep>,
    /// Low confidence with disagreeing agents: should go to debate
    pub needs_escalation: bool,
}

impl ConsensusResult {
    pub fn is_decided(&self) -> bool {
        self.status == ConsensusStatus::Decided
    }

    pub fn is_unresolved(&self) -> bool {
        self.status == ConsensusStatus::Unresolved
    }

    /// Verdicts that are not errors
    pub fn usable_verdicts(&self) -> impl Iterator<Item = &AgentVerdict> {
        self.verdicts.iter().filter(|v| !v.is_error())
    }

    pub fn contribution_of(&self, agent_id: &AgentId) -> Option<&VoteContribution> {
        self.contributions.iter().find(|c| &c.agent_id == agent_id)
    }

    /// Visual vote summary, e.g. `[TTF?x]`
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        for v in &self.verdicts {
            summary.push(match v.verdict {
                Verdict::True => 'T',
                Verdict::False => 'F',
                Verdict::Uncertain => '?',
                Verdict::Error => 'x',
            });
        }
        summary.push(']');
        summary
    }
}
