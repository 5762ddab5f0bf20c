//! Debate state machine
//!
//! ```text
//! Opened ──▶ Arguing(1) ──▶ … ──▶ Arguing(max) ──▶ Moderating ──▶ Resolved
//!               │                      ▲               ▲
//!               └──── forfeit ─────────┴───────────────┘
//! ```
//!
//! The session is plain data: the application layer drives it through
//! [`DebateSession::begin_round`], [`DebateSession::record_round`] and
//! [`DebateSession::conclude`], and every call validates the transition.

use super::roles::{DebateRole, DebateRoles};
use crate::agent::AgentId;
use crate::claim::RequestId;
use crate::core::error::DomainError;
use crate::verdict::{AgentVerdict, Evidence, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side's contribution to a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub agent_id: AgentId,
    pub role: DebateRole,
    pub content: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl Argument {
    pub fn new(agent_id: impl Into<AgentId>, role: DebateRole, content: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            content: content.into(),
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// What a side produced in a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundEntry {
    Argued(Argument),
    /// The side timed out or its gateway failed
    Forfeit { agent_id: AgentId, reason: String },
}

impl RoundEntry {
    pub fn is_forfeit(&self) -> bool {
        matches!(self, RoundEntry::Forfeit { .. })
    }

    pub fn argument(&self) -> Option<&Argument> {
        match self {
            RoundEntry::Argued(argument) => Some(argument),
            RoundEntry::Forfeit { .. } => None,
        }
    }
}

/// Prosecution and defense entries of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentRound {
    /// 1-based round number
    pub round: usize,
    pub prosecution: RoundEntry,
    pub defense: RoundEntry,
}

impl ArgumentRound {
    pub fn entry(&self, role: DebateRole) -> Option<&RoundEntry> {
        match role {
            DebateRole::Prosecutor => Some(&self.prosecution),
            DebateRole::Defender => Some(&self.defense),
            DebateRole::Moderator => None,
        }
    }

    pub fn has_forfeit(&self) -> bool {
        self.prosecution.is_forfeit() || self.defense.is_forfeit()
    }
}

/// Current state of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DebatePhase {
    Opened,
    Arguing { round: usize },
    Moderating,
    Resolved,
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebatePhase::Opened => write!(f, "opened"),
            DebatePhase::Arguing { round } => write!(f, "arguing (round {})", round),
            DebatePhase::Moderating => write!(f, "moderating"),
            DebatePhase::Resolved => write!(f, "resolved"),
        }
    }
}

/// Why argument stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminationReason {
    MaxRoundsReached,
    Forfeit { role: DebateRole },
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::MaxRoundsReached => write!(f, "max rounds reached"),
            TerminationReason::Forfeit { role } => write!(f, "{} forfeited", role),
        }
    }
}

/// An adversarial debate over one contested request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSession {
    request_id: RequestId,
    roles: DebateRoles,
    max_rounds: usize,
    phase: DebatePhase,
    rounds: Vec<ArgumentRound>,
    termination: Option<TerminationReason>,
    ruling: Option<AgentVerdict>,
}

impl DebateSession {
    pub fn open(request_id: RequestId, roles: DebateRoles, max_rounds: usize) -> Self {
        Self {
            request_id,
            roles,
            max_rounds,
            phase: DebatePhase::Opened,
            rounds: Vec::new(),
            termination: None,
            ruling: None,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn roles(&self) -> &DebateRoles {
        &self.roles
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    pub fn rounds(&self) -> &[ArgumentRound] {
        &self.rounds
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// The moderator's verdict, if it answered
    pub fn ruling(&self) -> Option<&AgentVerdict> {
        self.ruling.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == DebatePhase::Resolved
    }

    /// Start the next round.
    ///
    /// Returns the 1-based round number, or `None` once `max_rounds` have
    /// been argued, in which case the session moves to `Moderating`.
    pub fn begin_round(&mut self) -> Result<Option<usize>, DomainError> {
        let next = match self.phase {
            DebatePhase::Opened => 1,
            DebatePhase::Arguing { round } if self.rounds.len() == round => round + 1,
            DebatePhase::Arguing { round } => {
                return Err(DomainError::InvalidTransition(format!(
                    "round {} has not been recorded",
                    round
                )));
            }
            phase => {
                return Err(DomainError::InvalidTransition(format!(
                    "cannot begin a round while {}",
                    phase
                )));
            }
        };

        if next > self.max_rounds {
            self.phase = DebatePhase::Moderating;
            self.termination = Some(TerminationReason::MaxRoundsReached);
            return Ok(None);
        }
        self.phase = DebatePhase::Arguing { round: next };
        Ok(Some(next))
    }

    /// Record both sides of the current round.
    ///
    /// A forfeit on either side moves the session straight to `Moderating`.
    pub fn record_round(
        &mut self,
        prosecution: RoundEntry,
        defense: RoundEntry,
    ) -> Result<(), DomainError> {
        let round = match self.phase {
            DebatePhase::Arguing { round } if self.rounds.len() + 1 == round => round,
            phase => {
                return Err(DomainError::InvalidTransition(format!(
                    "cannot record a round while {}",
                    phase
                )));
            }
        };

        let forfeit = if prosecution.is_forfeit() {
            Some(DebateRole::Prosecutor)
        } else if defense.is_forfeit() {
            Some(DebateRole::Defender)
        } else {
            None
        };

        self.rounds.push(ArgumentRound {
            round,
            prosecution,
            defense,
        });

        if let Some(role) = forfeit {
            self.phase = DebatePhase::Moderating;
            self.termination = Some(TerminationReason::Forfeit { role });
        }
        Ok(())
    }

    /// Close the debate with the moderator's verdict (`None` if it failed)
    pub fn conclude(&mut self, ruling: Option<AgentVerdict>) -> Result<(), DomainError> {
        if self.phase != DebatePhase::Moderating {
            return Err(DomainError::InvalidTransition(format!(
                "cannot conclude while {}",
                self.phase
            )));
        }
        self.ruling = ruling.map(AgentVerdict::as_moderator);
        self.phase = DebatePhase::Resolved;
        Ok(())
    }

    /// Most recent argument made by `role`
    pub fn last_argument(&self, role: DebateRole) -> Option<&Argument> {
        self.rounds
            .iter()
            .rev()
            .filter_map(|r| r.entry(role).and_then(RoundEntry::argument))
            .next()
    }

    /// Compact summary kept on the final result
    pub fn summary(&self) -> DebateSummary {
        DebateSummary {
            prosecutor: self.roles.prosecutor.clone(),
            defender: self.roles.defender.clone(),
            moderator: self.roles.moderator.clone(),
            rounds: self.rounds.len(),
            forfeits: self
                .rounds
                .iter()
                .map(|r| r.prosecution.is_forfeit() as usize + r.defense.is_forfeit() as usize)
                .sum(),
            termination: self.termination,
            ruling: self.ruling.as_ref().map(|r| r.verdict),
        }
    }
}

/// What remains of a debate after the verdict is emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSummary {
    pub prosecutor: AgentId,
    pub defender: AgentId,
    pub moderator: AgentId,
    pub rounds: usize,
    pub forfeits: usize,
    pub termination: Option<TerminationReason>,
    /// `None` when the moderator did not answer
    pub ruling: Option<Verdict>,
}
