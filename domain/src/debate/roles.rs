//! Debate role assignment

use crate::agent::AgentId;
use crate::trust::TrustSnapshot;
use crate::verdict::{AgentVerdict, Verdict};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Role an agent plays in a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebateRole {
    /// Argues the claim is FALSE
    Prosecutor,
    /// Argues the claim is TRUE
    Defender,
    /// Weighs both sides and rules
    Moderator,
}

impl DebateRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebateRole::Prosecutor => "prosecutor",
            DebateRole::Defender => "defender",
            DebateRole::Moderator => "moderator",
        }
    }

    /// Position this role argues for (the moderator argues none)
    pub fn position(&self) -> Option<Verdict> {
        match self {
            DebateRole::Prosecutor => Some(Verdict::False),
            DebateRole::Defender => Some(Verdict::True),
            DebateRole::Moderator => None,
        }
    }

    /// The side arguing against this one
    pub fn opponent(&self) -> Option<DebateRole> {
        match self {
            DebateRole::Prosecutor => Some(DebateRole::Defender),
            DebateRole::Defender => Some(DebateRole::Prosecutor),
            DebateRole::Moderator => None,
        }
    }
}

impl fmt::Display for DebateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a debate could not be opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two agents with different stances
    NoOpposingSides,
    /// Every eligible agent is already arguing
    NoModerator,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoOpposingSides => write!(f, "no two agents hold opposing stances"),
            SkipReason::NoModerator => write!(f, "no agent is free to moderate"),
        }
    }
}

/// Agents assigned to one debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateRoles {
    pub prosecutor: AgentId,
    pub defender: AgentId,
    pub moderator: AgentId,
}

impl DebateRoles {
    /// Pick the two most disagreeing agents and a moderator.
    ///
    /// The defender holds the highest signed stance (polarity × confidence),
    /// the prosecutor the lowest. The moderator is the highest-trust agent
    /// in `roster` that did not cast a verdict; failing that, the highest-trust
    /// roster agent other than the two debaters. Ties break on trust, then id.
    pub fn assign(
        verdicts: &[AgentVerdict],
        trust: &TrustSnapshot,
        roster: &[AgentId],
    ) -> Result<Self, SkipReason> {
        let usable: Vec<&AgentVerdict> = verdicts.iter().filter(|v| !v.is_error()).collect();

        let by_stance = |a: &&AgentVerdict, b: &&AgentVerdict| -> Ordering {
            a.stance()
                .total_cmp(&b.stance())
                .then_with(|| trust.score(&a.agent_id).total_cmp(&trust.score(&b.agent_id)))
                .then_with(|| b.agent_id.cmp(&a.agent_id))
        };
        let defender = usable.iter().copied().max_by(by_stance);
        // Lowest stance wins; among equals, higher trust then lower id
        let prosecutor = usable.iter().copied().min_by(|a, b| {
            a.stance()
                .total_cmp(&b.stance())
                .then_with(|| trust.score(&b.agent_id).total_cmp(&trust.score(&a.agent_id)))
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });

        let (defender, prosecutor) = match (defender, prosecutor) {
            (Some(d), Some(p)) if d.agent_id != p.agent_id && d.stance() > p.stance() => (d, p),
            _ => return Err(SkipReason::NoOpposingSides),
        };

        let debaters = [&defender.agent_id, &prosecutor.agent_id];
        let cast: Vec<&AgentId> = verdicts.iter().map(|v| &v.agent_id).collect();

        let best = |candidates: Vec<&AgentId>| -> Option<AgentId> {
            candidates
                .into_iter()
                .max_by(|a, b| {
                    trust
                        .score(a)
                        .total_cmp(&trust.score(b))
                        .then_with(|| b.cmp(a))
                })
                .cloned()
        };

        let uninvolved: Vec<&AgentId> = roster
            .iter()
            .filter(|id| !debaters.contains(id) && !cast.contains(id))
            .collect();
        let moderator = best(uninvolved).or_else(|| {
            best(
                roster
                    .iter()
                    .filter(|id| !debaters.contains(id))
                    .collect(),
            )
        });

        match moderator {
            Some(moderator) => Ok(Self {
                prosecutor: prosecutor.agent_id.clone(),
                defender: defender.agent_id.clone(),
                moderator,
            }),
            None => Err(SkipReason::NoModerator),
        }
    }

    pub fn agent_for(&self, role: DebateRole) -> &AgentId {
        match role {
            DebateRole::Prosecutor => &self.prosecutor,
            DebateRole::Defender => &self.defender,
            DebateRole::Moderator => &self.moderator,
        }
    }
}
