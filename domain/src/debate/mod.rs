//! Adversarial debate
//!
//! Contested claims are argued by a Defender (TRUE) and a Prosecutor (FALSE)
//! for a bounded number of rounds, then a Moderator rules. The ruling joins a
//! second consensus pass with extra weight.

pub mod roles;
pub mod session;

pub use roles::{DebateRole, DebateRoles, SkipReason};
pub use session::{
    Argument, ArgumentRound, DebatePhase, DebateSession, DebateSummary, RoundEntry,
    TerminationReason,
};
