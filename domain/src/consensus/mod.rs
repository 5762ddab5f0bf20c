//! Trust-weighted consensus
//!
//! ```text
//! verdicts ──▶ weigh (trust × confidence, Byzantine penalty, moderator ×)
//!          ──▶ WeightedTally { TRUE, FALSE, UNCERTAIN }
//!          ──▶ winner (tie within epsilon ⇒ UNCERTAIN)
//!          ──▶ ConsensusResult { confidence, needs_escalation, reasoning }
//! ```

pub mod engine;
pub mod policy;
pub mod result;
pub mod tally;

pub use engine::ConsensusEngine;
pub use policy::ConsensusPolicy;
pub use result::{ConsensusResult, ConsensusStatus, VoteContribution};
pub use tally::WeightedTally;
