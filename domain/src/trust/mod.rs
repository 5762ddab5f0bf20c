//! Agent reputation
//!
//! - [`TrustRecord`]: per-agent running accuracy estimate and confidence history
//! - [`TrustPolicy`]: EMA learning rate, decay and flap penalty parameters
//! - [`TrustSnapshot`]: immutable view used by consensus weighting

pub mod record;
pub mod snapshot;
pub mod stats;

pub use record::{TrustPolicy, TrustRecord};
pub use snapshot::{AgentTrust, TrustSnapshot};
pub use stats::ConfidenceStats;
