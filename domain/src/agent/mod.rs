//! Verification agents
//!
//! - [`Agent`]: a claim-evaluation worker with capabilities, health and trust
//! - [`select_agents`]: pure, deterministic dispatch selection

pub mod entities;
pub mod selection;
pub mod value_objects;

pub use entities::{Agent, NEUTRAL_TRUST};
pub use selection::{SelectionPolicy, select_agents};
pub use value_objects::{AgentId, Capability, HealthStatus};
