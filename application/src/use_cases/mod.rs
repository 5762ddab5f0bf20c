//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_status;
pub mod verify_claim;
