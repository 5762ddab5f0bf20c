//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod evidence_gateway;
pub mod metrics;
pub mod persistence;
pub mod progress;
