//! Infrastructure layer for verity
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer, including configuration file loading.

pub mod config;
pub mod gateway;
pub mod metrics;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use gateway::{AgentCommand, CommandEvidenceGateway};
pub use metrics::{ChannelMetricsSink, MetricsSummary};
pub use store::{JsonTrustStore, JsonlResultStore};
