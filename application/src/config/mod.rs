//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`VerifyParams`]: dispatch, deadlines and backpressure
//! - [`TrustParams`]: reputation model and its timing
//! - [`DebateParams`]: escalation rounds and timeouts
//! - [`EngineConfig`]: container handed to the composition root

pub mod debate_params;
pub mod engine_config;
pub mod trust_params;
pub mod verify_params;

pub use debate_params::DebateParams;
pub use engine_config::EngineConfig;
pub use trust_params::TrustParams;
pub use verify_params::VerifyParams;
