//! Application layer for verity
//!
//! This crate contains use cases, port definitions, stateful services and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DebateParams, EngineConfig, TrustParams, VerifyParams};
pub use ports::{
    evidence_gateway::{
        DebateBrief, EvaluationRequest, EvidenceGateway, GatewayError, ModerationBrief,
    },
    metrics::{MetricEvent, MetricsSink, NoMetrics},
    persistence::{NoPersistence, ResultStore, StoreError, TrustStore},
    progress::{NoProgress, VerificationProgress},
};
pub use services::{
    debate_controller::{DebateController, DebateOutcome},
    registry::{AgentRegistry, AgentStatus, RegistryError},
    trust_manager::TrustManager,
};
pub use use_cases::agent_status::AgentStatusUseCase;
pub use use_cases::verify_claim::{VerifyClaimInput, VerifyClaimUseCase, VerifyError};
