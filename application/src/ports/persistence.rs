//! Persistence ports
//!
//! Both stores are eventually consistent. A failed save is logged and
//! reported through metrics but never fails a verification.

use async_trait::async_trait;
use thiserror::Error;
use verity_domain::{AgentId, TrustRecord, VerificationResult};

/// Errors raised by store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Sink for finished verification results
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save_result(&self, result: &VerificationResult) -> Result<(), StoreError>;
}

/// Durable trust records
#[async_trait]
pub trait TrustStore: Send + Sync {
    async fn load_trust_record(&self, agent_id: &AgentId)
    -> Result<Option<TrustRecord>, StoreError>;

    async fn save_trust_record(&self, record: &TrustRecord) -> Result<(), StoreError>;
}

/// No-op store for tests and when persistence is disabled
pub struct NoPersistence;

#[async_trait]
impl ResultStore for NoPersistence {
    async fn save_result(&self, _result: &VerificationResult) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl TrustStore for NoPersistence {
    async fn load_trust_record(
        &self,
        _agent_id: &AgentId,
    ) -> Result<Option<TrustRecord>, StoreError> {
        Ok(None)
    }

    async fn save_trust_record(&self, _record: &TrustRecord) -> Result<(), StoreError> {
        Ok(())
    }
}
