//! Engine configuration container.
//!
//! [`EngineConfig`] groups the split configuration types so the composition
//! root can build every service from one value.
//!
//! | Type | Used by |
//! |------|---------|
//! | `VerifyParams` | `VerifyClaimUseCase` |
//! | `ConsensusPolicy` | `ConsensusEngine` |
//! | `TrustParams` | `TrustManager` |
//! | `DebateParams` | `DebateController` |

use crate::config::{DebateParams, TrustParams, VerifyParams};
use verity_domain::ConsensusPolicy;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub verify: VerifyParams,
    pub consensus: ConsensusPolicy,
    pub trust: TrustParams,
    pub debate: DebateParams,
}

impl EngineConfig {
    pub fn new(
        verify: VerifyParams,
        consensus: ConsensusPolicy,
        trust: TrustParams,
        debate: DebateParams,
    ) -> Self {
        Self {
            verify,
            consensus,
            trust,
            debate,
        }
    }
}
