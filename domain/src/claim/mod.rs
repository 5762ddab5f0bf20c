//! Claims and verification requests.

pub mod domain;
pub mod request;

pub use domain::infer_domain;
pub use request::{
    Claim, MAX_CLAIM_CHARS, MAX_CONTEXT_CHARS, Priority, RequestId, VerificationRequest,
};
