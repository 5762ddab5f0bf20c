//! Verification outcome and reasoning trace

pub mod trace;
pub mod verification;

pub use trace::{ReasoningStep, StepKind};
pub use verification::{VerificationMetadata, VerificationResult, merge_evidence};
