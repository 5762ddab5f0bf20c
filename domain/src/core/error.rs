//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Claim cannot be empty")]
    EmptyClaim,

    #[error("Claim exceeds {max} characters (got {len})")]
    ClaimTooLong { len: usize, max: usize },

    #[error("Context exceeds {max} characters (got {len})")]
    ContextTooLong { len: usize, max: usize },

    #[error("Deadline must be greater than zero")]
    ZeroDeadline,

    #[error("Invalid agent id: {0}")]
    InvalidAgentId(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Invalid debate transition: {0}")]
    InvalidTransition(String),
}

impl DomainError {
    /// Check if this error was caused by the caller's input
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyClaim
                | DomainError::ClaimTooLong { .. }
                | DomainError::ContextTooLong { .. }
                | DomainError::ZeroDeadline
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_too_long_display() {
        let error = DomainError::ClaimTooLong { len: 5001, max: 5000 };
        assert_eq!(error.to_string(), "Claim exceeds 5000 characters (got 5001)");
    }

    #[test]
    fn test_is_invalid_request() {
        assert!(DomainError::EmptyClaim.is_invalid_request());
        assert!(DomainError::ZeroDeadline.is_invalid_request());
        assert!(!DomainError::InvalidTransition("x".to_string()).is_invalid_request());
    }
}
