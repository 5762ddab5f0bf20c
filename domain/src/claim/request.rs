//! Verification request value objects

use crate::core::clock::current_timestamp;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Maximum claim length in characters
pub const MAX_CLAIM_CHARS: usize = 5000;

/// Maximum context length in characters
pub const MAX_CONTEXT_CHARS: usize = 2000;

/// A claim to be fact-checked (Value Object)
///
/// Holds between 1 and [`MAX_CLAIM_CHARS`] characters of non-blank text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Claim {
    text: String,
}

impl Claim {
    pub fn try_new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::EmptyClaim);
        }
        let len = text.chars().count();
        if len > MAX_CLAIM_CHARS {
            return Err(DomainError::ClaimTooLong {
                len,
                max: MAX_CLAIM_CHARS,
            });
        }
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl TryFrom<String> for Claim {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Claim::try_new(value)
    }
}

impl From<Claim> for String {
    fn from(claim: Claim) -> Self {
        claim.text
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Scheduling priority of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    /// Fans out to every eligible agent (up to a cap)
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Unknown priority: {}. Valid: low, normal, high",
                other
            )),
        }
    }
}

/// Identifier of a verification request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to verify a claim. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    id: RequestId,
    claim: Claim,
    context: Option<String>,
    priority: Priority,
    require_sources: bool,
    /// Time budget measured from submission
    deadline: Duration,
    created_at: u64,
}

impl VerificationRequest {
    /// Validate and build a request
    pub fn new(
        claim: impl Into<String>,
        context: Option<String>,
        priority: Priority,
        require_sources: bool,
        deadline: Duration,
    ) -> Result<Self, DomainError> {
        let claim = Claim::try_new(claim)?;

        let context = context.filter(|c| !c.trim().is_empty());
        if let Some(ctx) = &context {
            let len = ctx.chars().count();
            if len > MAX_CONTEXT_CHARS {
                return Err(DomainError::ContextTooLong {
                    len,
                    max: MAX_CONTEXT_CHARS,
                });
            }
        }

        if deadline.is_zero() {
            return Err(DomainError::ZeroDeadline);
        }

        Ok(Self {
            id: RequestId::generate(),
            claim,
            context,
            priority,
            require_sources,
            deadline,
            created_at: current_timestamp(),
        })
    }

    /// Replace the generated id (used when the caller supplies its own)
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn require_sources(&self) -> bool {
        self.require_sources
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}
