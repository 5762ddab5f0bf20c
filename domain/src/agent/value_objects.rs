//! Agent value objects: identity, capabilities and health.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier of a verification agent (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new agent id
    ///
    /// # Panics
    /// Panics if the id is empty or only whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.trim().is_empty(), "Agent id cannot be empty");
        Self(id)
    }

    /// Try to create a new agent id, rejecting blank input
    pub fn try_new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            Err(DomainError::InvalidAgentId(id))
        } else {
            Ok(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId::new(s)
    }
}

/// Knowledge domain an agent specializes in.
///
/// `General` agents are generalists: they match every requested domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Science,
    Technology,
    News,
    Health,
    Politics,
    Finance,
    General,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Science => "science",
            Capability::Technology => "technology",
            Capability::News => "news",
            Capability::Health => "health",
            Capability::Politics => "politics",
            Capability::Finance => "finance",
            Capability::General => "general",
        }
    }

    /// All capabilities, in declaration order
    pub fn all() -> &'static [Capability] {
        &[
            Capability::Science,
            Capability::Technology,
            Capability::News,
            Capability::Health,
            Capability::Politics,
            Capability::Finance,
            Capability::General,
        ]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "science" => Ok(Capability::Science),
            "technology" | "tech" => Ok(Capability::Technology),
            "news" => Ok(Capability::News),
            "health" | "medicine" => Ok(Capability::Health),
            "politics" => Ok(Capability::Politics),
            "finance" | "economics" => Ok(Capability::Finance),
            "general" => Ok(Capability::General),
            other => Err(DomainError::UnknownCapability(other.to_string())),
        }
    }
}

/// Health of an agent as observed by health checks and dispatch outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Degraded,
    Unavailable,
}

impl HealthStatus {
    /// Whether an agent in this state may receive work
    pub fn is_dispatchable(&self) -> bool {
        !matches!(self, HealthStatus::Unavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "degraded" => Ok(HealthStatus::Degraded),
            "unavailable" => Ok(HealthStatus::Unavailable),
            other => Err(format!(
                "Unknown health status: {}. Valid: healthy, degraded, unavailable",
                other
            )),
        }
    }
}
