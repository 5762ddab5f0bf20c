//! Output formatter trait

use verity_application::AgentStatus;
use verity_domain::VerificationResult;

/// Trait for formatting verification output
pub trait OutputFormatter {
    /// Format a verification result for humans
    fn format(&self, result: &VerificationResult) -> String;

    /// Format a verification result as JSON
    fn format_json(&self, result: &VerificationResult) -> String;

    /// Format the agent table
    fn format_agents(&self, agents: &[AgentStatus]) -> String;
}
