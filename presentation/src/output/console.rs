//! Console output formatter for verification results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use verity_application::AgentStatus;
use verity_domain::{
    ConfigIssue, HealthStatus, Severity, StepKind, Verdict, VerificationResult,
};

/// Formats verification results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &VerificationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Verification Result"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Claim:".cyan().bold(), result.claim));
        output.push_str(&format!(
            "{} {} {}\n",
            "Verdict:".cyan().bold(),
            Self::verdict(result.verdict),
            format!("(confidence {:.2}, {})", result.confidence, result.status).dimmed()
        ));

        let meta = &result.metadata;
        let mut facts = vec![
            format!("{}/{} agents answered", meta.agents_responded, meta.agents_dispatched),
            format!("{}ms", meta.elapsed_ms),
        ];
        if meta.fast_path {
            facts.push("fast path".to_string());
        }
        if meta.escalated {
            facts.push(format!("debated {} rounds", meta.debate_rounds));
        }
        output.push_str(&format!("{}\n", facts.join(" · ").dimmed()));

        output.push_str(&Self::section_header("Agents"));
        for verdict in &result.agent_verdicts {
            let line = match &verdict.failure {
                Some(failure) => format!(
                    "  {} {} {}",
                    "x".red(),
                    verdict.agent_id,
                    format!("{} after {}ms", failure.label(), verdict.latency_ms).red()
                ),
                None => format!(
                    "  {} {} {} ({:.2}, {}ms)",
                    "v".green(),
                    verdict.agent_id,
                    Self::verdict(verdict.verdict),
                    verdict.confidence,
                    verdict.latency_ms
                ),
            };
            output.push_str(&line);
            output.push('\n');
        }

        if let Some(debate) = &result.debate {
            output.push_str(&Self::section_header("Debate"));
            output.push_str(&format!(
                "  {} {}  {} {}  {} {}\n",
                "prosecutor".yellow(),
                debate.prosecutor,
                "defender".yellow(),
                debate.defender,
                "moderator".yellow(),
                debate.moderator
            ));
            let ruling = debate
                .ruling
                .map(|v| Self::verdict(v).to_string())
                .unwrap_or_else(|| "none".dimmed().to_string());
            output.push_str(&format!(
                "  {} rounds, {} forfeits, ruling {}\n",
                debate.rounds, debate.forfeits, ruling
            ));
        }

        if !result.evidence.is_empty() {
            output.push_str(&Self::section_header("Evidence"));
            for evidence in &result.evidence {
                match &evidence.source {
                    Some(source) => output.push_str(&format!(
                        "  * {} {}\n",
                        evidence.summary,
                        format!("<{}>", source).dimmed()
                    )),
                    None => output.push_str(&format!("  * {}\n", evidence.summary)),
                }
            }
        }

        output.push_str(&Self::section_header("Reasoning"));
        for (index, step) in result.reasoning.iter().enumerate() {
            output.push_str(&format!(
                "  {:>2}. {} {}\n",
                index + 1,
                Self::step_kind(step.kind),
                step.description
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(result: &VerificationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the agent table
    pub fn format_agents(agents: &[AgentStatus]) -> String {
        if agents.is_empty() {
            return format!("{}\n", "No agents configured".yellow());
        }

        let mut output = format!(
            "{:<20} {:<12} {:>6}  {}\n",
            "AGENT".bold(),
            "STATUS".bold(),
            "TRUST".bold(),
            "CAPABILITIES".bold()
        );
        for agent in agents {
            let status = match agent.status {
                HealthStatus::Healthy => agent.status.as_str().green(),
                HealthStatus::Degraded => agent.status.as_str().yellow(),
                HealthStatus::Unavailable => agent.status.as_str().red(),
            };
            let capabilities = agent
                .capabilities
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "{:<20} {:<12} {:>6.3}  {}\n",
                agent.agent_id.as_str(),
                status,
                agent.trust_score,
                capabilities
            ));
        }
        output
    }

    pub fn format_agents_json(agents: &[AgentStatus]) -> String {
        serde_json::to_string_pretty(agents).unwrap_or_else(|_| "[]".to_string())
    }

    /// Format configuration issues, errors first
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|i| i.severity != Severity::Error);
        sorted
            .iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("  {} {}", "error:".red().bold(), issue.message),
                Severity::Warning => format!("  {} {}", "warning:".yellow().bold(), issue.message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn verdict(verdict: Verdict) -> ColoredString {
        match verdict {
            Verdict::True => verdict.as_str().green().bold(),
            Verdict::False => verdict.as_str().red().bold(),
            Verdict::Uncertain => verdict.as_str().yellow().bold(),
            Verdict::Error => verdict.as_str().magenta().bold(),
        }
    }

    fn step_kind(kind: StepKind) -> ColoredString {
        let label = format!("[{}]", kind.as_str());
        match kind {
            StepKind::AgentTimeout
            | StepKind::GatewayFailure
            | StepKind::DebateForfeit
            | StepKind::ConsensusUnresolved => label.red(),
            StepKind::ByzantinePenalty | StepKind::SourceRequirement | StepKind::Escalation => {
                label.yellow()
            }
            _ => label.cyan(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &VerificationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &VerificationResult) -> String {
        Self::format_json(result)
    }

    fn format_agents(&self, agents: &[AgentStatus]) -> String {
        Self::format_agents(agents)
    }
}
