//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use verity_domain::Priority;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted, colored text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Request priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PriorityArg {
    Low,
    #[default]
    Normal,
    /// Fans out to more agents
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::High => Priority::High,
        }
    }
}

/// CLI arguments for verity
#[derive(Parser, Debug)]
#[command(name = "verity")]
#[command(author, version, about = "Multi-agent claim verification")]
#[command(long_about = r#"
Verity sends a claim to several independent verification agents, weighs their
verdicts by each agent's track record and returns a consensus verdict with a
reasoning trace. Contested results are escalated to a debate between the
strongest opposing agents, ruled on by a moderator.

Configuration files are loaded from (in priority order):
1. VERITY_* environment variables
2. --config <path>     Explicit config file
3. ./verity.toml       Project-level config
4. ~/.config/verity/config.toml   Global config

Example:
  verity verify "The Eiffel Tower was completed in 1889"
  verity verify --priority high --require-sources -o json "Coffee causes dehydration"
  verity agents
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a claim
    Verify(VerifyArgs),

    /// Show registered agents with their health and trust
    Agents(AgentsArgs),

    /// Show configuration sources and validate the merged configuration
    Config,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The claim to verify
    pub claim: String,

    /// Additional context passed to every agent
    #[arg(long)]
    pub context: Option<String>,

    #[arg(long, value_enum, default_value = "normal")]
    pub priority: PriorityArg,

    /// Treat verdicts without cited sources as UNCERTAIN
    #[arg(long)]
    pub require_sources: bool,

    /// Deadline in milliseconds (defaults to the configured deadline)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl VerifyArgs {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

#[derive(Args, Debug)]
pub struct AgentsArgs {
    /// Reset this agent's trust to the neutral prior
    #[arg(long, value_name = "ID")]
    pub reset: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify() {
        let cli = Cli::parse_from([
            "verity",
            "-vv",
            "verify",
            "--priority",
            "high",
            "--require-sources",
            "--deadline-ms",
            "1500",
            "-o",
            "json",
            "Water boils at 100C",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.claim, "Water boils at 100C");
        assert_eq!(Priority::from(args.priority), Priority::High);
        assert!(args.require_sources);
        assert_eq!(args.deadline(), Some(Duration::from_millis(1500)));
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_zero_deadline_rejected() {
        assert!(Cli::try_parse_from(["verity", "verify", "--deadline-ms", "0", "claim"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["verity", "agents", "--reset", "sci-1", "--no-config", "-q"]);
        assert!(cli.no_config);
        assert!(cli.quiet);
        let Command::Agents(args) = cli.command else {
            panic!("expected agents");
        };
        assert_eq!(args.reset.as_deref(), Some("sci-1"));
    }
}
