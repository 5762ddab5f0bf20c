//! Progress reporting for verification requests

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use verity_application::VerificationProgress;
use verity_domain::{AgentId, AgentVerdict, ArgumentRound, ConsensusResult, DebateRoles};

/// Reports progress with indicatif bars: one for agent answers, one for
/// debate rounds when a request escalates
pub struct ProgressReporter {
    multi: MultiProgress,
    agents_bar: Mutex<Option<ProgressBar>>,
    debate_bar: Mutex<Option<ProgressBar>>,
    max_rounds: usize,
}

impl ProgressReporter {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            multi: MultiProgress::new(),
            agents_bar: Mutex::new(None),
            debate_bar: Mutex::new(None),
            max_rounds,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn start_bar(&self, slot: &Mutex<Option<ProgressBar>>, prefix: &str, len: usize) {
        let pb = self.multi.add(ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(prefix.to_string());
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(120));
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn with_bar(slot: &Mutex<Option<ProgressBar>>, f: impl FnOnce(&ProgressBar)) {
        if let Some(pb) = slot.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            f(pb);
        }
    }

    fn finish_bar(slot: &Mutex<Option<ProgressBar>>, message: String) {
        if let Some(pb) = slot.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pb.finish_with_message(message);
        }
    }
}

impl VerificationProgress for ProgressReporter {
    fn on_dispatch(&self, agents: &[AgentId]) {
        self.start_bar(&self.agents_bar, "Agents", agents.len());
    }

    fn on_agent_complete(&self, verdict: &AgentVerdict) {
        Self::with_bar(&self.agents_bar, |pb| {
            let status = match &verdict.failure {
                None => format!("{} {} {}", "v".green(), verdict.agent_id, verdict.verdict),
                Some(failure) => format!("{} {} {}", "x".red(), verdict.agent_id, failure.label()),
            };
            pb.set_message(status);
            pb.inc(1);
        });
    }

    fn on_consensus(&self, result: &ConsensusResult) {
        let message = format!(
            "{} {} ({:.2})",
            "consensus".green(),
            result.verdict,
            result.confidence
        );
        Self::finish_bar(&self.debate_bar, message.clone());
        Self::finish_bar(&self.agents_bar, message);
    }

    fn on_fast_path(&self, cancelled: usize) {
        Self::with_bar(&self.agents_bar, |pb| {
            pb.set_message(format!("fast path, {} cancelled", cancelled));
        });
    }

    fn on_debate_start(&self, roles: &DebateRoles) {
        self.start_bar(&self.debate_bar, "Debate", self.max_rounds);
        Self::with_bar(&self.debate_bar, |pb| {
            pb.set_message(format!("{} vs {}", roles.prosecutor, roles.defender));
        });
    }

    fn on_debate_round(&self, round: &ArgumentRound) {
        Self::with_bar(&self.debate_bar, |pb| {
            if round.has_forfeit() {
                pb.set_message(format!("round {} {}", round.round, "forfeit".red()));
            } else {
                pb.set_message(format!("round {}", round.round));
            }
            pb.inc(1);
        });
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl VerificationProgress for SimpleProgress {
    fn on_dispatch(&self, agents: &[AgentId]) {
        let names: Vec<&str> = agents.iter().map(|a| a.as_str()).collect();
        println!("{} {} ({})", "->".cyan(), "Dispatching".bold(), names.join(", "));
    }

    fn on_agent_complete(&self, verdict: &AgentVerdict) {
        match &verdict.failure {
            None => println!(
                "  {} {} {} ({:.2})",
                "v".green(),
                verdict.agent_id,
                verdict.verdict,
                verdict.confidence
            ),
            Some(failure) => println!("  {} {} ({})", "x".red(), verdict.agent_id, failure.label()),
        }
    }

    fn on_consensus(&self, result: &ConsensusResult) {
        println!(
            "{} {} {} ({:.2})",
            "->".cyan(),
            "Consensus".bold(),
            result.verdict,
            result.confidence
        );
    }

    fn on_debate_start(&self, roles: &DebateRoles) {
        println!(
            "{} {} {} vs {}, moderated by {}",
            "->".cyan(),
            "Debate".bold(),
            roles.prosecutor,
            roles.defender,
            roles.moderator
        );
    }

    fn on_debate_round(&self, round: &ArgumentRound) {
        println!("  round {}", round.round);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;
    use verity_domain::{ConsensusEngine, TrustSnapshot, Verdict};

    fn hidden_reporter() -> ProgressReporter {
        let reporter = ProgressReporter::new(3);
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    #[test]
    fn test_reporter_tracks_agents() {
        let reporter = hidden_reporter();
        reporter.on_dispatch(&[AgentId::new("a"), AgentId::new("b")]);
        reporter.on_agent_complete(&AgentVerdict::new("a", Verdict::True, 0.9));
        reporter.on_agent_complete(&AgentVerdict::timeout("b", 100));

        let position = reporter
            .agents_bar
            .lock()
            .unwrap()
            .as_ref()
            .map(|pb| pb.position());
        assert_eq!(position, Some(2));

        let consensus = ConsensusEngine::default().resolve(
            &[AgentVerdict::new("a", Verdict::True, 0.9)],
            &TrustSnapshot::new(),
        );
        reporter.on_consensus(&consensus);
        assert!(reporter.agents_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_callbacks_without_bars_are_noops() {
        let reporter = hidden_reporter();
        reporter.on_agent_complete(&AgentVerdict::new("a", Verdict::True, 0.9));
        reporter.on_fast_path(1);
        assert!(reporter.debate_bar.lock().unwrap().is_none());
    }
}
