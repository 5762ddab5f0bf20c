//! Evidence gateway backed by external agent commands.
//!
//! Every call spawns the agent's command, writes one JSON request line to its
//! stdin and parses one JSON response from its stdout. The child is spawned
//! with `kill_on_drop`, so a caller that times out or cancels the call also
//! terminates the process.

use super::protocol::{ArgumentPayload, VerdictPayload, WireRequest, parse_response};
use crate::config::FileConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;
use verity_application::{
    DebateBrief, EvaluationRequest, EvidenceGateway, GatewayError, ModerationBrief,
};
use verity_domain::{AgentId, AgentVerdict, Argument};

/// Maximum accepted response size (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Stderr kept for error messages
const MAX_STDERR_SIZE: usize = 16 * 1024;

/// Read at most `limit` bytes of `stream`, then discard the rest.
///
/// Keeps memory bounded while still letting the child finish writing.
/// Returns the kept bytes and the total length of the stream.
async fn read_capped<R>(stream: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, u64)>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let Some(mut stream) = stream else {
        return Ok((kept, 0));
    };
    (&mut stream).take(limit as u64).read_to_end(&mut kept).await?;
    let discarded = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await?;
    let total = kept.len() as u64 + discarded;
    Ok((kept, total))
}

/// Program and arguments used to reach one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl AgentCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Gateway that runs one process per agent call
#[derive(Debug, Clone, Default)]
pub struct CommandEvidenceGateway {
    commands: HashMap<AgentId, AgentCommand>,
    default: Option<AgentCommand>,
}

impl CommandEvidenceGateway {
    pub fn new(default: Option<AgentCommand>) -> Self {
        Self {
            commands: HashMap::new(),
            default,
        }
    }

    /// Build from `[gateway]` and the per-agent `command` overrides
    pub fn from_config(config: &FileConfig) -> Self {
        let default = config
            .gateway
            .command
            .as_ref()
            .map(|program| AgentCommand::new(program.as_str()).with_args(&config.gateway.args));

        let mut gateway = Self::new(default);
        for entry in &config.agents {
            if let Some(program) = &entry.command {
                gateway = gateway.with_agent_command(
                    entry.id.as_str(),
                    AgentCommand::new(program.as_str()).with_args(&entry.args),
                );
            }
        }
        gateway
    }

    pub fn with_agent_command(mut self, id: impl Into<AgentId>, command: AgentCommand) -> Self {
        self.commands.insert(id.into(), command);
        self
    }

    fn command_for(&self, agent_id: &AgentId) -> Result<&AgentCommand, GatewayError> {
        self.commands
            .get(agent_id)
            .or(self.default.as_ref())
            .ok_or_else(|| {
                GatewayError::AgentNotAvailable(format!("no command configured for {}", agent_id))
            })
    }

    async fn call<P, T>(&self, agent_id: &AgentId, method: &'static str, params: &P) -> Result<T, GatewayError>
    where
        P: Serialize + Sync,
        T: for<'de> serde::Deserialize<'de>,
    {
        let command = self.command_for(agent_id)?;
        let mut line = serde_json::to_vec(&WireRequest { method, params })
            .map_err(|e| GatewayError::Other(format!("failed to encode request: {}", e)))?;
        line.push(b'\n');

        debug!("Calling {} {} for {}", command.program, method, agent_id);
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .env("VERITY_AGENT_ID", agent_id.as_str())
            .env("VERITY_METHOD", method)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GatewayError::ConnectionError(format!("failed to spawn {}: {}", command.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // An agent may answer without reading its input
            if let Err(e) = stdin.write_all(&line).await {
                debug!("Agent {} did not read its request: {}", agent_id, e);
            }
        }

        let ((stdout, stdout_len), (stderr, _)) = tokio::try_join!(
            read_capped(child.stdout.take(), MAX_OUTPUT_SIZE + 1),
            read_capped(child.stderr.take(), MAX_STDERR_SIZE),
        )
        .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        let status = child
            .wait()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(GatewayError::RequestFailed(format!(
                "{} exited with {}: {}",
                command.program,
                status,
                stderr.trim()
            )));
        }
        if stdout.len() > MAX_OUTPUT_SIZE {
            return Err(GatewayError::InvalidResponse(format!(
                "response of {} bytes exceeds the {} byte limit",
                stdout_len, MAX_OUTPUT_SIZE
            )));
        }

        parse_response(&String::from_utf8_lossy(&stdout))
    }
}

#[async_trait]
impl EvidenceGateway for CommandEvidenceGateway {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<AgentVerdict, GatewayError> {
        let payload: VerdictPayload = self.call(&request.agent_id, "evaluate", request).await?;
        Ok(
            AgentVerdict::new(request.agent_id.clone(), payload.verdict, payload.confidence)
                .with_evidence(payload.evidence)
                .with_reasoning(payload.reasoning),
        )
    }

    async fn argue(&self, brief: &DebateBrief) -> Result<Argument, GatewayError> {
        let payload: ArgumentPayload = self.call(&brief.agent_id, "argue", brief).await?;
        Ok(Argument::new(brief.agent_id.clone(), brief.role, payload.content)
            .with_evidence(payload.evidence))
    }

    async fn moderate(&self, brief: &ModerationBrief) -> Result<AgentVerdict, GatewayError> {
        let payload: VerdictPayload = self.call(&brief.agent_id, "moderate", brief).await?;
        Ok(
            AgentVerdict::new(brief.agent_id.clone(), payload.verdict, payload.confidence)
                .with_evidence(payload.evidence)
                .with_reasoning(payload.reasoning),
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use verity_domain::{Capability, DebateRole, Verdict};

    fn script(body: &str) -> AgentCommand {
        AgentCommand::new("sh").with_args(["-c", body])
    }

    fn request(agent: &str) -> EvaluationRequest {
        EvaluationRequest {
            agent_id: AgentId::new(agent),
            claim: "The bridge opened in 1937".to_string(),
            context: None,
            capability: Capability::General,
            require_sources: false,
        }
    }

    #[tokio::test]
    async fn test_evaluate_parses_verdict() {
        let gateway = CommandEvidenceGateway::new(Some(script(
            r#"cat >/dev/null; echo '{"verdict":"TRUE","confidence":0.8,"evidence":[{"summary":"records","source":"https://archive.example"}],"reasoning":"dated photos"}'"#,
        )));

        let verdict = gateway.evaluate(&request("gen-1")).await.unwrap();
        assert_eq!(verdict.agent_id, AgentId::new("gen-1"));
        assert_eq!(verdict.verdict, Verdict::True);
        assert_eq!(verdict.confidence, 0.8);
        assert!(verdict.has_sources());
        assert_eq!(verdict.reasoning, "dated photos");
    }

    #[tokio::test]
    async fn test_request_reaches_agent() {
        let gateway = CommandEvidenceGateway::new(Some(script(
            r#"read line; case "$line" in *'"method":"argue"'*'"round":2'*) echo "{\"content\":\"$VERITY_AGENT_ID rebuts\"}";; *) echo '{"error":"unexpected request"}';; esac"#,
        )));
        let brief = DebateBrief {
            agent_id: AgentId::new("pro"),
            role: DebateRole::Prosecutor,
            claim: "claim".to_string(),
            round: 2,
            max_rounds: 3,
            rebut: None,
        };

        let argument = gateway.argue(&brief).await.unwrap();
        assert_eq!(argument.content, "pro rebuts");
        assert_eq!(argument.role, DebateRole::Prosecutor);
    }

    #[tokio::test]
    async fn test_agent_error_and_exit_status() {
        let reported = CommandEvidenceGateway::new(Some(script(
            r#"cat >/dev/null; echo '{"error":"rate limited"}'"#,
        )));
        assert!(matches!(
            reported.evaluate(&request("a")).await,
            Err(GatewayError::RequestFailed(m)) if m == "rate limited"
        ));

        let crashed = CommandEvidenceGateway::new(Some(script("echo boom >&2; exit 3")));
        match crashed.evaluate(&request("a")).await {
            Err(GatewayError::RequestFailed(m)) => assert!(m.contains("boom")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_commands() {
        let gateway = CommandEvidenceGateway::default();
        assert!(matches!(
            gateway.evaluate(&request("a")).await,
            Err(GatewayError::AgentNotAvailable(_))
        ));

        let gateway = CommandEvidenceGateway::new(Some(AgentCommand::new(
            "/nonexistent/verity-agent-binary",
        )));
        assert!(matches!(
            gateway.evaluate(&request("a")).await,
            Err(GatewayError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_override_wins() {
        let gateway = CommandEvidenceGateway::new(Some(script("exit 1"))).with_agent_command(
            "special",
            script(r#"cat >/dev/null; echo '{"verdict":"FALSE","confidence":0.7}'"#),
        );
        assert!(gateway.evaluate(&request("other")).await.is_err());
        let verdict = gateway.evaluate(&request("special")).await.unwrap();
        assert_eq!(verdict.verdict, Verdict::False);
    }

    #[tokio::test]
    async fn test_dropped_call_returns_promptly() {
        let gateway = CommandEvidenceGateway::new(Some(script("sleep 30")));
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(Duration::from_millis(200), gateway.evaluate(&request("a"))).await;
        assert!(outcome.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let gateway = CommandEvidenceGateway::new(Some(script(
            "cat >/dev/null; head -c 3000000 /dev/zero | tr '\\0' 'a'",
        )));
        match gateway.evaluate(&request("a")).await {
            Err(GatewayError::InvalidResponse(m)) => {
                assert!(m.contains("3000000 bytes"), "{}", m);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_capped_keeps_prefix() {
        let data: &[u8] = b"0123456789";
        let (kept, total) = read_capped(Some(data), 4).await.unwrap();
        assert_eq!(kept, b"0123");
        assert_eq!(total, 10);

        let (kept, total) = read_capped(None::<&[u8]>, 4).await.unwrap();
        assert!(kept.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_from_config() {
        let config: FileConfig = toml::from_str(
            r#"
[gateway]
command = "verity-agent"
args = ["--json"]

[[agents]]
id = "sci-1"
command = "sci-agent"

[[agents]]
id = "gen-1"
"#,
        )
        .unwrap();
        let gateway = CommandEvidenceGateway::from_config(&config);
        assert_eq!(
            gateway.command_for(&AgentId::new("sci-1")).unwrap().program,
            "sci-agent"
        );
        let fallback = gateway.command_for(&AgentId::new("gen-1")).unwrap();
        assert_eq!(fallback.program, "verity-agent");
        assert_eq!(fallback.args, vec!["--json"]);
    }
}
