//! Wire format spoken with agent commands.
//!
//! Each call writes one [`WireRequest`] as a single JSON line to the agent's
//! stdin and reads one JSON document from its stdout:
//!
//! ```text
//! → {"method":"evaluate","params":{"agent_id":"sci-1","claim":"...","capability":"science",...}}
//! ← {"verdict":"TRUE","confidence":0.9,"evidence":[{"summary":"...","source":"..."}]}
//! ← {"error":"rate limited"}
//! ```

use serde::{Deserialize, Serialize};
use verity_application::GatewayError;
use verity_domain::{Evidence, Verdict};

/// Request envelope
#[derive(Debug, Serialize)]
pub struct WireRequest<'a, P: Serialize> {
    pub method: &'static str,
    pub params: &'a P,
}

/// Answer to `evaluate` and `moderate`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerdictPayload {
    pub verdict: Verdict,
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub reasoning: String,
}

/// Answer to `argue`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArgumentPayload {
    pub content: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Parse an agent's stdout into `T`.
///
/// An object carrying an `error` string is the agent reporting failure.
pub fn parse_response<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, GatewayError> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| {
        GatewayError::InvalidResponse(format!("{}; raw response: {}", e, truncate(raw, 200)))
    })?;

    if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
        return Err(GatewayError::RequestFailed(message.to_string()));
    }

    serde_json::from_value(value).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_application::EvaluationRequest;
    use verity_domain::{AgentId, Capability};

    #[test]
    fn test_request_envelope() {
        let params = EvaluationRequest {
            agent_id: AgentId::new("sci-1"),
            claim: "Water boils at 100C".to_string(),
            context: None,
            capability: Capability::Science,
            require_sources: true,
        };
        let json = serde_json::to_value(WireRequest {
            method: "evaluate",
            params: &params,
        })
        .unwrap();
        assert_eq!(json["method"], "evaluate");
        assert_eq!(json["params"]["capability"], "science");
        assert!(json["params"].get("context").is_none());
    }

    #[test]
    fn test_parse_verdict() {
        let payload: VerdictPayload = parse_response(
            r#"{"verdict":"UNCERTAIN","confidence":0.6,"evidence":[{"summary":"s","source":"u"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.verdict, Verdict::Uncertain);
        assert_eq!(payload.evidence[0].source.as_deref(), Some("u"));
        assert!(payload.reasoning.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_response::<VerdictPayload>(r#"{"error":"quota exceeded"}"#),
            Err(GatewayError::RequestFailed(m)) if m == "quota exceeded"
        ));
        assert!(matches!(
            parse_response::<VerdictPayload>("not json"),
            Err(GatewayError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response::<VerdictPayload>(r#"{"verdict":"MAYBE","confidence":1}"#),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé");
        assert_eq!(truncate("ab", 5), "ab");
    }
}
