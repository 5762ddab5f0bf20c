//! Gateway configuration from TOML (`[gateway]` section)

use serde::{Deserialize, Serialize};

/// Default agent command
///
/// Agents without their own `command` run this one. Each call receives one
/// JSON request on stdin and must print one JSON response on stdout.
///
/// # Example
///
/// ```toml
/// [gateway]
/// command = "verity-agent"
/// args = ["--model", "small"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}
