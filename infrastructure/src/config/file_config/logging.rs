//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log output settings
///
/// `filter` uses `tracing-subscriber` directive syntax and is overridden by
/// `-v` flags and `RUST_LOG`.
///
/// # Example
///
/// ```toml
/// [logging]
/// filter = "verity=info"
/// file = "/var/log/verity/verity.log"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub filter: Option<String>,
    pub file: Option<PathBuf>,
}
