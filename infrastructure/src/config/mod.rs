//! Configuration file loading for verity
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VERITY_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./verity.toml` or `./.verity.toml`
//! 4. Global: `$XDG_CONFIG_HOME/verity/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAgentEntry, FileConfig, FileConsensusConfig, FileDebateConfig, FileGatewayConfig,
    FileLoggingConfig, FileOrchestratorConfig, FileStorageConfig, FileTrustConfig,
};
pub use loader::ConfigLoader;
