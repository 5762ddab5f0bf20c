//! Evidence gateway adapters
//!
//! [`CommandEvidenceGateway`] reaches agents through external commands that
//! speak the JSON format defined in [`protocol`].

pub mod command;
pub mod protocol;

pub use command::{AgentCommand, CommandEvidenceGateway};
