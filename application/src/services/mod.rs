//! Stateful services shared across requests
//!
//! - [`registry`]: agents, their health and transition log
//! - [`trust_manager`]: reputation updates serialized per agent
//! - [`debate_controller`]: adversarial rounds for contested results

pub mod debate_controller;
pub mod registry;
pub mod trust_manager;
