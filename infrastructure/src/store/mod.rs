//! File-backed persistence adapters

mod json_trust;
mod jsonl_results;

pub use json_trust::JsonTrustStore;
pub use jsonl_results::JsonlResultStore;
