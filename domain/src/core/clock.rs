//! Wall-clock helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds since the Unix epoch
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
