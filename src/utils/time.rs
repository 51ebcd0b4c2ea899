use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch
///
/// A clock set before 1970 reads as 0 rather than panicking.
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
