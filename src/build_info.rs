//! Build-timestamp helper used for rebuild detection.
//!
//! The daemon records the mtime of its own executable at startup. The
//! client compares its own binary's mtime against the daemon's recorded
//! value; if the client is newer, the daemon is serving stale code.

use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time, in epoch milliseconds, of the currently running
/// executable. Returns `None` if it can't be determined (e.g. the exe path
/// or its metadata is unavailable) — callers treat that as "unknown,"
/// never as "stale."
pub fn current_executable_build_timestamp_ms() -> Option<i64> {
    let exe = std::env::current_exe().ok()?;
    let metadata = std::fs::metadata(exe).ok()?;
    let modified = metadata.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_a_plausible_timestamp() {
        // Under test, current_exe() is the test binary — just assert we got
        // something that looks like a recent epoch-millis value.
        if let Some(ts) = current_executable_build_timestamp_ms() {
            assert!(ts > 0);
        }
    }
}
