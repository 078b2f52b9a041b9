//! Upload progress reporting.

use std::sync::Arc;

/// Callback a transport invokes with the percentage of an upload sent so far.
///
/// Values are raw transport readings: receivers must not assume they stay in
/// `0..=100` or never decrease.
pub type ProgressCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Percentage of `total` covered by `loaded`, rounded to the nearest integer.
///
/// Returns 0 when `total` is 0 (the size is unknown).
pub fn progress_percent(loaded: u64, total: u64) -> i64 {
    if total == 0 {
        return 0;
    }
    let scaled = (loaded as u128) * 100;
    let total = total as u128;
    ((scaled + total / 2) / total) as i64
}

/// A callback that discards every report.
pub fn ignore_progress() -> ProgressCallback {
    Arc::new(|_| {})
}
