//! Percentage change over a lookback window

use qacc_types::{CapHistoryPoint, ValuationError, ValuationResult, MS_PER_HOUR};

/// Signed percentage change from `baseline` to `latest`.
///
/// A zero baseline yields 0 rather than an infinite or undefined change.
pub fn pct_change(latest: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (latest - baseline) / baseline * 100.0
}

/// Baseline point for a lookback window ending at `now_ms`.
///
/// The closest point at or before `now_ms - lookback_hours`; the genesis
/// point when no point is that old. `history` must be ordered by timestamp.
pub fn baseline_point(
    history: &[CapHistoryPoint],
    now_ms: i64,
    lookback_hours: u32,
) -> ValuationResult<&CapHistoryPoint> {
    let genesis = history.first().ok_or_else(empty_history)?;

    let cutoff_ms = now_ms.saturating_sub(i64::from(lookback_hours) * MS_PER_HOUR);

    Ok(history
        .iter()
        .rev()
        .find(|point| point.timestamp_ms <= cutoff_ms)
        .unwrap_or(genesis))
}

/// Market cap change of the latest point against the lookback baseline
pub fn market_cap_change(
    history: &[CapHistoryPoint],
    now_ms: i64,
    lookback_hours: u32,
) -> ValuationResult<f64> {
    let baseline = baseline_point(history, now_ms, lookback_hours)?;
    let latest = history.last().ok_or_else(empty_history)?;

    Ok(pct_change(latest.market_cap, baseline.market_cap))
}

fn empty_history() -> ValuationError {
    ValuationError::invalid_parameter("history", "empty", "at least a genesis point")
}
