//! Valuation constants used across the q/acc crates

// ============================================================================
// Curve Pricing Constants
// ============================================================================

/// Buy-side premium applied over the curve's spot price.
///
/// Observed in the deployed augmented bonding curve's pricing; tied to the
/// curve's fee schedule and not derivable from the curve state alone.
pub const MARGIN_FACTOR: f64 = 1.1;

/// Width of the displayed token price band above the static buy price.
///
/// A heuristic over-approximation of the curve shape near the current point.
/// Must be confirmed against the contract's fee schedule before changing.
pub const PRICE_BAND_DELTA: f64 = 0.806;

// ============================================================================
// On-chain Scaling Constants
// ============================================================================

/// Scale of `getReserveRatioForBuying` (parts per million)
pub const RESERVE_RATIO_SCALE: u128 = 1_000_000;

/// Scale of `getStaticPriceForBuying` (parts per million)
pub const PPM_SCALE: u128 = 1_000_000;

/// 18-decimal fixed point scale used by virtual supply reads
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// 2^96, the scale of a Q64.96 sqrt price
pub const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

// ============================================================================
// Time Constants
// ============================================================================

/// Milliseconds in one hour
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Default lookback window for percentage change
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;

/// Default grace window applied to round end dates (10 minutes)
pub const DEFAULT_ROUND_GRACE_SECS: u64 = 600;

// ============================================================================
// Batch Constants
// ============================================================================

/// Number of project valuations awaited together in one batch window
pub const DEFAULT_BATCH_WINDOW: usize = 5;

/// Donations requested per page from the donation backend
pub const DEFAULT_DONATION_PAGE_SIZE: u32 = 500;

/// The zero EVM address, returned by factories for missing pools
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
