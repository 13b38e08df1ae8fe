/// Bonding curve math for the q/acc valuation engine
///
/// This crate provides curve pricing, the donation replay fold, percentage
/// change over lookback windows, on-chain scale conversions and the
/// displayed price band. Everything here is pure and synchronous.

pub mod change;
pub mod curve;
pub mod price_band;
pub mod replay;
pub mod scale;

// Re-export commonly used functions
pub use change::*;
pub use curve::*;
pub use price_band::*;
pub use replay::*;
pub use scale::*;
