//! Displayed token price band
//!
//! The band starts at the curve's static buy price and extends by a fixed
//! delta. It over-approximates the curve shape near the current point and is
//! meant for display, not for quoting.

use qacc_types::{TokenPriceRange, PRICE_BAND_DELTA};

use crate::scale::price_from_ppm;

/// Price band from a `getStaticPriceForBuying` read (parts per million)
pub fn price_range_from_static_ppm(static_price_ppm: u128) -> TokenPriceRange {
    let min_price = price_from_ppm(static_price_ppm);
    TokenPriceRange {
        min_price,
        max_price: min_price + PRICE_BAND_DELTA,
    }
}
