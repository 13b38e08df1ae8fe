//! Conversions from on-chain fixed-point integers to floating point

use qacc_types::{PPM_SCALE, Q96, RESERVE_RATIO_SCALE, WAD};

/// 18-decimal token amount to whole units
pub fn from_wad(raw: u128) -> f64 {
    split_scaled(raw, WAD)
}

/// Reserve ratio read in parts per million
pub fn reserve_ratio_from_ppm(raw: u128) -> f64 {
    split_scaled(raw, RESERVE_RATIO_SCALE)
}

/// Static price read in parts per million
pub fn price_from_ppm(raw: u128) -> f64 {
    split_scaled(raw, PPM_SCALE)
}

// Whole and fractional parts are converted separately.
fn split_scaled(raw: u128, scale: u128) -> f64 {
    (raw / scale) as f64 + (raw % scale) as f64 / scale as f64
}

/// Token price in quote units from a Q64.96 pool sqrt price.
///
/// The pool prices token1 in token0; when the token of interest is token1 the
/// price is inverted. Both tokens are assumed to carry 18 decimals.
pub fn price_from_sqrt_x96(sqrt_price_x96: u128, token_is_token0: bool) -> f64 {
    let sqrt_price = sqrt_price_x96 as f64 / Q96;
    let token1_per_token0 = sqrt_price * sqrt_price;

    if token_is_token0 {
        token1_per_token0
    } else if token1_per_token0 == 0.0 {
        0.0
    } else {
        1.0 / token1_per_token0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_wad() {
        assert_eq!(from_wad(WAD), 1.0);
        assert_eq!(from_wad(1_500_000_000_000_000_000), 1.5);
        assert_eq!(from_wad(0), 0.0);
        assert_relative_eq!(from_wad(123_456_789 * WAD + 1), 123_456_789.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ppm_conversions() {
        assert_eq!(reserve_ratio_from_ppm(200_000), 0.2);
        assert_eq!(reserve_ratio_from_ppm(1_000_000), 1.0);
        assert_eq!(price_from_ppm(1_250_000), 1.25);
    }

    #[test]
    fn test_sqrt_price_orientation() {
        // sqrt(4) * 2^96 => token0 is worth 4 token1
        let sqrt_x96 = 2u128 << 96;
        assert_relative_eq!(price_from_sqrt_x96(sqrt_x96, true), 4.0, epsilon = 1e-12);
        assert_relative_eq!(price_from_sqrt_x96(sqrt_x96, false), 0.25, epsilon = 1e-12);
        assert_eq!(price_from_sqrt_x96(0, false), 0.0);
    }
}
