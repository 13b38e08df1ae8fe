//! Augmented bonding curve pricing
//!
//! `price = reserve / (supply * reserve_ratio) * MARGIN_FACTOR` and
//! `market_cap = supply * price`. A buy of `amount` collateral mints
//! `supply * ((1 + amount / reserve)^reserve_ratio - 1)` tokens.

use qacc_types::{CapHistoryPoint, CurveState, ValuationError, ValuationResult, MARGIN_FACTOR};

/// Spot price of the issuance token in native-asset units
pub fn price(state: &CurveState) -> ValuationResult<f64> {
    state.validate()?;
    Ok(state.reserve / (state.supply * state.reserve_ratio) * MARGIN_FACTOR)
}

/// Market capitalization in native-asset units
pub fn market_cap(state: &CurveState) -> ValuationResult<f64> {
    Ok(state.supply * price(state)?)
}

/// Price a state into a history point at `timestamp_ms`
pub fn history_point(state: &CurveState, timestamp_ms: i64) -> ValuationResult<CapHistoryPoint> {
    let price = price(state)?;
    Ok(CapHistoryPoint {
        timestamp_ms,
        market_cap: state.supply * price,
        price,
        reserve: state.reserve,
        supply: state.supply,
    })
}

/// Apply one collateral deposit to the curve
pub fn apply_donation(state: &CurveState, amount: f64) -> ValuationResult<CurveState> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValuationError::invalid_parameter(
            "donation amount",
            &amount.to_string(),
            "finite and non-negative",
        ));
    }

    // Zero reserve means nothing to grow supply against.
    if state.reserve <= 0.0 {
        return Err(ValuationError::curve_not_seeded(state.reserve, state.supply));
    }

    let growth = (1.0 + amount / state.reserve).powf(state.reserve_ratio);

    Ok(CurveState {
        reserve_ratio: state.reserve_ratio,
        reserve: state.reserve + amount,
        supply: state.supply * growth,
    })
}

/// Convert a native-asset figure to USD
pub fn to_usd(native: f64, spot_price_usd: f64) -> f64 {
    native * spot_price_usd
}
