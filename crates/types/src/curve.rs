//! Bonding curve state and the records derived from replaying it

use serde::{Deserialize, Serialize};

use crate::errors::ValuationError;
use crate::ValuationResult;

/// Instantaneous state of an augmented bonding curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveState {
    /// Fraction in (0, 1], fixed for the curve's lifetime
    pub reserve_ratio: f64,
    /// Native-asset units held as collateral
    pub reserve: f64,
    /// Issuance-token units minted against the curve
    pub supply: f64,
}

impl CurveState {
    pub fn new(reserve_ratio: f64, reserve: f64, supply: f64) -> Self {
        Self {
            reserve_ratio,
            reserve,
            supply,
        }
    }

    /// Both collateral and supply are present, so the curve can be priced
    pub fn is_seeded(&self) -> bool {
        self.reserve > 0.0 && self.supply > 0.0
    }

    /// Check the state can be priced and replayed
    pub fn validate(&self) -> ValuationResult<()> {
        if !(self.reserve_ratio.is_finite()
            && self.reserve.is_finite()
            && self.supply.is_finite())
        {
            return Err(ValuationError::invalid_curve_state(&format!(
                "non-finite field in {:?}",
                self
            )));
        }

        if self.reserve_ratio <= 0.0 || self.reserve_ratio > 1.0 {
            return Err(ValuationError::invalid_curve_state(&format!(
                "reserve ratio {} not in (0, 1]",
                self.reserve_ratio
            )));
        }

        if !self.is_seeded() {
            return Err(ValuationError::curve_not_seeded(self.reserve, self.supply));
        }

        Ok(())
    }
}

/// A historical donation to a project
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DonationEvent {
    /// Amount in native-asset units
    pub amount: f64,
    /// Unix timestamp in milliseconds
    pub created_at_ms: i64,
}

impl DonationEvent {
    pub fn new(amount: f64, created_at_ms: i64) -> Self {
        Self {
            amount,
            created_at_ms,
        }
    }
}

/// One step of a replayed market cap history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapHistoryPoint {
    pub timestamp_ms: i64,
    pub market_cap: f64,
    pub price: f64,
    pub reserve: f64,
    pub supply: f64,
}

/// Result of folding a donation sequence over a curve
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// State after the last replayed donation
    pub final_state: CurveState,
    /// Genesis point followed by one point per replayed donation
    pub history: Vec<CapHistoryPoint>,
}

impl ReplayOutcome {
    pub fn genesis(&self) -> &CapHistoryPoint {
        &self.history[0]
    }

    pub fn latest(&self) -> &CapHistoryPoint {
        &self.history[self.history.len() - 1]
    }

    /// Number of donations folded into the history
    pub fn replayed_donations(&self) -> usize {
        self.history.len() - 1
    }
}

/// Where a market cap figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationSource {
    /// Replayed donations over the curve
    CurveReplay,
    /// Curve state alone, no donations after genesis
    InitialPrice,
    /// External DEX aggregator pool data
    DexAggregator,
    /// Valuation failed and was zeroed
    Unavailable,
}

/// Market capitalization and price change for one project
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCapResult {
    /// Native-asset market cap, rounded to integer units
    pub market_cap: f64,
    /// Signed percentage change over the lookback window
    pub pct_change: f64,
    /// Native-asset token price
    pub price: f64,
    pub market_cap_usd: f64,
    pub price_usd: f64,
    pub source: ValuationSource,
}

impl MarketCapResult {
    /// Default substituted for a project whose valuation failed
    pub fn zeroed() -> Self {
        Self {
            market_cap: 0.0,
            pct_change: 0.0,
            price: 0.0,
            market_cap_usd: 0.0,
            price_usd: 0.0,
            source: ValuationSource::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source != ValuationSource::Unavailable
    }
}

/// Displayed token price band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPriceRange {
    pub min_price: f64,
    pub max_price: f64,
}

impl TokenPriceRange {
    /// Convert the band to USD with a spot price
    pub fn to_usd(&self, spot_price_usd: f64) -> Self {
        Self {
            min_price: self.min_price * spot_price_usd,
            max_price: self.max_price * spot_price_usd,
        }
    }
}

/// Whether a previously computed price range still reflects on-chain state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceRangeStatus {
    pub is_price_up_to_date: bool,
}
