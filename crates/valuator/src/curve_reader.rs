//! Bonding curve state reads
//!
//! The three curve parameters are read in one multicall so they describe the
//! same block. A failure of any single read fails the whole state; no partial
//! state is ever returned.

use std::sync::Arc;

use qacc_math::{from_wad, price_range_from_static_ppm, reserve_ratio_from_ppm};
use qacc_types::{CurveState, TokenPriceRange, ValuationError, ValuationResult};
use tracing::debug;

use crate::abi::decode_uint;
use crate::ports::{CallOutcome, ChainReader, ContractCall};

pub const RESERVE_RATIO_SIGNATURE: &str = "getReserveRatioForBuying()";
pub const COLLATERAL_SUPPLY_SIGNATURE: &str = "getVirtualCollateralSupply()";
pub const ISSUANCE_SUPPLY_SIGNATURE: &str = "getVirtualIssuanceSupply()";
pub const STATIC_PRICE_SIGNATURE: &str = "getStaticPriceForBuying()";

/// Field names reported in `CurveRead` errors, in call order
const CURVE_FIELDS: [&str; 3] = [
    "reserveRatio",
    "virtualCollateralSupply",
    "virtualIssuanceSupply",
];

/// Reads curve parameters from a funding manager contract
pub struct CurveStateReader {
    chain: Arc<dyn ChainReader>,
}

impl CurveStateReader {
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self { chain }
    }

    /// Current reserve ratio, virtual collateral and virtual issuance supply
    pub async fn read_curve_state(&self, contract_address: &str) -> ValuationResult<CurveState> {
        let calls = [
            ContractCall::new(contract_address, RESERVE_RATIO_SIGNATURE),
            ContractCall::new(contract_address, COLLATERAL_SUPPLY_SIGNATURE),
            ContractCall::new(contract_address, ISSUANCE_SUPPLY_SIGNATURE),
        ];

        let outcomes = self.chain.multicall(&calls).await?;
        if outcomes.len() != calls.len() {
            return Err(ValuationError::curve_read(
                "multicall",
                &format!("expected {} results, got {}", calls.len(), outcomes.len()),
            ));
        }

        let mut raw = [0u128; 3];
        for (index, outcome) in outcomes.iter().enumerate() {
            raw[index] = decode_field(CURVE_FIELDS[index], outcome)?;
        }

        let state = CurveState::new(
            reserve_ratio_from_ppm(raw[0]),
            from_wad(raw[1]),
            from_wad(raw[2]),
        );
        debug!(
            "Curve {}: ratio={} reserve={} supply={}",
            contract_address, state.reserve_ratio, state.reserve, state.supply
        );

        Ok(state)
    }

    /// Displayed price band derived from the static buy price
    pub async fn read_price_range(
        &self,
        funding_manager_address: &str,
    ) -> ValuationResult<TokenPriceRange> {
        let ppm = self.read_static_price_ppm(funding_manager_address).await?;
        Ok(price_range_from_static_ppm(ppm))
    }

    async fn read_static_price_ppm(&self, funding_manager_address: &str) -> ValuationResult<u128> {
        let calls = [ContractCall::new(funding_manager_address, STATIC_PRICE_SIGNATURE)];
        let outcomes = self.chain.multicall(&calls).await?;

        let outcome = outcomes
            .first()
            .ok_or_else(|| ValuationError::curve_read("staticPriceForBuying", "no result"))?;
        decode_field("staticPriceForBuying", outcome)
    }
}

fn decode_field(field: &str, outcome: &CallOutcome) -> ValuationResult<u128> {
    match outcome {
        CallOutcome::Success(data) => {
            decode_uint(data, 0).map_err(|e| ValuationError::curve_read(field, &e.to_string()))
        }
        CallOutcome::Failure(reason) => Err(ValuationError::curve_read(field, reason)),
    }
}
