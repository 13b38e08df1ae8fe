//! Collaborator ports
//!
//! Every external dependency of the valuation engine sits behind one of these
//! traits so resolvers can run against live adapters or in-memory fakes.

use async_trait::async_trait;
use qacc_types::{DonationPage, PoolMarketData, PoolQuote, SwapRecord, ValuationResult};

/// A read-only contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract address
    pub address: String,
    /// Solidity signature, e.g. `getVirtualIssuanceSupply()`
    pub signature: &'static str,
    /// Address arguments in order
    pub address_args: Vec<String>,
}

impl ContractCall {
    pub fn new(address: &str, signature: &'static str) -> Self {
        Self {
            address: address.to_string(),
            signature,
            address_args: Vec::new(),
        }
    }

    pub fn with_address_arg(mut self, arg: &str) -> Self {
        self.address_args.push(arg.to_string());
        self
    }

    /// Function name without the argument list
    pub fn function_name(&self) -> &str {
        self.signature.split('(').next().unwrap_or(self.signature)
    }
}

/// Outcome of one call inside a multicall
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Raw ABI-encoded return data
    Success(Vec<u8>),
    /// Revert or transport error for this call only
    Failure(String),
}

/// On-chain read client
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest block number
    async fn block_number(&self) -> ValuationResult<u64>;

    /// Execute `calls` against one block; one outcome per call, in order
    async fn multicall(&self, calls: &[ContractCall]) -> ValuationResult<Vec<CallOutcome>>;
}

/// Backend donation log
#[async_trait]
pub trait DonationSource: Send + Sync {
    async fn fetch_donations(
        &self,
        project_id: &str,
        limit: u32,
        offset: u32,
    ) -> ValuationResult<DonationPage>;
}

/// DEX pool listing lookup
#[async_trait]
pub trait PoolLookup: Send + Sync {
    async fn get_pool_by_pair(
        &self,
        token_address: &str,
        quote_token_address: &str,
    ) -> ValuationResult<PoolQuote>;
}

/// DEX aggregator market data
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_pools(&self, token_address: &str) -> ValuationResult<PoolMarketData>;
}

/// Native asset USD spot price
#[async_trait]
pub trait SpotPriceFeed: Send + Sync {
    async fn fetch_spot_price_usd(&self) -> ValuationResult<f64>;
}

/// On-chain indexer swap log
#[async_trait]
pub trait SwapIndexer: Send + Sync {
    async fn fetch_swaps(&self, orchestrator_address: &str) -> ValuationResult<Vec<SwapRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_function_name() {
        let call = ContractCall::new(CONTRACT, "getReserveRatioForBuying()");
        assert_eq!(call.function_name(), "getReserveRatioForBuying");

        let call = ContractCall::new(CONTRACT, "poolByPair(address,address)")
            .with_address_arg("0x2222222222222222222222222222222222222222")
            .with_address_arg("0x3333333333333333333333333333333333333333");
        assert_eq!(call.function_name(), "poolByPair");
        assert_eq!(call.address_args.len(), 2);
    }
}
