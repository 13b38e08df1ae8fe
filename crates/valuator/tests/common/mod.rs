//! In-memory collaborators for valuator integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use qacc_types::{
    AbcInfo, DonationEvent, DonationPage, PoolMarketData, PoolQuote, Project, SwapRecord,
    ValuationError, ValuationResult, WAD,
};
use qacc_valuator::{
    CallOutcome, ChainReader, ContractCall, DonationSource, MarketDataSource, PoolLookup,
    ResolverPorts, SpotPriceFeed, SwapIndexer,
};

pub const HOUR_MS: i64 = 3_600_000;
pub const GENESIS_MS: i64 = 1_730_000_000_000;
pub const QUOTE_TOKEN: &str = "0x5555555555555555555555555555555555555555";

pub fn abc_for(id: u8) -> AbcInfo {
    let address = |prefix: char| format!("0x{}{:02x}", prefix.to_string().repeat(38), id);
    AbcInfo {
        issuance_token_address: address('a'),
        funding_manager_address: address('b'),
        orchestrator_address: address('c'),
    }
}

pub fn project(id: u8) -> Project {
    Project {
        id: id.to_string(),
        title: format!("Project {}", id),
        genesis_timestamp_ms: GENESIS_MS,
        batch_numbers_with_safe_transactions: vec![],
        recipient_address: None,
        abc: Some(abc_for(id)),
    }
}

pub fn word(value: u128) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data[16..].copy_from_slice(&value.to_be_bytes());
    data
}

// ============================================================================
// Chain
// ============================================================================

/// Raw on-chain values of one funding manager
#[derive(Debug, Clone, Default)]
pub struct FakeCurve {
    pub reserve_ratio_ppm: u128,
    pub collateral_wad: u128,
    pub issuance_wad: u128,
    pub static_price_ppm: u128,
    /// Function names that revert
    pub reverting: Vec<&'static str>,
}

impl FakeCurve {
    pub fn new(reserve_ratio: f64, reserve: u128, supply: u128) -> Self {
        Self {
            reserve_ratio_ppm: (reserve_ratio * 1_000_000.0) as u128,
            collateral_wad: reserve * WAD,
            issuance_wad: supply * WAD,
            static_price_ppm: 1_100_000,
            reverting: vec![],
        }
    }
}

#[derive(Default)]
pub struct FakeChain {
    pub curves: HashMap<String, FakeCurve>,
    pub multicalls: AtomicUsize,
    pub down: bool,
}

impl FakeChain {
    pub fn with_curve(mut self, funding_manager: &str, curve: FakeCurve) -> Self {
        self.curves.insert(funding_manager.to_lowercase(), curve);
        self
    }

    pub fn multicall_count(&self) -> usize {
        self.multicalls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn block_number(&self) -> ValuationResult<u64> {
        if self.down {
            return Err(ValuationError::http("rpc", "connection refused"));
        }
        Ok(1_000)
    }

    async fn multicall(&self, calls: &[ContractCall]) -> ValuationResult<Vec<CallOutcome>> {
        self.multicalls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(ValuationError::http("rpc", "connection refused"));
        }

        Ok(calls
            .iter()
            .map(|call| {
                let Some(curve) = self.curves.get(&call.address.to_lowercase()) else {
                    return CallOutcome::Failure("no contract".to_string());
                };
                let name = call.function_name();
                if curve.reverting.contains(&name) {
                    return CallOutcome::Failure("execution reverted".to_string());
                }
                let value = match name {
                    "getReserveRatioForBuying" => curve.reserve_ratio_ppm,
                    "getVirtualCollateralSupply" => curve.collateral_wad,
                    "getVirtualIssuanceSupply" => curve.issuance_wad,
                    "getStaticPriceForBuying" => curve.static_price_ppm,
                    _ => return CallOutcome::Failure("unknown function".to_string()),
                };
                CallOutcome::Success(word(value))
            })
            .collect())
    }
}

// ============================================================================
// Donations
// ============================================================================

#[derive(Default)]
pub struct FakeDonations {
    pub by_project: HashMap<String, Vec<DonationEvent>>,
    pub requests: AtomicUsize,
    pub failing: Vec<String>,
}

impl FakeDonations {
    pub fn with(mut self, project_id: &str, donations: Vec<DonationEvent>) -> Self {
        self.by_project.insert(project_id.to_string(), donations);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DonationSource for FakeDonations {
    async fn fetch_donations(
        &self,
        project_id: &str,
        limit: u32,
        offset: u32,
    ) -> ValuationResult<DonationPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|id| id == project_id) {
            return Err(ValuationError::http("backend", "HTTP 500"));
        }

        let all = self.by_project.get(project_id).cloned().unwrap_or_default();
        let donations = all.iter().skip(offset as usize).take(limit as usize).copied().collect();

        Ok(DonationPage {
            donations,
            total_count: all.len(),
        })
    }
}

// ============================================================================
// DEX, market data, spot price, indexer
// ============================================================================

#[derive(Default)]
pub struct FakePools {
    /// Listed tokens and their quote price
    pub listed: HashMap<String, f64>,
}

impl FakePools {
    pub fn listing(mut self, token: &str, price: f64) -> Self {
        self.listed.insert(token.to_lowercase(), price);
        self
    }
}

#[async_trait]
impl PoolLookup for FakePools {
    async fn get_pool_by_pair(
        &self,
        token_address: &str,
        _quote_token_address: &str,
    ) -> ValuationResult<PoolQuote> {
        Ok(match self.listed.get(&token_address.to_lowercase()) {
            Some(price) => PoolQuote {
                price: *price,
                is_listed: true,
            },
            None => PoolQuote::unlisted(),
        })
    }
}

pub struct FakeMarketData {
    pub data: Option<PoolMarketData>,
    pub requests: AtomicUsize,
}

impl FakeMarketData {
    pub fn new(data: Option<PoolMarketData>) -> Self {
        Self {
            data,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MarketDataSource for FakeMarketData {
    async fn fetch_pools(&self, token_address: &str) -> ValuationResult<PoolMarketData> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.data.ok_or_else(|| ValuationError::NoMarketData {
            token: token_address.to_string(),
        })
    }
}

pub struct FakeSpot {
    pub price: ValuationResult<f64>,
    pub requests: AtomicUsize,
}

impl FakeSpot {
    pub fn new(price: ValuationResult<f64>) -> Self {
        Self {
            price,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpotPriceFeed for FakeSpot {
    async fn fetch_spot_price_usd(&self) -> ValuationResult<f64> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.price.clone()
    }
}

pub struct FakeIndexer {
    pub swaps: ValuationResult<Vec<SwapRecord>>,
    pub requests: AtomicUsize,
}

impl FakeIndexer {
    pub fn new(swaps: ValuationResult<Vec<SwapRecord>>) -> Self {
        Self {
            swaps,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapIndexer for FakeIndexer {
    async fn fetch_swaps(&self, _orchestrator_address: &str) -> ValuationResult<Vec<SwapRecord>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.swaps.clone()
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Fakes shared between a test and the resolver under test
pub struct Harness {
    pub chain: Arc<FakeChain>,
    pub donations: Arc<FakeDonations>,
    pub pools: Arc<FakePools>,
    pub market_data: Arc<FakeMarketData>,
    pub spot: Arc<FakeSpot>,
}

impl Harness {
    pub fn new(chain: FakeChain, donations: FakeDonations) -> Self {
        Self {
            chain: Arc::new(chain),
            donations: Arc::new(donations),
            pools: Arc::new(FakePools::default()),
            market_data: Arc::new(FakeMarketData::new(None)),
            spot: Arc::new(FakeSpot::new(Ok(2.0))),
        }
    }

    pub fn with_pools(mut self, pools: FakePools) -> Self {
        self.pools = Arc::new(pools);
        self
    }

    pub fn with_market_data(mut self, data: PoolMarketData) -> Self {
        self.market_data = Arc::new(FakeMarketData::new(Some(data)));
        self
    }

    pub fn with_spot(mut self, spot: ValuationResult<f64>) -> Self {
        self.spot = Arc::new(FakeSpot::new(spot));
        self
    }

    pub fn ports(&self) -> ResolverPorts {
        ResolverPorts {
            chain: self.chain.clone(),
            donations: self.donations.clone(),
            pools: self.pools.clone(),
            market_data: self.market_data.clone(),
            spot_price: self.spot.clone(),
        }
    }
}
