//! DEX adapters: on-chain pool listing and aggregator market data
//!
//! A token counts as listed once the Algebra factory knows a pool for it
//! against the quote token. Listed tokens are valued from GeckoTerminal pool
//! data instead of the bonding curve.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qacc_math::price_from_sqrt_x96;
use qacc_types::{
    same_address, PoolMarketData, PoolQuote, ValuationError, ValuationResult, ZERO_ADDRESS,
};
use serde::Deserialize;
use tracing::debug;

use crate::abi::{decode_address, decode_uint};
use crate::ports::{CallOutcome, ChainReader, ContractCall, MarketDataSource, PoolLookup};

pub const POOL_BY_PAIR_SIGNATURE: &str = "poolByPair(address,address)";
pub const GLOBAL_STATE_SIGNATURE: &str = "globalState()";
pub const TOKEN0_SIGNATURE: &str = "token0()";

// ============================================================================
// Pool Lookup
// ============================================================================

/// Pool lookup against an Algebra factory
pub struct AlgebraPoolLookup {
    chain: Arc<dyn ChainReader>,
    factory_address: String,
}

impl AlgebraPoolLookup {
    pub fn new(chain: Arc<dyn ChainReader>, factory_address: &str) -> Self {
        Self {
            chain,
            factory_address: factory_address.to_string(),
        }
    }

    async fn pool_address(
        &self,
        token_address: &str,
        quote_token_address: &str,
    ) -> ValuationResult<String> {
        let call = ContractCall::new(&self.factory_address, POOL_BY_PAIR_SIGNATURE)
            .with_address_arg(token_address)
            .with_address_arg(quote_token_address);

        let outcomes = self.chain.multicall(&[call]).await?;
        let data = success_data("poolByPair", outcomes.first())?;
        decode_address(data, 0)
    }
}

#[async_trait]
impl PoolLookup for AlgebraPoolLookup {
    async fn get_pool_by_pair(
        &self,
        token_address: &str,
        quote_token_address: &str,
    ) -> ValuationResult<PoolQuote> {
        let pool = self.pool_address(token_address, quote_token_address).await?;
        if same_address(&pool, ZERO_ADDRESS) {
            return Ok(PoolQuote::unlisted());
        }

        let calls = [
            ContractCall::new(&pool, GLOBAL_STATE_SIGNATURE),
            ContractCall::new(&pool, TOKEN0_SIGNATURE),
        ];
        let outcomes = self.chain.multicall(&calls).await?;

        let sqrt_price_x96 = decode_uint(success_data("globalState", outcomes.first())?, 0)?;
        let token0 = decode_address(success_data("token0", outcomes.get(1))?, 0)?;

        let price = price_from_sqrt_x96(sqrt_price_x96, same_address(&token0, token_address));
        debug!("Pool {} lists {} at {} quote units", pool, token_address, price);

        Ok(PoolQuote { price, is_listed: true })
    }
}

fn success_data<'a>(function: &str, outcome: Option<&'a CallOutcome>) -> ValuationResult<&'a [u8]> {
    match outcome {
        Some(CallOutcome::Success(data)) => Ok(data.as_slice()),
        Some(CallOutcome::Failure(reason)) => Err(ValuationError::rpc_error(
            &format!("{} failed: {}", function, reason),
            None,
        )),
        None => Err(ValuationError::rpc_error(
            &format!("{} returned no result", function),
            None,
        )),
    }
}

/// Lookup used when no DEX is configured: every token is unlisted
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlistedPoolLookup;

#[async_trait]
impl PoolLookup for UnlistedPoolLookup {
    async fn get_pool_by_pair(
        &self,
        _token_address: &str,
        _quote_token_address: &str,
    ) -> ValuationResult<PoolQuote> {
        Ok(PoolQuote::unlisted())
    }
}

// ============================================================================
// Aggregator Market Data
// ============================================================================

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    data: Vec<PoolEntry>,
}

#[derive(Debug, Deserialize)]
struct PoolEntry {
    attributes: PoolAttributes,
}

#[derive(Debug, Deserialize)]
struct PoolAttributes {
    base_token_price_usd: Option<String>,
    fdv_usd: Option<String>,
    #[serde(default)]
    price_change_percentage: Option<PriceChange>,
}

#[derive(Debug, Deserialize)]
struct PriceChange {
    h24: Option<String>,
}

/// GeckoTerminal token pools endpoint
pub struct GeckoTerminalClient {
    http: reqwest::Client,
    base_url: String,
    network: String,
}

impl GeckoTerminalClient {
    pub fn new(base_url: &str, network: &str, timeout: Duration) -> ValuationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValuationError::configuration("geckoterminal", &e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for GeckoTerminalClient {
    async fn fetch_pools(&self, token_address: &str) -> ValuationResult<PoolMarketData> {
        let url = format!(
            "{}/networks/{}/tokens/{}/pools",
            self.base_url, self.network, token_address
        );
        debug!("Fetching pools: {}", url);

        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ValuationError::http("geckoterminal", &e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValuationError::http(
                "geckoterminal",
                &format!("HTTP {} for {}", response.status(), token_address),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ValuationError::http("geckoterminal", &e.to_string()))?;

        parse_pools(token_address, body)
    }
}

/// First pool's attributes; numeric fields arrive as strings
pub fn parse_pools(
    token_address: &str,
    body: serde_json::Value,
) -> ValuationResult<PoolMarketData> {
    let response: PoolsResponse = serde_json::from_value(body)?;
    let pool = response.data.into_iter().next().ok_or_else(|| ValuationError::NoMarketData {
        token: token_address.to_string(),
    })?;

    let attributes = pool.attributes;
    Ok(PoolMarketData {
        price_usd: parse_decimal(
            "base_token_price_usd",
            attributes.base_token_price_usd.as_deref(),
        )?,
        fully_diluted_valuation_usd: parse_decimal("fdv_usd", attributes.fdv_usd.as_deref())?,
        pct_change_24h: parse_decimal(
            "price_change_percentage.h24",
            attributes.price_change_percentage.and_then(|c| c.h24).as_deref(),
        )?,
    })
}

fn parse_decimal(field: &str, value: Option<&str>) -> ValuationResult<f64> {
    match value {
        None => Ok(0.0),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|e| ValuationError::decode(field, &format!("{}: {}", raw, e))),
    }
}
