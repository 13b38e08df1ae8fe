//! Native asset USD spot price

use std::time::Duration;

use async_trait::async_trait;
use qacc_types::{ValuationError, ValuationResult};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ports::SpotPriceFeed;

/// CoinGecko `simple/price` feed
pub struct CoinGeckoSpotPrice {
    http: reqwest::Client,
    base_url: String,
    asset_id: String,
}

impl CoinGeckoSpotPrice {
    pub fn new(base_url: &str, asset_id: &str, timeout: Duration) -> ValuationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValuationError::configuration("coingecko", &e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            asset_id: asset_id.to_string(),
        })
    }
}

#[async_trait]
impl SpotPriceFeed for CoinGeckoSpotPrice {
    async fn fetch_spot_price_usd(&self) -> ValuationResult<f64> {
        let url = format!("{}/simple/price", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| ValuationError::http("coingecko", &e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValuationError::http("coingecko", &format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ValuationError::http("coingecko", &e.to_string()))?;

        let price = parse_simple_price(&body, &self.asset_id)?;
        debug!("Spot price of {}: {} USD", self.asset_id, price);
        Ok(price)
    }
}

/// `{ "<asset>": { "usd": <price> } }`
pub fn parse_simple_price(body: &Value, asset_id: &str) -> ValuationResult<f64> {
    body.get(asset_id)
        .and_then(|asset| asset.get("usd"))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            ValuationError::decode("coingecko", &format!("no usd price for {}", asset_id))
        })
}

/// Spot price, or 0 when the feed fails
pub async fn spot_price_or_zero(feed: &dyn SpotPriceFeed) -> f64 {
    match feed.fetch_spot_price_usd().await {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        Ok(price) => {
            warn!("Ignoring invalid spot price {}", price);
            0.0
        }
        Err(e) => {
            warn!("Spot price unavailable, USD figures will be 0: {}", e);
            0.0
        }
    }
}
