//! Market cap resolution for a single project
//!
//! Listed tokens are valued from DEX aggregator data. Unlisted tokens are
//! valued by replaying the project's donations over its bonding curve, read
//! once per valuation.

use std::sync::Arc;

use chrono::Utc;
use qacc_math::{market_cap_change, replay, to_usd};
use qacc_types::{
    AbcInfo, MarketCapResult, PoolQuote, Project, ValuationError, ValuationResult, ValuationSource,
    DEFAULT_DONATION_PAGE_SIZE,
};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ValuationCache};
use crate::curve_reader::CurveStateReader;
use crate::donations::fetch_all_donations;
use crate::ports::{ChainReader, DonationSource, MarketDataSource, PoolLookup, SpotPriceFeed};
use crate::spot_price::spot_price_or_zero;

/// Collaborators a resolver reads from
#[derive(Clone)]
pub struct ResolverPorts {
    pub chain: Arc<dyn ChainReader>,
    pub donations: Arc<dyn DonationSource>,
    pub pools: Arc<dyn PoolLookup>,
    pub market_data: Arc<dyn MarketDataSource>,
    pub spot_price: Arc<dyn SpotPriceFeed>,
}

pub struct MarketCapResolver {
    curve_reader: CurveStateReader,
    donations: Arc<dyn DonationSource>,
    pools: Arc<dyn PoolLookup>,
    market_data: Arc<dyn MarketDataSource>,
    spot_price: Arc<dyn SpotPriceFeed>,
    /// Token listed tokens are paired with
    quote_token_address: String,
    donation_page_size: u32,
    cache: Option<ValuationCache>,
}

impl MarketCapResolver {
    pub fn new(ports: ResolverPorts, quote_token_address: &str) -> Self {
        Self {
            curve_reader: CurveStateReader::new(ports.chain),
            donations: ports.donations,
            pools: ports.pools,
            market_data: ports.market_data,
            spot_price: ports.spot_price,
            quote_token_address: quote_token_address.to_string(),
            donation_page_size: DEFAULT_DONATION_PAGE_SIZE,
            cache: None,
        }
    }

    pub fn with_donation_page_size(mut self, page_size: u32) -> Self {
        self.donation_page_size = page_size;
        self
    }

    pub fn with_cache(mut self, cache: ValuationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn curve_reader(&self) -> &CurveStateReader {
        &self.curve_reader
    }

    pub fn cache(&self) -> Option<&ValuationCache> {
        self.cache.as_ref()
    }

    /// USD spot price of the native asset, 0 when unavailable
    pub async fn spot_price(&self) -> f64 {
        spot_price_or_zero(self.spot_price.as_ref()).await
    }

    /// Market cap and change over `lookback_hours` ending now
    pub async fn resolve(
        &self,
        project: &Project,
        lookback_hours: u32,
    ) -> ValuationResult<MarketCapResult> {
        self.resolve_cached(project, lookback_hours, None).await
    }

    /// Like `resolve`, converting to USD with an already fetched spot price
    pub async fn resolve_with_spot(
        &self,
        project: &Project,
        lookback_hours: u32,
        spot_price_usd: f64,
    ) -> ValuationResult<MarketCapResult> {
        self.resolve_cached(project, lookback_hours, Some(spot_price_usd)).await
    }

    /// Market cap and change over `lookback_hours` ending at `now_ms`.
    ///
    /// Never read from or written to the cache, whose entries are only valid
    /// for the current time.
    pub async fn resolve_at(
        &self,
        project: &Project,
        lookback_hours: u32,
        now_ms: i64,
    ) -> ValuationResult<MarketCapResult> {
        let (result, _) = self.evaluate(project, lookback_hours, now_ms, None).await?;
        Ok(result)
    }

    /// Like `resolve_at`, converting to USD with an already fetched spot price
    pub async fn resolve_at_with_spot(
        &self,
        project: &Project,
        lookback_hours: u32,
        now_ms: i64,
        spot_price_usd: f64,
    ) -> ValuationResult<MarketCapResult> {
        let (result, _) = self
            .evaluate(project, lookback_hours, now_ms, Some(spot_price_usd))
            .await?;
        Ok(result)
    }

    /// Like `resolve`, with failures zeroed and logged
    pub async fn resolve_or_default(
        &self,
        project: &Project,
        lookback_hours: u32,
    ) -> MarketCapResult {
        match self.resolve(project, lookback_hours).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Valuation of project {} failed, using zero: {}", project.id, e);
                MarketCapResult::zeroed()
            }
        }
    }

    async fn resolve_cached(
        &self,
        project: &Project,
        lookback_hours: u32,
        spot_price_usd: Option<f64>,
    ) -> ValuationResult<MarketCapResult> {
        let now_ms = Utc::now().timestamp_millis();

        let Some(cache) = &self.cache else {
            let (result, _) = self.evaluate(project, lookback_hours, now_ms, spot_price_usd).await?;
            return Ok(result);
        };

        let key = CacheKey::for_project(project, lookback_hours);
        if let Some(cached) = cache.get(&key) {
            debug!("Cache hit for project {}", project.id);
            return Ok(cached);
        }

        let (result, spot_backed) = self
            .evaluate(project, lookback_hours, now_ms, spot_price_usd)
            .await?;
        if spot_backed {
            cache.insert(key, result);
        } else {
            debug!("Not caching project {}: no spot price", project.id);
        }

        Ok(result)
    }

    /// Valuation at `now_ms`, plus whether its USD figures rest on a real spot price
    async fn evaluate(
        &self,
        project: &Project,
        lookback_hours: u32,
        now_ms: i64,
        spot_price_usd: Option<f64>,
    ) -> ValuationResult<(MarketCapResult, bool)> {
        let abc = project
            .abc
            .as_ref()
            .ok_or_else(|| ValuationError::missing_abc(&project.id))?;

        let quote = self
            .pools
            .get_pool_by_pair(&abc.issuance_token_address, &self.quote_token_address)
            .await?;

        let (result, spot_backed) = if quote.is_listed {
            (self.resolve_listed(abc, quote).await?, true)
        } else {
            let spot = match spot_price_usd {
                Some(spot) => spot,
                None => self.spot_price().await,
            };
            let result = self
                .resolve_unlisted(project, abc, lookback_hours, now_ms, spot)
                .await?;
            (result, spot > 0.0)
        };

        info!(
            "Project {} valued at {} ({:?}, {:+.2}%)",
            project.id, result.market_cap, result.source, result.pct_change
        );

        Ok((result, spot_backed))
    }

    /// Native figures are derived from the aggregator's own USD price, so a
    /// missing spot price never zeroes them.
    async fn resolve_listed(
        &self,
        abc: &AbcInfo,
        quote: PoolQuote,
    ) -> ValuationResult<MarketCapResult> {
        let market = self.market_data.fetch_pools(&abc.issuance_token_address).await?;

        let market_cap = if market.price_usd > 0.0 {
            market.fully_diluted_valuation_usd / market.price_usd * quote.price
        } else {
            0.0
        };

        Ok(MarketCapResult {
            market_cap: market_cap.round(),
            pct_change: market.pct_change_24h,
            price: quote.price,
            market_cap_usd: market.fully_diluted_valuation_usd,
            price_usd: market.price_usd,
            source: ValuationSource::DexAggregator,
        })
    }

    async fn resolve_unlisted(
        &self,
        project: &Project,
        abc: &AbcInfo,
        lookback_hours: u32,
        now_ms: i64,
        spot_price_usd: f64,
    ) -> ValuationResult<MarketCapResult> {
        let state = self
            .curve_reader
            .read_curve_state(&abc.funding_manager_address)
            .await?;
        let donations = fetch_all_donations(
            self.donations.as_ref(),
            &project.id,
            self.donation_page_size,
        )
        .await?;

        let outcome = replay(&state, &donations, project.genesis_timestamp_ms)?;
        let latest = *outcome.latest();

        let (pct_change, source) = if outcome.replayed_donations() == 0 {
            (0.0, ValuationSource::InitialPrice)
        } else {
            (
                market_cap_change(&outcome.history, now_ms, lookback_hours)?,
                ValuationSource::CurveReplay,
            )
        };

        Ok(MarketCapResult {
            market_cap: latest.market_cap.round(),
            pct_change,
            price: latest.price,
            market_cap_usd: to_usd(latest.market_cap, spot_price_usd),
            price_usd: to_usd(latest.price, spot_price_usd),
            source,
        })
    }
}
