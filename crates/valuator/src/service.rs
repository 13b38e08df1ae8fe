use std::sync::Arc;

use qacc_types::{MarketCapResult, TokenPriceRange, TokenPriceRangeStatus};
use serde::Serialize;
use tracing::{debug, info};

use crate::batch::{BatchResolver, ProjectValuation};
use crate::cache::ValuationCache;
use crate::config::ValuatorConfig;
use crate::dex::{AlgebraPoolLookup, GeckoTerminalClient, UnlistedPoolLookup};
use crate::donations::GraphqlDonationSource;
use crate::error::ValuatorResult;
use crate::freshness::PriceFreshnessChecker;
use crate::indexer::GraphqlSwapIndexer;
use crate::ports::{ChainReader, PoolLookup, SwapIndexer};
use crate::resolver::{MarketCapResolver, ResolverPorts};
use crate::rpc_client::EthRpcClient;
use crate::spot_price::CoinGeckoSpotPrice;

/// Price band in native units and USD
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PriceRangeReport {
    pub native: TokenPriceRange,
    pub usd: TokenPriceRange,
    pub spot_price_usd: f64,
}

/// Valuation service wiring configuration to live collaborators
pub struct Valuator {
    config: ValuatorConfig,
    chain: Arc<dyn ChainReader>,
    resolver: Arc<MarketCapResolver>,
    batch: BatchResolver,
    freshness: PriceFreshnessChecker,
}

impl Valuator {
    /// Build adapters for every configured endpoint
    pub fn new(config: ValuatorConfig) -> ValuatorResult<Self> {
        let timeout = config.request_timeout();
        let endpoints = &config.endpoints;

        let chain: Arc<dyn ChainReader> =
            Arc::new(EthRpcClient::new(config.rpc.urls.clone(), timeout, config.retry.clone())?);

        let pools: Arc<dyn PoolLookup> = if config.dex.enabled {
            Arc::new(AlgebraPoolLookup::new(chain.clone(), &config.dex.factory_address))
        } else {
            info!("DEX lookup disabled, all tokens valued from their curves");
            Arc::new(UnlistedPoolLookup)
        };

        let ports = ResolverPorts {
            chain,
            donations: Arc::new(GraphqlDonationSource::new(&endpoints.graphql_url, timeout)?),
            pools,
            market_data: Arc::new(GeckoTerminalClient::new(
                &endpoints.gecko_terminal_url,
                &endpoints.network,
                timeout,
            )?),
            spot_price: Arc::new(CoinGeckoSpotPrice::new(
                &endpoints.coingecko_url,
                &endpoints.spot_asset_id,
                timeout,
            )?),
        };
        let indexer: Arc<dyn SwapIndexer> =
            Arc::new(GraphqlSwapIndexer::new(&endpoints.indexer_url, timeout)?);

        Ok(Self::from_parts(config, ports, indexer))
    }

    /// Build the service over already constructed collaborators
    pub fn from_parts(
        config: ValuatorConfig,
        ports: ResolverPorts,
        indexer: Arc<dyn SwapIndexer>,
    ) -> Self {
        let chain = ports.chain.clone();

        let mut resolver = MarketCapResolver::new(ports, &config.dex.quote_token_address)
            .with_donation_page_size(config.valuation.donation_page_size);
        if let Some(ttl) = config.cache_ttl() {
            resolver = resolver.with_cache(ValuationCache::new(ttl));
        }
        let resolver = Arc::new(resolver);

        let batch = BatchResolver::new(resolver.clone()).with_window(config.valuation.batch_window);
        let freshness = PriceFreshnessChecker::new(indexer, config.valuation.round_grace_secs);

        Self {
            config,
            chain,
            resolver,
            batch,
            freshness,
        }
    }

    pub fn config(&self) -> &ValuatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &MarketCapResolver {
        &self.resolver
    }

    /// Value every configured project
    pub async fn valuate_all(&self) -> Vec<ProjectValuation> {
        let valuations = self
            .batch
            .resolve_batch(&self.config.projects, self.config.valuation.lookback_hours)
            .await;

        let failed = valuations.iter().filter(|v| !v.is_ok()).count();
        info!("Valued {} projects ({} failed)", valuations.len(), failed);

        if let Some(cache) = self.resolver.cache() {
            let purged = cache.purge_expired();
            debug!("Purged {} expired cache entries", purged);
        }

        valuations
    }

    /// Value one configured project
    pub async fn valuate(&self, project_id: &str) -> ValuatorResult<MarketCapResult> {
        let project = self.config.project(project_id)?;
        Ok(self.resolver.resolve(project, self.config.valuation.lookback_hours).await?)
    }

    /// Displayed price band of a project's curve
    pub async fn price_range(&self, project_id: &str) -> ValuatorResult<PriceRangeReport> {
        let project = self.config.project(project_id)?;
        let abc = project
            .abc
            .as_ref()
            .ok_or_else(|| qacc_types::ValuationError::missing_abc(project_id))?;

        let native = self
            .resolver
            .curve_reader()
            .read_price_range(&abc.funding_manager_address)
            .await?;
        let spot_price_usd = self.resolver.spot_price().await;

        Ok(PriceRangeReport {
            native,
            usd: native.to_usd(spot_price_usd),
            spot_price_usd,
        })
    }

    /// Whether a project's price range reflects the last ended round
    pub async fn freshness(&self, project_id: &str) -> ValuatorResult<TokenPriceRangeStatus> {
        let project = self.config.project(project_id)?;
        Ok(self.freshness.status(project, &self.config.rounds).await)
    }

    /// Health check for the chain connection
    pub async fn health_check(&self) -> ValuatorResult<u64> {
        let block = self.chain.block_number().await?;
        debug!("Health check passed - block {}", block);
        Ok(block)
    }
}
