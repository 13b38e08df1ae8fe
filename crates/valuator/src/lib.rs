pub mod abi;
pub mod batch;
pub mod cache;
pub mod config;
pub mod curve_reader;
pub mod dex;
pub mod donations;
pub mod error;
pub mod freshness;
pub mod graphql;
pub mod indexer;
pub mod ports;
pub mod resolver;
pub mod rpc_client;
pub mod service;
pub mod spot_price;

pub use batch::{BatchResolver, ProjectValuation, ValuationReport};
pub use cache::{CacheKey, ValuationCache};
pub use crate::config::{RetryConfig, ValuatorConfig};
pub use curve_reader::CurveStateReader;
pub use error::{ValuatorError, ValuatorResult};
pub use freshness::PriceFreshnessChecker;
pub use ports::{
    CallOutcome, ChainReader, ContractCall, DonationSource, MarketDataSource, PoolLookup,
    SpotPriceFeed, SwapIndexer,
};
pub use resolver::{MarketCapResolver, ResolverPorts};
pub use service::{PriceRangeReport, Valuator};
