use std::fs;
use std::time::Duration;

use qacc_types::{
    AbcInfo, Project, Round, DEFAULT_BATCH_WINDOW, DEFAULT_DONATION_PAGE_SIZE,
    DEFAULT_LOOKBACK_HOURS, DEFAULT_ROUND_GRACE_SECS,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::abi::is_hex_address;
use crate::error::{ValuatorError, ValuatorResult};

/// Environment variable prefix for layered configuration (`QACC__RPC__URLS`)
pub const ENV_PREFIX: &str = "QACC";

/// Valuator configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ValuatorConfig {
    /// JSON-RPC endpoints of the chain hosting the bonding curves
    #[validate]
    pub rpc: RpcConfig,

    /// Retry configuration
    #[validate]
    pub retry: RetryConfig,

    /// HTTP collaborators
    #[validate]
    pub endpoints: EndpointsConfig,

    /// DEX used to detect listed tokens
    pub dex: DexConfig,

    /// Valuation parameters
    #[validate]
    pub valuation: ValuationSettings,

    pub monitoring: MonitoringConfig,

    /// Projects to value
    #[serde(default)]
    pub projects: Vec<Project>,

    /// Funding rounds used by the freshness check
    #[serde(default)]
    pub rounds: Vec<Round>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RpcConfig {
    /// Provider URLs, tried in order on failure
    #[validate(length(min = 1))]
    pub urls: Vec<String>,

    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
}

/// Retry configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetryConfig {
    /// Maximum number of retries for failed operations
    #[validate(range(min = 1, max = 20))]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EndpointsConfig {
    /// Backend GraphQL serving the donation log
    #[validate(url)]
    pub graphql_url: String,

    /// On-chain indexer GraphQL serving swap rows
    #[validate(url)]
    pub indexer_url: String,

    #[validate(url)]
    pub gecko_terminal_url: String,

    /// GeckoTerminal network slug
    pub network: String,

    #[validate(url)]
    pub coingecko_url: String,

    /// CoinGecko id of the native asset
    pub spot_asset_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DexConfig {
    /// When disabled every token is treated as unlisted
    pub enabled: bool,

    /// Algebra factory exposing `poolByPair`
    pub factory_address: String,

    /// Token listed tokens are quoted against (wrapped native asset)
    pub quote_token_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ValuationSettings {
    /// Window for percentage change
    #[validate(range(min = 1, max = 720))]
    pub lookback_hours: u32,

    /// Project valuations awaited together
    #[validate(range(min = 1, max = 50))]
    pub batch_window: usize,

    #[validate(range(min = 1, max = 5000))]
    pub donation_page_size: u32,

    /// Cache lifetime; 0 disables caching
    #[validate(range(max = 86400))]
    pub cache_ttl_secs: u64,

    /// Rounds ending within this window count as ended
    #[validate(range(max = 86400))]
    pub round_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    /// Emit JSON log lines
    pub structured_logging: bool,
}

impl ValuatorConfig {
    /// Load configuration from a TOML file only
    pub fn from_file(path: &str) -> ValuatorResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| {
                ValuatorError::InvalidConfig(format!("Failed to read config file {}: {}", path, e))
            })?;

        let config: ValuatorConfig = toml::from_str(&content)
            .map_err(|e| {
                ValuatorError::InvalidConfig(format!("Failed to parse config file {}: {}", path, e))
            })?;

        config.check()?;

        Ok(config)
    }

    /// Load defaults, then the TOML file, then `QACC__`-prefixed environment overrides
    pub fn load(path: &str) -> ValuatorResult<Self> {
        let defaults = ::config::Config::try_from(&ValuatorConfig::default())?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: ValuatorConfig = settings.try_deserialize()?;
        config.check()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> ValuatorResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Field validation plus cross-field checks
    pub fn check(&self) -> ValuatorResult<()> {
        self.validate()?;
        self.retry.check()?;

        if self.dex.enabled {
            for (name, address) in [
                ("dex.factory_address", &self.dex.factory_address),
                ("dex.quote_token_address", &self.dex.quote_token_address),
            ] {
                if !is_hex_address(address) {
                    return Err(ValuatorError::InvalidConfig(format!(
                        "{} is not an address: {}",
                        name, address
                    )));
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for project in &self.projects {
            if project.id.is_empty() {
                return Err(ValuatorError::InvalidConfig("project id cannot be empty".to_string()));
            }
            if !seen.insert(project.id.as_str()) {
                return Err(ValuatorError::InvalidConfig(format!(
                    "duplicate project id {}",
                    project.id
                )));
            }
            if let Some(abc) = &project.abc {
                check_abc(&project.id, abc)?;
            }
        }

        Ok(())
    }

    /// Look up a configured project by id
    pub fn project(&self, id: &str) -> ValuatorResult<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ValuatorError::UnknownProject(id.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.valuation.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn check_abc(project_id: &str, abc: &AbcInfo) -> ValuatorResult<()> {
    for (name, address) in [
        ("issuance_token_address", &abc.issuance_token_address),
        ("funding_manager_address", &abc.funding_manager_address),
        ("orchestrator_address", &abc.orchestrator_address),
    ] {
        if !is_hex_address(address) {
            return Err(ValuatorError::InvalidConfig(format!(
                "project {}: {} is not an address: {}",
                project_id, name, address
            )));
        }
    }
    Ok(())
}

impl RetryConfig {
    /// Validate retry configuration
    fn check(&self) -> ValuatorResult<()> {
        if self.base_delay_ms == 0 {
            return Err(ValuatorError::InvalidConfig(
                "base_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(ValuatorError::InvalidConfig(format!(
                "max_delay_ms ({}) must be at least base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        if self.backoff_multiplier <= 1.0 {
            return Err(ValuatorError::InvalidConfig(format!(
                "backoff_multiplier ({}) must be greater than 1.0",
                self.backoff_multiplier
            )));
        }

        Ok(())
    }

    /// Calculate delay for retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return self.base_delay_ms;
        }

        let exponential_delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        (exponential_delay as u64).min(self.max_delay_ms)
    }
}

impl Default for ValuatorConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            retry: RetryConfig::default(),
            endpoints: EndpointsConfig::default(),
            dex: DexConfig::default(),
            valuation: ValuationSettings::default(),
            monitoring: MonitoringConfig::default(),
            projects: vec![],
            rounds: vec![],
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            urls: vec!["https://zkevm-rpc.com".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            graphql_url: "http://localhost:4000/graphql".to_string(),
            indexer_url: "http://localhost:8080/v1/graphql".to_string(),
            gecko_terminal_url: "https://api.geckoterminal.com/api/v2".to_string(),
            network: "polygon-zkevm".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            spot_asset_id: "polygon-ecosystem-token".to_string(),
        }
    }
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            factory_address: qacc_types::ZERO_ADDRESS.to_string(),
            quote_token_address: qacc_types::ZERO_ADDRESS.to_string(),
        }
    }
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            batch_window: DEFAULT_BATCH_WINDOW,
            donation_page_size: DEFAULT_DONATION_PAGE_SIZE,
            cache_ttl_secs: 60,
            round_grace_secs: DEFAULT_ROUND_GRACE_SECS,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> ValuatorResult<()> {
    let example_config = ValuatorConfig {
        dex: DexConfig {
            enabled: true,
            factory_address: "0x4444444444444444444444444444444444444444".to_string(),
            quote_token_address: "0x5555555555555555555555555555555555555555".to_string(),
        },
        projects: vec![Project {
            id: "1".to_string(),
            title: "Example Project".to_string(),
            genesis_timestamp_ms: 1_730_000_000_000,
            batch_numbers_with_safe_transactions: vec![1, 2],
            recipient_address: None,
            abc: Some(AbcInfo {
                issuance_token_address: "0x1111111111111111111111111111111111111111".to_string(),
                funding_manager_address: "0x2222222222222222222222222222222222222222".to_string(),
                orchestrator_address: "0x3333333333333333333333333333333333333333".to_string(),
            }),
        }],
        rounds: vec![Round {
            id: "qf-1".to_string(),
            end_date_ms: 1_731_000_000_000,
            is_batch_minting_executed: true,
        }],
        ..ValuatorConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}
