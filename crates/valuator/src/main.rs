use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::time;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qacc_valuator::config::create_example_config;
use qacc_valuator::{ValuationReport, Valuator, ValuatorConfig};

#[derive(Parser, Debug)]
#[command(name = "qacc-valuator")]
#[command(about = "q/acc bonding curve market cap valuation service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "valuator.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value every configured project and print JSON
    Valuate,

    /// Print the displayed price band of a project
    PriceRange {
        #[arg(short, long)]
        project: String,
    },

    /// Check whether a project's price reflects the last ended round
    Freshness {
        #[arg(short, long)]
        project: String,
    },

    /// Re-value all projects periodically
    Watch {
        /// Interval in seconds
        #[arg(short, long, default_value = "60")]
        interval: u64,
    },

    /// Validate the configuration and exit
    CheckConfig,

    /// Write an example configuration file
    InitConfig {
        #[arg(short, long, default_value = "valuator.toml")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        create_example_config(path).with_context(|| format!("writing example config to {}", path))?;
        println!("Example configuration written to {}", path);
        return Ok(());
    }

    let mut config = ValuatorConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config);

    info!("Starting q/acc valuator");
    info!("RPC endpoints: {}", config.rpc.urls.join(", "));
    info!("Loaded configuration for {} projects", config.projects.len());

    if let Command::CheckConfig = cli.command {
        println!(
            "Configuration OK ({} projects, {} rounds)",
            config.projects.len(),
            config.rounds.len()
        );
        return Ok(());
    }

    let valuator = Valuator::new(config)?;

    match cli.command {
        Command::Valuate => {
            let reports: Vec<ValuationReport> =
                valuator.valuate_all().await.iter().map(|v| v.report()).collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::PriceRange { project } => {
            let report = valuator.price_range(&project).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Freshness { project } => {
            let status = valuator.freshness(&project).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Watch { interval } => watch(&valuator, interval).await,
        Command::CheckConfig | Command::InitConfig { .. } => {}
    }

    Ok(())
}

async fn watch(valuator: &Valuator, interval_secs: u64) {
    info!("Re-valuing every {}s", interval_secs);

    let mut interval_timer = time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut iteration = 0u64;

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down q/acc valuator");
                return;
            }
        }
        iteration += 1;

        debug!("Starting valuation iteration {}", iteration);

        let valuations = valuator.valuate_all().await;
        for valuation in &valuations {
            match &valuation.outcome {
                Ok(result) => info!(
                    "Iteration {}: project {} market cap {} ({:+.2}%)",
                    iteration, valuation.project_id, result.market_cap, result.pct_change
                ),
                Err(e) => error!(
                    "Iteration {}: project {} failed: {}",
                    iteration, valuation.project_id, e
                ),
            }
        }

        if iteration % 100 == 0 {
            info!("Valuator health check - iteration {}", iteration);
            if let Err(e) = valuator.health_check().await {
                warn!("Health check warning: {}", e);
            }
        }
    }
}

fn init_logging(config: &ValuatorConfig) {
    let log_level = config.monitoring.log_level.parse().unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("qacc_valuator={},warn", log_level).into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
