//! Windowed valuation of many projects
//!
//! Projects are valued in fixed-size windows; the valuations of one window run
//! concurrently and the next window starts once all of them finished. A failing
//! project never fails the batch.

use std::sync::Arc;

use futures::future::join_all;
use qacc_types::{MarketCapResult, Project, ValuationError, DEFAULT_BATCH_WINDOW};
use serde::Serialize;
use tracing::{debug, error};

use crate::resolver::MarketCapResolver;

/// Outcome of valuing one project inside a batch
#[derive(Debug, Clone)]
pub struct ProjectValuation {
    pub project_id: String,
    pub outcome: Result<MarketCapResult, ValuationError>,
}

impl ProjectValuation {
    /// Result with failures replaced by the zeroed default
    pub fn market_cap_or_zeroed(&self) -> MarketCapResult {
        self.outcome.clone().unwrap_or_else(|_| MarketCapResult::zeroed())
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Serializable summary, carrying the error text for failed projects
    pub fn report(&self) -> ValuationReport {
        ValuationReport {
            project_id: self.project_id.clone(),
            result: self.market_cap_or_zeroed(),
            error: self.outcome.as_ref().err().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    pub project_id: String,
    #[serde(flatten)]
    pub result: MarketCapResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct BatchResolver {
    resolver: Arc<MarketCapResolver>,
    window: usize,
}

impl BatchResolver {
    pub fn new(resolver: Arc<MarketCapResolver>) -> Self {
        Self {
            resolver,
            window: DEFAULT_BATCH_WINDOW,
        }
    }

    /// Projects awaited together; values below 1 are raised to 1
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Value every project against the current time, preserving input order
    pub async fn resolve_batch(
        &self,
        projects: &[Project],
        lookback_hours: u32,
    ) -> Vec<ProjectValuation> {
        self.run(projects, lookback_hours, None).await
    }

    /// Value every project against `now_ms`, preserving input order
    pub async fn resolve_batch_at(
        &self,
        projects: &[Project],
        lookback_hours: u32,
        now_ms: i64,
    ) -> Vec<ProjectValuation> {
        self.run(projects, lookback_hours, Some(now_ms)).await
    }

    async fn run(
        &self,
        projects: &[Project],
        lookback_hours: u32,
        now_ms: Option<i64>,
    ) -> Vec<ProjectValuation> {
        let mut valuations = Vec::with_capacity(projects.len());

        for (index, window) in projects.chunks(self.window).enumerate() {
            // One spot price serves the whole window.
            let spot = self.resolver.spot_price().await;
            debug!("Valuing window {} ({} projects, spot {})", index, window.len(), spot);

            let outcomes = join_all(window.iter().map(|project| {
                let resolver = &self.resolver;
                async move {
                    match now_ms {
                        Some(now_ms) => {
                            resolver
                                .resolve_at_with_spot(project, lookback_hours, now_ms, spot)
                                .await
                        }
                        None => resolver.resolve_with_spot(project, lookback_hours, spot).await,
                    }
                }
            }))
            .await;

            for (project, outcome) in window.iter().zip(outcomes) {
                if let Err(e) = &outcome {
                    error!("Failed to value project {}: {}", project.id, e);
                }
                valuations.push(ProjectValuation {
                    project_id: project.id.clone(),
                    outcome,
                });
            }
        }

        valuations
    }
}
