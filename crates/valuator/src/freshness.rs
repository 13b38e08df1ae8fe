//! Whether a project's displayed price range still matches on-chain state
//!
//! After a round ends, batch minting settles the round's purchases through
//! swaps on the curve. Until every expected settlement swap shows up in the
//! indexer the previously computed price is stale.

use std::sync::Arc;

use chrono::Utc;
use qacc_types::{same_address, Project, Round, SwapRecord, TokenPriceRangeStatus};
use tracing::{debug, warn};

use crate::ports::SwapIndexer;

pub struct PriceFreshnessChecker {
    indexer: Arc<dyn SwapIndexer>,
    /// Rounds ending within this many millis from now count as ended
    round_grace_ms: i64,
}

impl PriceFreshnessChecker {
    pub fn new(indexer: Arc<dyn SwapIndexer>, round_grace_secs: u64) -> Self {
        Self {
            indexer,
            round_grace_ms: i64::try_from(round_grace_secs.saturating_mul(1000))
                .unwrap_or(i64::MAX),
        }
    }

    pub async fn is_price_up_to_date(&self, project: &Project, rounds: &[Round]) -> bool {
        self.is_price_up_to_date_at(project, rounds, Utc::now().timestamp_millis()).await
    }

    pub async fn is_price_up_to_date_at(
        &self,
        project: &Project,
        rounds: &[Round],
        now_ms: i64,
    ) -> bool {
        let Some(round) = last_ended_round(rounds, now_ms, self.round_grace_ms) else {
            return true;
        };

        if !round.is_batch_minting_executed {
            debug!("Round {} ended but batch minting has not run", round.id);
            return false;
        }

        let Some(abc) = &project.abc else {
            debug!("Project {} has no curve, nothing to settle", project.id);
            return true;
        };

        let expected = project.expected_batch_transactions();

        match self.indexer.fetch_swaps(&abc.orchestrator_address).await {
            Ok(swaps) => {
                let observed = count_settlement_swaps(&swaps, project.recipient_address.as_deref());
                debug!(
                    "Project {}: {} of {} settlement swaps indexed",
                    project.id, observed, expected
                );
                observed >= expected
            }
            Err(e) => {
                warn!("Swap indexer unavailable for project {}, assuming fresh: {}", project.id, e);
                true
            }
        }
    }

    pub async fn status(&self, project: &Project, rounds: &[Round]) -> TokenPriceRangeStatus {
        TokenPriceRangeStatus {
            is_price_up_to_date: self.is_price_up_to_date(project, rounds).await,
        }
    }
}

/// Round with the latest end date among those ended by `now_ms + grace_ms`
pub fn last_ended_round(rounds: &[Round], now_ms: i64, grace_ms: i64) -> Option<&Round> {
    let horizon = now_ms.saturating_add(grace_ms);
    rounds
        .iter()
        .filter(|round| round.end_date_ms <= horizon)
        .max_by_key(|round| round.end_date_ms)
}

/// Swaps a safe made to itself, optionally pinned to the project's recipient
pub fn count_settlement_swaps(swaps: &[SwapRecord], recipient: Option<&str>) -> usize {
    swaps
        .iter()
        .filter(|swap| same_address(&swap.initiator, &swap.recipient))
        .filter(|swap| recipient.map_or(true, |r| same_address(&swap.recipient, r)))
        .count()
}
