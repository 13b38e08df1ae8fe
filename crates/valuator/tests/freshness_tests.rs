//! Price freshness after round settlement

mod common;

use std::sync::Arc;

use common::*;
use qacc_types::{Round, SwapRecord, ValuationError, DEFAULT_ROUND_GRACE_SECS};
use qacc_valuator::PriceFreshnessChecker;

const NOW_MS: i64 = GENESIS_MS + 100 * HOUR_MS;
const SAFE: &str = "0x9999999999999999999999999999999999999999";

fn ended_round(is_batch_minting_executed: bool) -> Round {
    Round {
        id: "qf-1".to_string(),
        end_date_ms: NOW_MS - 2 * HOUR_MS,
        is_batch_minting_executed,
    }
}

fn settlement_swap() -> SwapRecord {
    SwapRecord {
        swap_type: "BUY".to_string(),
        initiator: SAFE.to_string(),
        recipient: SAFE.to_uppercase().replace("0X", "0x"),
    }
}

fn project_expecting(batches: usize) -> qacc_types::Project {
    let mut project = project(1);
    project.batch_numbers_with_safe_transactions = (1..=batches as u32).collect();
    project
}

fn checker(indexer: &Arc<FakeIndexer>) -> PriceFreshnessChecker {
    PriceFreshnessChecker::new(indexer.clone(), DEFAULT_ROUND_GRACE_SECS)
}

#[tokio::test]
async fn test_no_ended_round_is_fresh() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![])));
    let upcoming = Round {
        id: "qf-2".to_string(),
        end_date_ms: NOW_MS + 48 * HOUR_MS,
        is_batch_minting_executed: false,
    };

    let checker = checker(&indexer);
    let project = project_expecting(2);
    assert!(checker.is_price_up_to_date_at(&project, &[upcoming], NOW_MS).await);
    assert!(checker.is_price_up_to_date_at(&project, &[], NOW_MS).await);
    assert_eq!(indexer.request_count(), 0);
}

#[tokio::test]
async fn test_minting_not_executed_is_stale() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![settlement_swap(); 5])));
    let fresh = checker(&indexer)
        .is_price_up_to_date_at(&project_expecting(1), &[ended_round(false)], NOW_MS)
        .await;

    assert!(!fresh);
}

#[tokio::test]
async fn test_missing_settlement_swaps_are_stale() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![settlement_swap()])));
    let checker = checker(&indexer);
    let rounds = [ended_round(true)];

    assert!(!checker.is_price_up_to_date_at(&project_expecting(2), &rounds, NOW_MS).await);
    assert!(checker.is_price_up_to_date_at(&project_expecting(1), &rounds, NOW_MS).await);
}

#[tokio::test]
async fn test_recipient_filter() {
    let mut other = settlement_swap();
    other.initiator = "0x8888888888888888888888888888888888888888".to_string();
    other.recipient = other.initiator.clone();
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![settlement_swap(), other])));

    let checker = checker(&indexer);
    let rounds = [ended_round(true)];
    let mut project = project_expecting(2);
    assert!(checker.is_price_up_to_date_at(&project, &rounds, NOW_MS).await);

    project.recipient_address = Some(SAFE.to_string());
    assert!(!checker.is_price_up_to_date_at(&project, &rounds, NOW_MS).await);
}

#[tokio::test]
async fn test_indexer_failure_fails_open() {
    let indexer = Arc::new(FakeIndexer::new(Err(ValuationError::http("indexer", "HTTP 502"))));
    let fresh = checker(&indexer)
        .is_price_up_to_date_at(&project_expecting(3), &[ended_round(true)], NOW_MS)
        .await;

    assert!(fresh);
    assert_eq!(indexer.request_count(), 1);
}

#[tokio::test]
async fn test_project_without_curve_is_fresh() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![])));
    let mut project = project_expecting(3);
    project.abc = None;

    assert!(checker(&indexer).is_price_up_to_date_at(&project, &[ended_round(true)], NOW_MS).await);
    assert_eq!(indexer.request_count(), 0);
}

#[tokio::test]
async fn test_round_ending_within_grace_counts_as_ended() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![])));
    let closing = Round {
        id: "qf-2".to_string(),
        end_date_ms: NOW_MS + 5 * 60 * 1000,
        is_batch_minting_executed: false,
    };
    let rounds = [ended_round(true), closing];

    // The closing round is the latest ended one and has not minted yet.
    let up_to_date = checker(&indexer)
        .is_price_up_to_date_at(&project_expecting(0), &rounds, NOW_MS)
        .await;
    assert!(!up_to_date);

    let strict = PriceFreshnessChecker::new(indexer.clone(), 0);
    assert!(strict.is_price_up_to_date_at(&project_expecting(0), &rounds, NOW_MS).await);
}

#[tokio::test]
async fn test_status_wraps_flag() {
    let indexer = Arc::new(FakeIndexer::new(Ok(vec![])));
    let status = checker(&indexer).status(&project_expecting(0), &[]).await;
    assert!(status.is_price_up_to_date);
}
