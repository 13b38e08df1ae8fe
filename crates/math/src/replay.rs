//! Donation replay over a bonding curve
//!
//! Reconstructs the market cap trajectory of a curve from a genesis state and
//! the donations made after it. The replay is a pure fold: identical inputs
//! always produce identical histories.

use qacc_types::{CurveState, DonationEvent, ReplayOutcome, ValuationError, ValuationResult};

use crate::curve::{apply_donation, history_point};

/// Replay `donations` made after `genesis_timestamp_ms` over `initial_state`.
///
/// Donations at or before genesis are assumed folded into the on-chain state
/// and skipped. The rest are applied in ascending `created_at_ms` order; ties
/// keep their input order.
pub fn replay(
    initial_state: &CurveState,
    donations: &[DonationEvent],
    genesis_timestamp_ms: i64,
) -> ValuationResult<ReplayOutcome> {
    let genesis = history_point(initial_state, genesis_timestamp_ms)?;

    let mut pending: Vec<&DonationEvent> = donations
        .iter()
        .filter(|d| d.created_at_ms > genesis_timestamp_ms)
        .collect();
    pending.sort_by_key(|d| d.created_at_ms);

    let mut history = Vec::with_capacity(pending.len() + 1);
    history.push(genesis);

    let final_state = pending.into_iter().try_fold(*initial_state, |state, donation| {
        let next = apply_donation(&state, donation.amount)?;
        history.push(history_point(&next, donation.created_at_ms)?);
        Ok::<_, ValuationError>(next)
    })?;

    Ok(ReplayOutcome {
        final_state,
        history,
    })
}
