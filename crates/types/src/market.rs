//! Project, round and market records consumed by the valuation services

use serde::{Deserialize, Serialize};

use crate::curve::DonationEvent;

// ============================================================================
// Project Metadata
// ============================================================================

/// Bonding curve deployment of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbcInfo {
    /// ERC-20 issuance token minted by the curve
    pub issuance_token_address: String,
    /// Funding manager, the bonding curve contract itself
    pub funding_manager_address: String,
    /// Orchestrator identifying the curve in the swap indexer
    pub orchestrator_address: String,
}

/// Valuation inputs for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Timestamp of the curve state the replay starts from (unix millis)
    #[serde(default)]
    pub genesis_timestamp_ms: i64,
    /// Batch numbers settled through the project's safe
    #[serde(default)]
    pub batch_numbers_with_safe_transactions: Vec<u32>,
    /// Recipient expected on batch-settlement swaps, if the project pins one
    #[serde(default)]
    pub recipient_address: Option<String>,
    /// Bonding curve deployment, absent before launch
    #[serde(default)]
    pub abc: Option<AbcInfo>,
}

impl Project {
    /// Number of batch-settlement swaps expected on-chain
    pub fn expected_batch_transactions(&self) -> usize {
        self.batch_numbers_with_safe_transactions.len()
    }
}

/// Funding round lifecycle metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: String,
    /// Round end date (unix millis)
    pub end_date_ms: i64,
    #[serde(default)]
    pub is_batch_minting_executed: bool,
}

// ============================================================================
// Collaborator Records
// ============================================================================

/// One page of a project's donation log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationPage {
    pub donations: Vec<DonationEvent>,
    pub total_count: usize,
}

/// Swap row reported by the on-chain indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecord {
    pub swap_type: String,
    pub initiator: String,
    pub recipient: String,
}

/// Pool listing status for a token pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolQuote {
    /// Token price in quote-token units, 0 when unlisted
    pub price: f64,
    pub is_listed: bool,
}

impl PoolQuote {
    pub fn unlisted() -> Self {
        Self {
            price: 0.0,
            is_listed: false,
        }
    }
}

/// Aggregator market data for a listed token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolMarketData {
    pub price_usd: f64,
    pub fully_diluted_valuation_usd: f64,
    pub pct_change_24h: f64,
}

/// Compare two hex addresses ignoring checksum casing
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
