//! Swap rows from the on-chain indexer

use std::time::Duration;

use async_trait::async_trait;
use qacc_types::{SwapRecord, ValuationResult};
use serde::Deserialize;
use serde_json::json;

use crate::graphql::GraphqlClient;
use crate::ports::SwapIndexer;

const SWAPS_QUERY: &str = r#"
query GetSwaps($orchestrator: String!) {
  Swap(where: { orchestrator: { _eq: $orchestrator } }) {
    swapType
    initiator
    recipient
  }
}
"#;

#[derive(Debug, Deserialize)]
struct SwapsData {
    #[serde(rename = "Swap", default)]
    swaps: Vec<SwapRecord>,
}

/// Indexer GraphQL endpoint serving `Swap` rows per orchestrator
pub struct GraphqlSwapIndexer {
    client: GraphqlClient,
}

impl GraphqlSwapIndexer {
    pub fn new(indexer_url: &str, timeout: Duration) -> ValuationResult<Self> {
        Ok(Self {
            client: GraphqlClient::new(indexer_url, "indexer", timeout)?,
        })
    }
}

#[async_trait]
impl SwapIndexer for GraphqlSwapIndexer {
    async fn fetch_swaps(&self, orchestrator_address: &str) -> ValuationResult<Vec<SwapRecord>> {
        let data: SwapsData = self
            .client
            .query(SWAPS_QUERY, json!({ "orchestrator": orchestrator_address.to_lowercase() }))
            .await?;
        Ok(data.swaps)
    }
}
