//! Donation log adapter for the q/acc backend GraphQL API

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use qacc_types::{DonationEvent, DonationPage, ValuationError, ValuationResult};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::graphql::GraphqlClient;
use crate::ports::DonationSource;

const DONATIONS_QUERY: &str = r#"
query GetDonationsByProjectId($take: Int, $skip: Int, $projectId: Int!) {
  donationsByProjectId(take: $take, skip: $skip, projectId: $projectId) {
    donations {
      amount
      createdAt
    }
    totalCount
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DonationsData {
    donations_by_project_id: DonationsPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DonationsPayload {
    #[serde(default)]
    donations: Vec<DonationRow>,
    #[serde(default)]
    total_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DonationRow {
    amount: f64,
    created_at: String,
}

/// Donations served by the backend `donationsByProjectId` query
pub struct GraphqlDonationSource {
    client: GraphqlClient,
}

impl GraphqlDonationSource {
    pub fn new(graphql_url: &str, timeout: Duration) -> ValuationResult<Self> {
        Ok(Self {
            client: GraphqlClient::new(graphql_url, "backend", timeout)?,
        })
    }
}

#[async_trait]
impl DonationSource for GraphqlDonationSource {
    async fn fetch_donations(
        &self,
        project_id: &str,
        limit: u32,
        offset: u32,
    ) -> ValuationResult<DonationPage> {
        let numeric_id: i64 = project_id.parse().map_err(|_| {
            ValuationError::invalid_parameter("project_id", project_id, "numeric backend id")
        })?;

        let data: DonationsData = self
            .client
            .query(
                DONATIONS_QUERY,
                json!({ "take": limit, "skip": offset, "projectId": numeric_id }),
            )
            .await?;

        let payload = data.donations_by_project_id;
        let donations = payload
            .donations
            .iter()
            .map(|row| Ok(DonationEvent::new(row.amount, parse_timestamp_ms(&row.created_at)?)))
            .collect::<ValuationResult<Vec<_>>>()?;

        Ok(DonationPage {
            donations,
            total_count: payload.total_count,
        })
    }
}

/// RFC 3339 timestamp or integer milliseconds to unix millis
pub fn parse_timestamp_ms(value: &str) -> ValuationResult<i64> {
    if let Ok(millis) = value.parse::<i64>() {
        return Ok(millis);
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| ValuationError::decode("createdAt", &format!("{}: {}", value, e)))
}

/// Read every page of a project's donation log
pub async fn fetch_all_donations(
    source: &dyn DonationSource,
    project_id: &str,
    page_size: u32,
) -> ValuationResult<Vec<DonationEvent>> {
    if page_size == 0 {
        return Err(ValuationError::invalid_parameter("page_size", "0", "greater than 0"));
    }

    let mut donations = Vec::new();
    let mut offset: u32 = 0;

    loop {
        let page = source.fetch_donations(project_id, page_size, offset).await?;
        if page.donations.is_empty() {
            break;
        }

        offset = offset.saturating_add(page.donations.len() as u32);
        donations.extend(page.donations);

        if donations.len() >= page.total_count {
            break;
        }
    }

    debug!("Fetched {} donations for project {}", donations.len(), project_id);
    Ok(donations)
}
