//! Minimal GraphQL-over-HTTP client shared by the backend and indexer adapters

use std::time::Duration;

use qacc_types::{ValuationError, ValuationResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

pub struct GraphqlClient {
    http: reqwest::Client,
    url: String,
    /// Service name used in errors and logs
    service: &'static str,
}

impl GraphqlClient {
    pub fn new(url: &str, service: &'static str, timeout: Duration) -> ValuationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValuationError::configuration(service, &e.to_string()))?;

        Ok(Self {
            http,
            url: url.to_string(),
            service,
        })
    }

    /// Run `query` and deserialize its `data` field
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> ValuationResult<T> {
        debug!("GraphQL query to {} ({})", self.service, self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| ValuationError::http(self.service, &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValuationError::http(self.service, &format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ValuationError::http(self.service, &e.to_string()))?;

        parse_response(self.service, body)
    }
}

/// Unwrap a GraphQL envelope, turning reported errors into `Http` errors
pub fn parse_response<T: DeserializeOwned>(service: &str, body: Value) -> ValuationResult<T> {
    let envelope: GraphqlResponse<T> = serde_json::from_value(body)?;

    if let Some(first) = envelope.errors.first() {
        return Err(ValuationError::http(service, &first.message));
    }

    envelope
        .data
        .ok_or_else(|| ValuationError::decode(service, "response has no data"))
}
