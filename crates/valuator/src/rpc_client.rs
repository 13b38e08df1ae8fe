//! Lightweight EVM JSON-RPC client
//!
//! Implements only what the valuator reads: `eth_blockNumber` and batched
//! `eth_call`s pinned to a single block. Provider URLs are tried in turn with
//! exponential backoff between attempts.

use std::time::Duration;

use async_trait::async_trait;
use qacc_types::{ValuationError, ValuationResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::abi::{encode_call, from_hex_data, parse_quantity, to_hex_data};
use crate::config::RetryConfig;
use crate::ports::{CallOutcome, ChainReader, ContractCall};

/// JSON-RPC client with provider failover
pub struct EthRpcClient {
    http: reqwest::Client,
    urls: Vec<String>,
    retry: RetryConfig,
}

/// RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Value,
    result: Option<Value>,
    error: Option<RpcError>,
}

/// RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl EthRpcClient {
    /// Create a client over one or more provider URLs
    pub fn new(urls: Vec<String>, timeout: Duration, retry: RetryConfig) -> ValuationResult<Self> {
        if urls.is_empty() {
            return Err(ValuationError::configuration(
                "rpc",
                "at least one provider URL is required",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValuationError::configuration("rpc", &e.to_string()))?;

        Ok(Self { http, urls, retry })
    }

    /// Make a single JSON-RPC call
    pub async fn call(&self, method: &str, params: Value) -> ValuationResult<Value> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!("RPC call: {} with params: {}", method, request_body["params"]);

        let response: RpcResponse = serde_json::from_value(self.send(&request_body).await?)?;

        if let Some(error) = response.error {
            return Err(ValuationError::rpc_error(&error.message, Some(error.code)));
        }

        response
            .result
            .ok_or_else(|| ValuationError::rpc_error("No result in RPC response", None))
    }

    /// Latest block number
    pub async fn latest_block(&self) -> ValuationResult<u64> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| ValuationError::decode("eth_blockNumber", "result is not a string"))?;
        parse_quantity(quantity)
    }

    /// Execute `calls` as one JSON-RPC batch of `eth_call`s at `block`
    pub async fn batch_eth_call(
        &self,
        calls: &[ContractCall],
        block: u64,
    ) -> ValuationResult<Vec<CallOutcome>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let body = build_batch_body(calls, block)?;
        debug!("RPC batch: {} eth_call(s) at block {}", calls.len(), block);

        let response = self.send(&body).await?;
        parse_batch_response(response, calls.len())
    }

    /// POST a body, failing over across providers with backoff
    async fn send(&self, body: &Value) -> ValuationResult<Value> {
        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            let url = &self.urls[attempt as usize % self.urls.len()];

            match self.post(url, body).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("RPC attempt {} against {} failed: {}", attempt + 1, url, e);
                    last_error = Some(e);

                    if attempt < self.retry.max_retries {
                        let delay = self.retry.delay_for_attempt(attempt);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ValuationError::rpc_error("no RPC attempt made", None)))
    }

    async fn post(&self, url: &str, body: &Value) -> ValuationResult<Value> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ValuationError::http("rpc", &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValuationError::http("rpc", &format!("{} returned {}", url, status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ValuationError::http("rpc", &format!("invalid body from {}: {}", url, e)))
    }
}

#[async_trait]
impl ChainReader for EthRpcClient {
    async fn block_number(&self) -> ValuationResult<u64> {
        self.latest_block().await
    }

    async fn multicall(&self, calls: &[ContractCall]) -> ValuationResult<Vec<CallOutcome>> {
        let block = self.latest_block().await?;
        self.batch_eth_call(calls, block).await
    }
}

/// JSON-RPC batch body; request ids are call indexes
pub fn build_batch_body(calls: &[ContractCall], block: u64) -> ValuationResult<Value> {
    let block_tag = format!("0x{:x}", block);

    let requests = calls
        .iter()
        .enumerate()
        .map(|(index, call)| {
            let args: Vec<&str> = call.address_args.iter().map(String::as_str).collect();
            let data = encode_call(call.signature, &args)?;
            Ok(json!({
                "jsonrpc": "2.0",
                "id": index,
                "method": "eth_call",
                "params": [{ "to": call.address, "data": to_hex_data(&data) }, block_tag],
            }))
        })
        .collect::<ValuationResult<Vec<Value>>>()?;

    Ok(Value::Array(requests))
}

/// Match batch responses back to call indexes, in any response order
pub fn parse_batch_response(response: Value, expected: usize) -> ValuationResult<Vec<CallOutcome>> {
    let responses: Vec<RpcResponse> = match response {
        Value::Array(_) => serde_json::from_value(response)?,
        other => {
            // Some providers answer a rejected batch with a single error object.
            let single: RpcResponse = serde_json::from_value(other)?;
            let message = single
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "non-batch response".to_string());
            return Err(ValuationError::rpc_error(&message, None));
        }
    };

    let mut outcomes = vec![CallOutcome::Failure("no response for call".to_string()); expected];

    for response in responses {
        let index = response.id.as_u64().map(|id| id as usize);
        let Some(index) = index.filter(|id| *id < expected) else {
            continue;
        };

        outcomes[index] = match (response.error, response.result) {
            (Some(error), _) => {
                CallOutcome::Failure(format!("{} (code {})", error.message, error.code))
            }
            (None, Some(Value::String(data))) => match from_hex_data(&data) {
                Ok(bytes) if bytes.is_empty() => {
                    CallOutcome::Failure("empty return data".to_string())
                }
                Ok(bytes) => CallOutcome::Success(bytes),
                Err(e) => CallOutcome::Failure(e.to_string()),
            },
            (None, _) => CallOutcome::Failure("missing result".to_string()),
        };
    }

    Ok(outcomes)
}
