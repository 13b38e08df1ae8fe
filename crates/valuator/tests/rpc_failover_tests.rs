//! JSON-RPC provider failover against local HTTP endpoints

use std::sync::{Arc, Mutex};
use std::time::Duration;

use qacc_types::ValuationError;
use qacc_valuator::rpc_client::EthRpcClient;
use qacc_valuator::RetryConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Hits = Arc<Mutex<Vec<&'static str>>>;

const BLOCK_42: &str = r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#;

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
    }
}

/// Serve every request with a fixed status and body, recording `name` per request
async fn spawn_endpoint(
    name: &'static str,
    status: &'static str,
    body: &'static str,
    hits: Hits,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let hits = hits.clone();
            tokio::spawn(async move {
                respond(stream, name, status, body, hits).await;
            });
        }
    });

    url
}

async fn respond(mut stream: TcpStream, name: &'static str, status: &str, body: &str, hits: Hits) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    // Headers, then as much body as Content-Length announces
    let header_end = loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);
        if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while request.len() < header_end + content_length {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }

    hits.lock().unwrap().push(name);

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn client(urls: Vec<String>, retry: RetryConfig) -> EthRpcClient {
    EthRpcClient::new(urls, Duration::from_secs(5), retry).unwrap()
}

#[tokio::test]
async fn test_fails_over_to_next_provider() {
    let hits = Hits::default();
    let primary = spawn_endpoint("primary", "503 Service Unavailable", "", hits.clone()).await;
    let fallback = spawn_endpoint("fallback", "200 OK", BLOCK_42, hits.clone()).await;

    let block = client(vec![primary, fallback], fast_retry(3))
        .latest_block()
        .await
        .unwrap();

    assert_eq!(block, 42);
    assert_eq!(*hits.lock().unwrap(), ["primary", "fallback"]);
}

#[tokio::test]
async fn test_unreachable_provider_is_skipped() {
    let hits = Hits::default();
    // Bound then released, so nothing listens there.
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let fallback = spawn_endpoint("fallback", "200 OK", BLOCK_42, hits.clone()).await;

    let block = client(vec![dead, fallback], fast_retry(1))
        .latest_block()
        .await
        .unwrap();

    assert_eq!(block, 42);
    assert_eq!(*hits.lock().unwrap(), ["fallback"]);
}

#[tokio::test]
async fn test_providers_alternate_until_retries_run_out() {
    let hits = Hits::default();
    let primary = spawn_endpoint("primary", "502 Bad Gateway", "", hits.clone()).await;
    let fallback = spawn_endpoint("fallback", "503 Service Unavailable", "", hits.clone()).await;

    let err = client(vec![primary, fallback], fast_retry(3))
        .latest_block()
        .await
        .unwrap_err();

    assert!(matches!(err, ValuationError::Http { .. }));
    assert_eq!(*hits.lock().unwrap(), ["primary", "fallback", "primary", "fallback"]);
}

#[tokio::test]
async fn test_single_provider_is_retried() {
    let hits = Hits::default();
    let only = spawn_endpoint("only", "500 Internal Server Error", "", hits.clone()).await;

    let result = client(vec![only], fast_retry(2)).latest_block().await;

    assert!(result.is_err());
    assert_eq!(hits.lock().unwrap().len(), 3);
}
