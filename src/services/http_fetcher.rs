//! HTTP Record Fetcher
//!
//! Fetches row ranges from the backend with `GET <records_url>?from=&to=`.
//! Accepts either a bare JSON array of records or a page object
//! `{ "records": [...], "total": n }`. Cancelling the signal drops the
//! in-flight request.

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::provider::{CancellationSignal, RecordFetcher, RowBatch};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Body of a records response
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsResponse<R> {
    Plain(Vec<R>),
    Page {
        records: Vec<R>,
        #[serde(default)]
        total: Option<usize>,
    },
}

impl<R> From<RecordsResponse<R>> for RowBatch<R> {
    fn from(response: RecordsResponse<R>) -> Self {
        match response {
            RecordsResponse::Plain(records) => RowBatch::new(records),
            RecordsResponse::Page { records, total } => RowBatch { records, total },
        }
    }
}

/// Range fetcher over the backend's HTTP API
pub struct HttpRecordFetcher<R> {
    client: reqwest::Client,
    url: Arc<str>,
    _row: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned + Send + 'static> HttpRecordFetcher<R> {
    /// Create a fetcher for the configured backend
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.records_url().into(),
            _row: PhantomData,
        })
    }

    /// Records endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(
        client: reqwest::Client,
        url: Arc<str>,
        from: usize,
        to: usize,
    ) -> Result<RowBatch<R>> {
        tracing::debug!(url = %url, from, to, "Requesting records");
        let response = client
            .get(url.as_ref())
            .query(&[("from", from), ("to", to)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend {
                message: format!("HTTP {status} for rows [{from}, {to}]"),
            });
        }

        let bytes = response.bytes().await?;
        let body: RecordsResponse<R> = serde_json::from_slice(&bytes)?;
        Ok(body.into())
    }
}

impl<R: DeserializeOwned + Send + 'static> RecordFetcher<R> for HttpRecordFetcher<R> {
    fn fetch(
        &self,
        from: usize,
        to: usize,
        signal: CancellationSignal,
    ) -> BoxFuture<'static, Result<RowBatch<R>>> {
        let request = Self::request(self.client.clone(), self.url.clone(), from, to);
        async move {
            tokio::select! {
                biased;
                reason = signal.cancelled() => {
                    tracing::debug!(from, to, %reason, "Records request aborted");
                    Err(Error::cancelled(reason.as_ref()))
                }
                result = request => result,
            }
        }
        .boxed()
    }
}

impl<R> std::fmt::Debug for HttpRecordFetcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordFetcher")
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CancellationHandle;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response, reporting the request line
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (BackendConfig, oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let _ = tx.send(request.lines().next().unwrap_or_default().to_string());

                let response = format!(
                    "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        let config = BackendConfig {
            base_url: format!("http://{addr}"),
            ..BackendConfig::default()
        };
        (config, rx)
    }

    #[test]
    fn test_decode_plain_and_page() {
        let plain: RecordsResponse<Value> =
            serde_json::from_value(json!([{ "id": 0 }, { "id": 1 }])).expect("plain");
        let batch = RowBatch::from(plain);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.total, None);

        let page: RecordsResponse<Value> =
            serde_json::from_value(json!({ "records": [{ "id": 4 }], "total": 120 }))
                .expect("page");
        let batch = RowBatch::from(page);
        assert_eq!(batch.records, vec![json!({ "id": 4 })]);
        assert_eq!(batch.total, Some(120));
    }

    #[tokio::test]
    async fn test_fetch_sends_range_query() {
        let (config, request_line) =
            serve_once("HTTP/1.1 200 OK", r#"{"records":[{"id":3},{"id":4}],"total":10}"#).await;
        let fetcher = HttpRecordFetcher::<Value>::new(&config).expect("client");

        let batch = fetcher
            .fetch(3, 4, CancellationHandle::new().signal())
            .await
            .expect("fetch");
        assert_eq!(batch.records, vec![json!({ "id": 3 }), json!({ "id": 4 })]);
        assert_eq!(batch.total, Some(10));

        let line = request_line.await.expect("request line");
        assert!(line.starts_with("GET /api/records?from=3&to=4 "), "{line}");
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let (config, _request_line) =
            serve_once("HTTP/1.1 503 Service Unavailable", r#"{"message":"busy"}"#).await;
        let fetcher = HttpRecordFetcher::<Value>::new(&config).expect("client");

        let err = fetcher
            .fetch(0, 9, CancellationHandle::new().signal())
            .await
            .expect_err("status");
        assert!(matches!(err, Error::Backend { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let (config, _request_line) = serve_once("HTTP/1.1 200 OK", r#"{"records": ["#).await;
        let fetcher = HttpRecordFetcher::<Value>::new(&config).expect("client");

        let err = fetcher
            .fetch(0, 1, CancellationHandle::new().signal())
            .await
            .expect_err("malformed");
        assert!(matches!(err, Error::Json { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_signal_aborts_request() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BackendConfig::default()
        };
        let fetcher = HttpRecordFetcher::<Value>::new(&config).expect("client");
        let handle = CancellationHandle::new();
        handle.cancel("superseded");

        let err = fetcher
            .fetch(0, 9, handle.signal())
            .await
            .expect_err("cancelled");
        assert!(err.is_cancelled());
    }
}
