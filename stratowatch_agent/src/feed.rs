//! HTTP-backed snapshot feed.

use async_trait::async_trait;
use std::time::Duration;
use stratowatch_env::{FeedError, FeedQuery, SnapshotFeed};

/// Production `SnapshotFeed` talking to the snapshot endpoint over HTTP.
///
/// The transport timeout is enforced here as well as by the driver, so a
/// hung connection surfaces as `FeedError::Timeout` either way.
pub struct HttpSnapshotFeed {
    client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl HttpSnapshotFeed {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> FeedError {
        if error.is_timeout() {
            FeedError::Timeout(self.timeout_ms)
        } else {
            FeedError::network(error.to_string())
        }
    }
}

#[async_trait]
impl SnapshotFeed for HttpSnapshotFeed {
    async fn fetch(&self, query: &FeedQuery) -> Result<serde_json::Value, FeedError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::network(format!(
                "{} returned HTTP {status}",
                self.endpoint
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FeedError::decode(e.to_string()))
    }
}
