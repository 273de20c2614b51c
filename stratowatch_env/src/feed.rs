//! Snapshot feed abstraction for the Stratowatch engine.

use crate::error::FeedError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query parameters for one feed request.
///
/// Each optional secondary layer is toggled independently; `bypass_cache`
/// maps to the endpoint's `refresh=true` flag and is set on manual
/// refreshes so the server skips its own cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Request the air-quality secondary layer
    pub air_quality: bool,

    /// Request the weather secondary layer
    pub weather: bool,

    /// Request the aircraft layer plus safety analysis
    pub air_traffic: bool,

    /// Ask the server to bypass any server-side cache
    pub bypass_cache: bool,
}

impl FeedQuery {
    /// Renders the query as URL parameter pairs.
    ///
    /// Only `true` flags are emitted, matching the reference endpoint's
    /// defaults.
    pub fn to_params(&self) -> Vec<(&'static str, &'static str)> {
        let mut params = Vec::new();
        if self.air_quality {
            params.push(("air_quality", "true"));
        }
        if self.weather {
            params.push(("weather", "true"));
        }
        if self.air_traffic {
            params.push(("air_traffic", "true"));
        }
        if self.bypass_cache {
            params.push(("refresh", "true"));
        }
        params
    }
}

/// Abstraction over the inbound `/api/data` snapshot endpoint.
///
/// # Implementations
///
/// - **Production**: an HTTP client with a transport timeout
/// - **Tests**: a scripted feed returning canned documents or failures
///
/// The feed returns the raw JSON document; parsing and validation belong
/// to the engine so a malformed payload is rejected in one place.
#[async_trait]
pub trait SnapshotFeed: Send + Sync + 'static {
    /// Fetches one snapshot document.
    ///
    /// # Returns
    /// * `Ok(value)` - the decoded JSON document, not yet validated
    /// * `Err(FeedError)` - transport or decode failure
    async fn fetch(&self, query: &FeedQuery) -> Result<serde_json::Value, FeedError>;
}
