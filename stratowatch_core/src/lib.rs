//! # Stratowatch Core
//!
//! Client-side engine for a live balloon-constellation map: it ingests
//! whole snapshots from an upstream feed, correlates tracked balloons with
//! optional secondary layers (air quality, weather, air traffic), rebuilds
//! the proximity constellation, classifies readings into display bands,
//! and reconciles the visible overlay set against a presentation surface
//! one generation at a time.
//!
//! ## Architecture
//!
//! - [`geo`] — great-circle distance on the spherical Earth model
//! - [`classify`] — pure threshold classifiers (speed, AQI, separation)
//! - [`snapshot`] — wire data model, parse-time validation, single-slot cache
//! - [`constellation`] — proximity-link construction
//! - [`layers`] — pluggable secondary-layer interface and implementations
//! - [`summary`] — statistical summaries with explicit no-data markers
//! - [`overlay`] — overlay specs and the generation-swapping manager
//! - [`refresh`] — the synchronous refresh state machine
//!
//! The engine performs no I/O. Time, task spawning and the feed itself are
//! abstracted behind the traits in `stratowatch_env`, so the whole refresh
//! cycle runs deterministically under test.

pub mod classify;
pub mod constellation;
pub mod geo;
pub mod layers;
pub mod overlay;
pub mod refresh;
pub mod snapshot;
pub mod summary;

pub use classify::{aqi_bucket, separation_band, speed_bucket, AqiBucket, SeparationBand, SpeedBucket};
pub use constellation::{build_links, ConstellationLink, DEFAULT_LINK_THRESHOLD_M};
pub use geo::distance_meters;
pub use layers::{AirQualityLayer, AirTrafficLayer, LayerSummary, SecondaryLayer, WeatherLayer};
pub use overlay::{MapSurface, OverlayHandle, OverlayKind, OverlayManager, OverlaySpec};
pub use refresh::{
    Decision, FetchOutcome, FrameStatus, RefreshConfig, RefreshController, RefreshError,
    RefreshTrigger, RenderFrame, Toggle, ToggleScope, ToggleState,
};
pub use snapshot::{
    Balloon, BalloonId, CacheRead, Snapshot, SnapshotCache, SnapshotError,
};
pub use summary::{
    compute_insights, summarize_air_quality, summarize_weather, AirQualitySummary,
    FlightInsights, MissingPollutantPolicy, WeatherSummary,
};
