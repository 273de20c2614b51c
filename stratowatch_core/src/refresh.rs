//! Refresh state machine and render-frame derivation.
//!
//! The controller is a pure, synchronous state machine: triggers go in,
//! decisions come out, and the async driver (timer, feed I/O, timeout) lives
//! entirely in the host binary. That split keeps every concurrency-sensitive
//! rule here testable without a runtime.
//!
//! Rules enforced:
//! - at most one fetch is ever in flight; triggers arriving while `Fetching`
//!   coalesce into the pending request
//! - display-scope toggles never fetch, they only redraw from cache
//! - every fetch carries a request generation; a response whose generation
//!   is not the in-flight one is discarded unprocessed
//! - a failed or malformed fetch keeps the previous rendered view and
//!   returns the controller to `Idle`, so the periodic timer never wedges

use crate::constellation::{build_links, ConstellationLink, DEFAULT_LINK_THRESHOLD_M};
use crate::layers::{
    AirQualityLayer, AirTrafficLayer, AirTrafficSummary, LayerSummary, SecondaryLayer,
    WeatherLayer,
};
use crate::overlay::{OverlayKind, OverlaySpec};
use crate::snapshot::{FeedInsights, Snapshot, SnapshotCache, SnapshotError};
use crate::summary::{
    compute_insights, AirQualitySummary, FlightInsights, MissingPollutantPolicy, WeatherSummary,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stratowatch_env::{FeedError, FeedQuery};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Where constellation links come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstellationSource {
    /// Use feed-provided links when present, recompute when absent
    #[default]
    FeedThenLocal,
    /// Always recompute locally from current positions
    AlwaysLocal,
}

/// Tuning knobs for the refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Proximity-link threshold in meters
    pub link_threshold_m: f64,
    /// Periodic refresh interval
    pub refresh_interval: Duration,
    /// Per-fetch timeout enforced by the driver
    pub fetch_timeout: Duration,
    pub constellation_source: ConstellationSource,
    pub missing_pollutant_policy: MissingPollutantPolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            link_threshold_m: DEFAULT_LINK_THRESHOLD_M,
            refresh_interval: Duration::from_secs(15 * 60),
            fetch_timeout: Duration::from_secs(10),
            constellation_source: ConstellationSource::default(),
            missing_pollutant_policy: MissingPollutantPolicy::default(),
        }
    }
}

// ============================================================================
// TOGGLES
// ============================================================================

/// Whether flipping a toggle changes the data we need, or only how the data
/// we already hold is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleScope {
    /// Changes the fetch query; requires new data
    Data,
    /// Pure presentation; redraw from cache, never fetch
    Display,
}

/// User-facing toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    AirQuality,
    Weather,
    AirTraffic,
    ConstellationLines,
    MarkerLabels,
}

impl Toggle {
    pub fn scope(&self) -> ToggleScope {
        match self {
            Toggle::AirQuality | Toggle::Weather | Toggle::AirTraffic => ToggleScope::Data,
            Toggle::ConstellationLines | Toggle::MarkerLabels => ToggleScope::Display,
        }
    }
}

/// Current position of every toggle.
#[derive(Debug, Clone, Copy)]
pub struct ToggleState {
    pub air_quality: bool,
    pub weather: bool,
    pub air_traffic: bool,
    pub constellation_lines: bool,
    pub marker_labels: bool,
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            air_quality: false,
            weather: false,
            air_traffic: false,
            constellation_lines: true,
            marker_labels: true,
        }
    }
}

impl ToggleState {
    fn set(&mut self, toggle: Toggle, enabled: bool) {
        match toggle {
            Toggle::AirQuality => self.air_quality = enabled,
            Toggle::Weather => self.weather = enabled,
            Toggle::AirTraffic => self.air_traffic = enabled,
            Toggle::ConstellationLines => self.constellation_lines = enabled,
            Toggle::MarkerLabels => self.marker_labels = enabled,
        }
    }

    /// True when the data layer behind `key` is enabled.
    fn layer_enabled(&self, key: &str) -> bool {
        match key {
            "air_quality" => self.air_quality,
            "weather" => self.weather,
            "air_traffic" => self.air_traffic,
            _ => false,
        }
    }

    fn query(&self, bypass_cache: bool) -> FeedQuery {
        FeedQuery {
            air_quality: self.air_quality,
            weather: self.weather,
            air_traffic: self.air_traffic,
            bypass_cache,
        }
    }
}

// ============================================================================
// TRIGGERS, DECISIONS, OUTCOMES
// ============================================================================

/// An event asking the controller to do something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic timer fired
    Timer,
    /// Explicit user refresh; bypasses upstream caches
    Manual,
    /// A toggle flipped
    Toggle { toggle: Toggle, enabled: bool },
}

/// What the driver must do in response to a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Issue one fetch with this query, then call `on_fetch_complete` with
    /// the same generation
    StartFetch { generation: u64, query: FeedQuery },
    /// Re-render from cache; no network activity
    Redraw,
    /// A fetch is already in flight; the trigger was folded into it
    Coalesced,
}

/// Result of feeding one fetch response back into the controller.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Snapshot applied; render this frame
    Applied(Box<RenderFrame>),
    /// Response generation no longer current; dropped unprocessed
    Stale { generation: u64 },
    /// Fetch or parse failed; previous view stands
    Failed(RefreshError),
}

/// Errors surfaced by a refresh cycle.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

// ============================================================================
// RENDER FRAME
// ============================================================================

/// Summary panel content for one rendered frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameStatus {
    /// Feed timestamp, verbatim
    pub last_updated: String,
    /// Locally recomputed flight statistics
    pub insights: FlightInsights,
    /// The feed's own pre-aggregated statistics, for cross-checking
    pub feed_insights: Option<FeedInsights>,
    pub air_quality: Option<AirQualitySummary>,
    pub weather: Option<WeatherSummary>,
    pub air_traffic: Option<AirTrafficSummary>,
}

/// One complete generation of visuals plus the summary panel.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub overlays: Vec<OverlaySpec>,
    pub status: FrameStatus,
}

// ============================================================================
// CONTROLLER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Fetching { generation: u64 },
}

/// The refresh state machine. Synchronous; the host drives all I/O.
pub struct RefreshController {
    config: RefreshConfig,
    toggles: ToggleState,
    cache: SnapshotCache,
    phase: Phase,
    /// Last issued request generation
    generation: u64,
    layers: Vec<Box<dyn SecondaryLayer>>,
}

impl RefreshController {
    pub fn new(config: RefreshConfig) -> Self {
        Self::with_toggles(config, ToggleState::default())
    }

    /// Creates a controller with toggles pre-set, so the very first fetch
    /// already carries the configured layer flags.
    pub fn with_toggles(config: RefreshConfig, toggles: ToggleState) -> Self {
        let layers: Vec<Box<dyn SecondaryLayer>> = vec![
            Box::new(AirQualityLayer {
                policy: config.missing_pollutant_policy,
            }),
            Box::new(WeatherLayer),
            Box::new(AirTrafficLayer::default()),
        ];
        Self {
            config,
            toggles,
            cache: SnapshotCache::new(),
            phase: Phase::Idle,
            generation: 0,
            layers,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn toggles(&self) -> &ToggleState {
        &self.toggles
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.phase, Phase::Fetching { .. })
    }

    /// Handles one trigger.
    ///
    /// Display-scope toggles always resolve to `Redraw`. Everything else
    /// either starts a fetch or coalesces into the one in flight.
    pub fn on_trigger(&mut self, trigger: RefreshTrigger) -> Decision {
        match trigger {
            RefreshTrigger::Toggle { toggle, enabled } => {
                self.toggles.set(toggle, enabled);
                match toggle.scope() {
                    ToggleScope::Display => Decision::Redraw,
                    ToggleScope::Data => self.start_fetch(false),
                }
            }
            RefreshTrigger::Timer => self.start_fetch(false),
            RefreshTrigger::Manual => self.start_fetch(true),
        }
    }

    fn start_fetch(&mut self, bypass_cache: bool) -> Decision {
        if self.is_fetching() {
            return Decision::Coalesced;
        }
        self.generation += 1;
        self.phase = Phase::Fetching {
            generation: self.generation,
        };
        Decision::StartFetch {
            generation: self.generation,
            query: self.toggles.query(bypass_cache),
        }
    }

    /// Feeds one fetch response back in.
    ///
    /// Responses are matched against the in-flight generation; anything
    /// else is stale and dropped without touching the cache. On success the
    /// snapshot replaces the cache slot atomically and a full frame is
    /// derived; on failure the cache and the visible frame are untouched.
    pub fn on_fetch_complete(
        &mut self,
        generation: u64,
        result: Result<serde_json::Value, FeedError>,
    ) -> FetchOutcome {
        match self.phase {
            Phase::Fetching { generation: current } if current == generation => {}
            _ => return FetchOutcome::Stale { generation },
        }
        self.phase = Phase::Idle;

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => return FetchOutcome::Failed(e.into()),
        };
        let snapshot = match Snapshot::from_value(payload) {
            Ok(snapshot) => snapshot,
            Err(e) => return FetchOutcome::Failed(e.into()),
        };
        self.cache.set(snapshot);

        match self.redraw() {
            Some(frame) => FetchOutcome::Applied(Box::new(frame)),
            // unreachable in practice: the cache was just set
            None => FetchOutcome::Stale { generation },
        }
    }

    /// Derives a frame from the cached snapshot. `None` before the first
    /// successful fetch; the caller renders its own empty state.
    pub fn redraw(&self) -> Option<RenderFrame> {
        let snapshot = self.cache.get().ready()?;
        Some(self.build_frame(snapshot))
    }

    fn constellation(&self, snapshot: &Snapshot) -> Vec<ConstellationLink> {
        match (&self.config.constellation_source, &snapshot.constellation) {
            (ConstellationSource::FeedThenLocal, Some(pairs)) => {
                let mut links: Vec<ConstellationLink> =
                    pairs.iter().map(|&p| ConstellationLink::from(p)).collect();
                links.sort_by_key(|l| (l.a, l.b));
                links
            }
            _ => build_links(&snapshot.balloons, self.config.link_threshold_m),
        }
    }

    fn build_frame(&self, snapshot: &Snapshot) -> RenderFrame {
        let mut overlays = Vec::new();

        for balloon in snapshot.active_balloons() {
            let pos = match balloon.current_position() {
                Some(pos) => pos,
                None => continue,
            };
            let (speed, heading) = balloon.current_velocity().unwrap_or((0.0, 0.0));
            let label = if self.toggles.marker_labels {
                format!(
                    "Balloon {}\nPosition: {:.4}, {:.4}\nSpeed: {speed:.1} km/h\nHeading: {heading:.0}°\nTrack points: {}",
                    balloon.id,
                    pos[0],
                    pos[1],
                    balloon.path.len(),
                )
            } else {
                String::new()
            };
            overlays.push(OverlaySpec {
                id: format!("balloon-{}", balloon.id),
                kind: OverlayKind::BalloonMarker {
                    lat: pos[0],
                    lon: pos[1],
                    speed_kmh: speed,
                    heading_deg: heading,
                },
                label,
            });
        }

        let links = self.constellation(snapshot);
        if self.toggles.constellation_lines {
            for link in &links {
                let from = snapshot.balloons.get(link.a).and_then(|b| b.current_position());
                let to = snapshot.balloons.get(link.b).and_then(|b| b.current_position());
                let (Some(from), Some(to)) = (from, to) else { continue };
                overlays.push(OverlaySpec {
                    id: format!("link-{}-{}", link.a, link.b),
                    kind: OverlayKind::ConstellationLine { from, to },
                    label: String::new(),
                });
            }
        }

        let mut status = FrameStatus {
            last_updated: snapshot.last_updated.clone(),
            insights: compute_insights(&snapshot.balloons, links.len() as u32),
            feed_insights: snapshot.insights.clone(),
            air_quality: None,
            weather: None,
            air_traffic: None,
        };

        for layer in &self.layers {
            if !self.toggles.layer_enabled(layer.key()) {
                continue;
            }
            overlays.extend(layer.load_markers(snapshot));
            match layer.summarize(snapshot) {
                LayerSummary::AirQuality(s) => status.air_quality = s,
                LayerSummary::Weather(s) => status.weather = s,
                LayerSummary::AirTraffic(s) => status.air_traffic = s,
            }
        }

        RenderFrame { overlays, status }
    }
}
