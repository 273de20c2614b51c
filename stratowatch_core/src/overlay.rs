//! Map overlay specifications and the generation-swapping overlay manager.
//!
//! The engine never touches rendering primitives. It emits `OverlaySpec`
//! values describing one complete *generation* of map visuals, and the
//! `OverlayManager` reconciles the live handle set against a `MapSurface`
//! implementation owned by the presentation layer: every handle of the
//! previous generation is retired before any handle of the new one is
//! added, so two generations never coexist and no handle is ever leaked.

use crate::classify::{AqiBucket, SeparationBand};
use serde::{Deserialize, Serialize};

// ============================================================================
// OVERLAY SPECS
// ============================================================================

/// The visual class of one overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayKind {
    /// Point marker at a balloon's current position
    BalloonMarker {
        lat: f64,
        lon: f64,
        speed_kmh: f64,
        heading_deg: f64,
    },
    /// Dashed polyline between two linked balloons
    ConstellationLine { from: [f64; 2], to: [f64; 2] },
    /// Air-quality badge at a balloon's position, colored by AQI band
    AirQualityMarker {
        lat: f64,
        lon: f64,
        aqi: f64,
        band: AqiBucket,
    },
    /// Weather badge at a balloon's position
    WeatherMarker {
        lat: f64,
        lon: f64,
        temperature: f64,
        wind_speed: f64,
    },
    /// Aircraft marker (independent of balloons)
    AircraftMarker {
        lat: f64,
        lon: f64,
        callsign: String,
        altitude_m: Option<f64>,
    },
    /// Encounter badge at a balloon's position, banded by vertical separation
    EncounterMarker {
        lat: f64,
        lon: f64,
        aircraft_callsign: String,
        band: SeparationBand,
    },
}

/// Complete description of one overlay to draw.
///
/// `id` is unique within a generation and stable across generations for the
/// same logical object; `label` is the pre-formatted popup content the
/// presentation layer shows verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub id: String,
    pub kind: OverlayKind,
    pub label: String,
}

// ============================================================================
// MAP SURFACE SEAM
// ============================================================================

/// Opaque handle to one drawn overlay, issued by the surface.
pub type OverlayHandle = u64;

/// The presentation-layer seam: something that can draw and erase overlays.
///
/// Implementations: a real map widget binding in the presentation layer, a
/// logging surface in the agent, a recording surface in tests.
pub trait MapSurface {
    /// Draws one overlay and returns its handle.
    fn add(&mut self, spec: &OverlaySpec) -> OverlayHandle;

    /// Erases a previously drawn overlay.
    fn remove(&mut self, handle: OverlayHandle);
}

// ============================================================================
// OVERLAY MANAGER
// ============================================================================

/// Exclusive owner of the live overlay handle set.
///
/// Exactly one generation of overlays is visible at any time. `render` is
/// idempotent for a given generation input: re-rendering the same specs
/// produces the same surface contents, never an accumulation.
#[derive(Debug, Default)]
pub struct OverlayManager {
    live: Vec<OverlayHandle>,
}

impl OverlayManager {
    /// Creates a manager with no live overlays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the visible generation.
    ///
    /// Retires every overlay of the previous generation first, then draws
    /// the new generation, then installs the new handle set.
    pub fn render<S: MapSurface>(&mut self, generation: &[OverlaySpec], surface: &mut S) {
        for handle in self.live.drain(..) {
            surface.remove(handle);
        }
        let mut next = Vec::with_capacity(generation.len());
        for spec in generation {
            next.push(surface.add(spec));
        }
        self.live = next;
    }

    /// Number of currently live overlays.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
