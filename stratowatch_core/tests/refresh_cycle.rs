//! End-to-end refresh-cycle scenarios: trigger in, fetch out, frame
//! rendered onto a surface, across consecutive generations.

use serde_json::json;
use std::collections::BTreeMap;
use stratowatch_core::overlay::{MapSurface, OverlayHandle, OverlayManager, OverlaySpec};
use stratowatch_core::refresh::{
    Decision, FetchOutcome, RefreshConfig, RefreshController, RefreshTrigger, RenderFrame, Toggle,
};

#[derive(Default)]
struct RecordingSurface {
    next_handle: OverlayHandle,
    drawn: BTreeMap<OverlayHandle, String>,
}

impl MapSurface for RecordingSurface {
    fn add(&mut self, spec: &OverlaySpec) -> OverlayHandle {
        self.next_handle += 1;
        self.drawn.insert(self.next_handle, spec.id.clone());
        self.next_handle
    }

    fn remove(&mut self, handle: OverlayHandle) {
        self.drawn.remove(&handle);
    }
}

/// Drives one trigger through fetch completion, counting issued fetches.
struct Harness {
    controller: RefreshController,
    fetches_issued: usize,
}

impl Harness {
    fn new() -> Self {
        Self {
            controller: RefreshController::new(RefreshConfig::default()),
            fetches_issued: 0,
        }
    }

    fn trigger(&mut self, trigger: RefreshTrigger) -> Option<u64> {
        match self.controller.on_trigger(trigger) {
            Decision::StartFetch { generation, .. } => {
                self.fetches_issued += 1;
                Some(generation)
            }
            Decision::Redraw | Decision::Coalesced => None,
        }
    }

    fn complete(&mut self, generation: u64, doc: serde_json::Value) -> RenderFrame {
        match self.controller.on_fetch_complete(generation, Ok(doc)) {
            FetchOutcome::Applied(frame) => *frame,
            other => panic!("expected Applied, got {other:?}"),
        }
    }
}

fn constellation_doc() -> serde_json::Value {
    // Balloons 0 and 1 are one degree of latitude apart (~111 km, linked);
    // balloon 2 is on another continent
    json!({
        "last_updated": "2025-06-01T12:00:00",
        "balloons": [
            { "id": 0, "path": [[0.0, 0.0]], "velocities": [[30.0, 90.0]] },
            { "id": 1, "path": [[1.0, 0.0]], "velocities": [[70.0, 45.0]] },
            { "id": 2, "path": [[-35.0, 140.0]], "velocities": [[160.0, 270.0]] }
        ]
    })
}

#[test]
fn full_cycle_builds_constellation_and_insights() {
    let mut harness = Harness::new();
    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    let frame = harness.complete(generation, constellation_doc());

    assert_eq!(frame.status.insights.total_balloons, 3);
    assert_eq!(frame.status.insights.active_balloons, 3);
    assert_eq!(frame.status.insights.constellation_links, 1);
    assert_eq!(frame.status.insights.speed_distribution.low, 1);
    assert_eq!(frame.status.insights.speed_distribution.medium, 1);
    assert_eq!(frame.status.insights.speed_distribution.high, 1);
    assert!(frame.overlays.iter().any(|o| o.id == "link-0-1"));
}

#[test]
fn empty_secondary_layer_reports_no_data_not_zero() {
    let mut harness = Harness::new();

    // Layer requested but the feed returns no readings for it
    let generation = harness
        .trigger(RefreshTrigger::Toggle {
            toggle: Toggle::AirQuality,
            enabled: true,
        })
        .unwrap();
    let frame = harness.complete(generation, constellation_doc());

    assert!(frame.status.air_quality.is_none());
    assert!(frame.overlays.iter().all(|o| !o.id.starts_with("air-quality-")));
}

#[test]
fn display_toggle_during_fetch_causes_zero_fetches() {
    let mut harness = Harness::new();
    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    assert_eq!(harness.fetches_issued, 1);

    assert!(harness
        .trigger(RefreshTrigger::Toggle {
            toggle: Toggle::ConstellationLines,
            enabled: false,
        })
        .is_none());
    assert_eq!(harness.fetches_issued, 1);

    let frame = harness.complete(generation, constellation_doc());
    assert!(frame.overlays.iter().all(|o| !o.id.starts_with("link-")));
}

#[test]
fn data_toggles_during_fetch_fold_into_one_request() {
    let mut harness = Harness::new();
    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();

    for toggle in [Toggle::AirQuality, Toggle::AirTraffic] {
        assert!(harness
            .trigger(RefreshTrigger::Toggle {
                toggle,
                enabled: true
            })
            .is_none());
    }
    assert_eq!(harness.fetches_issued, 1);

    harness.complete(generation, constellation_doc());

    // The next cycle requests both layers in a single fetch
    match harness.controller.on_trigger(RefreshTrigger::Timer) {
        Decision::StartFetch { query, .. } => {
            assert!(query.air_quality);
            assert!(query.air_traffic);
            assert!(!query.weather);
        }
        other => panic!("expected StartFetch, got {other:?}"),
    }
}

#[test]
fn consecutive_generations_leave_no_residue_on_surface() {
    let mut harness = Harness::new();
    let mut surface = RecordingSurface::default();
    let mut manager = OverlayManager::new();

    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    let frame_a = harness.complete(generation, constellation_doc());
    manager.render(&frame_a.overlays, &mut surface);
    assert_eq!(surface.drawn.len(), 4);

    // Next snapshot drops balloon 2 and moves balloon 1 out of link range
    let doc_b = json!({
        "last_updated": "2025-06-01T12:15:00",
        "balloons": [
            { "id": 0, "path": [[0.0, 0.0]], "velocities": [[30.0, 90.0]] },
            { "id": 1, "path": [[20.0, 0.0]], "velocities": [[70.0, 45.0]] }
        ]
    });
    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    let frame_b = harness.complete(generation, doc_b);
    manager.render(&frame_b.overlays, &mut surface);

    let drawn: Vec<&str> = surface.drawn.values().map(String::as_str).collect();
    assert_eq!(drawn, vec!["balloon-0", "balloon-1"]);
    assert_eq!(manager.live_count(), 2);
}

#[test]
fn failed_cycle_keeps_the_rendered_surface() {
    let mut harness = Harness::new();
    let mut surface = RecordingSurface::default();
    let mut manager = OverlayManager::new();

    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    let frame = harness.complete(generation, constellation_doc());
    manager.render(&frame.overlays, &mut surface);
    let before: Vec<String> = surface.drawn.values().cloned().collect();

    let generation = harness.trigger(RefreshTrigger::Timer).unwrap();
    let outcome = harness
        .controller
        .on_fetch_complete(generation, Ok(json!({ "not": "a snapshot" })));
    assert!(matches!(outcome, FetchOutcome::Failed(_)));

    // No new frame was produced, so the surface is untouched
    let after: Vec<String> = surface.drawn.values().cloned().collect();
    assert_eq!(before, after);

    // The cached view still renders for display-only changes
    assert!(harness.controller.redraw().is_some());
}
