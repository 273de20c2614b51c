//! Proximity graph (constellation) construction.
//!
//! Links every unordered pair of active balloons whose current positions
//! lie within a distance threshold. Rebuilt from scratch for every
//! snapshot; links are never mutated incrementally.

use crate::geo::distance_meters;
use crate::snapshot::Balloon;
use serde::{Deserialize, Serialize};

/// Default link threshold: 500 km.
pub const DEFAULT_LINK_THRESHOLD_M: f64 = 500_000.0;

/// A proximity edge between two tracked balloons, stored as the unordered
/// index pair `(a, b)` with `a < b` into the snapshot's balloon list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstellationLink {
    pub a: usize,
    pub b: usize,
}

impl From<[usize; 2]> for ConstellationLink {
    fn from(pair: [usize; 2]) -> Self {
        Self {
            a: pair[0].min(pair[1]),
            b: pair[0].max(pair[1]),
        }
    }
}

/// Builds the constellation over the given balloons.
///
/// Only balloons with a current fix participate; a pair is linked iff the
/// great-circle distance between current positions is strictly below
/// `threshold_m`. Output is sorted ascending by `(a, b)` for deterministic
/// downstream rendering and testing. O(n²), acceptable for the tens to low
/// hundreds of balloons the feed carries.
pub fn build_links(balloons: &[Balloon], threshold_m: f64) -> Vec<ConstellationLink> {
    let positions: Vec<Option<[f64; 2]>> =
        balloons.iter().map(|b| b.current_position()).collect();

    let mut links = Vec::new();
    for i in 0..positions.len() {
        let Some(pos_i) = positions[i] else { continue };
        for (j, pos_j) in positions.iter().enumerate().skip(i + 1) {
            let Some(pos_j) = pos_j else { continue };
            let dist = distance_meters(pos_i[0], pos_i[1], pos_j[0], pos_j[1]);
            if dist < threshold_m {
                links.push(ConstellationLink { a: i, b: j });
            }
        }
    }
    links
}
