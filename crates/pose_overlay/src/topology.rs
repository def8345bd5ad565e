//! Bone connectivity for each landmark layout the detectors emit.

use pose_api::LandmarkSource;
use serde::{Deserialize, Serialize};

pub type Edge = (usize, usize);

/// 70-point high-fidelity body. Wrists sit at the end of the hand blocks
/// (41 right, 62 left), not next to the elbows.
pub const HIGH_FIDELITY_EDGES: &[Edge] = &[
    // face fan
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    // arms
    (5, 6),
    (5, 7),
    (7, 62),
    (6, 8),
    (8, 41),
    // torso
    (5, 9),
    (6, 10),
    (9, 10),
    // legs
    (9, 11),
    (11, 13),
    (10, 12),
    (12, 14),
    // feet
    (13, 15),
    (13, 17),
    (14, 18),
    (14, 20),
];

/// 24-joint body-model kinematic tree, child listed second.
pub const BODY_MODEL_EDGES: &[Edge] = &[
    (0, 1),
    (0, 2),
    (0, 3),
    (1, 4),
    (2, 5),
    (3, 6),
    (4, 7),
    (5, 8),
    (6, 9),
    (7, 10),
    (8, 11),
    (9, 12),
    (9, 13),
    (9, 14),
    (12, 15),
    (13, 16),
    (14, 17),
    (16, 18),
    (17, 19),
    (18, 20),
    (19, 21),
    (20, 22),
    (21, 23),
];

/// 33-point generic skeleton.
pub const GENERIC_33_EDGES: &[Edge] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// 17-point generic skeleton.
pub const GENERIC_17_EDGES: &[Edge] = &[
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    (5, 11),
    (6, 12),
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topology {
    HighFidelity,
    BodyModel,
    Generic33,
    Generic17,
}

impl Topology {
    pub fn select(source: LandmarkSource, landmark_count: usize) -> Topology {
        match source {
            LandmarkSource::HighFidelity if landmark_count > 0 => Topology::HighFidelity,
            LandmarkSource::BodyModel | LandmarkSource::BodyModelOriginal
                if landmark_count >= 24 =>
            {
                Topology::BodyModel
            }
            _ if landmark_count >= 33 => Topology::Generic33,
            _ if landmark_count >= 17 => Topology::Generic17,
            // Counts below 17 fall back to the 33-point table; its edges beyond
            // the input are skipped when drawn.
            _ => Topology::Generic33,
        }
    }

    pub fn edges(self) -> &'static [Edge] {
        match self {
            Topology::HighFidelity => HIGH_FIDELITY_EDGES,
            Topology::BodyModel => BODY_MODEL_EDGES,
            Topology::Generic33 => GENERIC_33_EDGES,
            Topology::Generic17 => GENERIC_17_EDGES,
        }
    }
}

pub fn select_topology(source: LandmarkSource, landmark_count: usize) -> &'static [Edge] {
    Topology::select(source, landmark_count).edges()
}

/// Edges whose endpoints both index into a set of `len` landmarks.
pub fn valid_edges(edges: &[Edge], len: usize) -> impl Iterator<Item = Edge> + '_ {
    edges.iter().copied().filter(move |&(a, b)| {
        let valid = a < len && b < len;
        if !valid {
            tracing::trace!("skipping edge ({}, {}) for {} landmarks", a, b, len);
        }
        valid
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_sets_pick_by_count() {
        assert_eq!(Topology::select(LandmarkSource::Generic, 33), Topology::Generic33);
        assert_eq!(Topology::select(LandmarkSource::Generic, 17), Topology::Generic17);
        assert_eq!(Topology::select(LandmarkSource::Generic, 20), Topology::Generic17);
        assert_eq!(Topology::select(LandmarkSource::Generic, 5), Topology::Generic33);
    }

    #[test]
    fn short_body_model_set_uses_generic_rule() {
        assert_eq!(Topology::select(LandmarkSource::BodyModel, 29), Topology::BodyModel);
        assert_eq!(Topology::select(LandmarkSource::BodyModelOriginal, 24), Topology::BodyModel);
        assert_eq!(Topology::select(LandmarkSource::BodyModel, 18), Topology::Generic17);
    }

    #[test]
    fn out_of_range_edges_are_skipped() {
        let edges: Vec<_> = valid_edges(GENERIC_33_EDGES, 17).collect();
        assert!(edges.iter().all(|&(a, b)| a < 17 && b < 17));
        assert!(edges.len() < GENERIC_33_EDGES.len());
        assert_eq!(valid_edges(HIGH_FIDELITY_EDGES, 0).count(), 0);
    }

    #[test]
    fn tables_only_reference_their_own_range() {
        let max = |edges: &[Edge]| edges.iter().map(|&(a, b)| a.max(b)).max().unwrap();
        assert!(max(HIGH_FIDELITY_EDGES) < 70);
        assert_eq!(max(BODY_MODEL_EDGES), 23);
        assert_eq!(max(GENERIC_33_EDGES), 32);
        assert_eq!(max(GENERIC_17_EDGES), 16);
    }
}
