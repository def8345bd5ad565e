use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ingest::*;

mod ingest;

/// Number of joints in a body-model rotation block.
pub const BODY_POSE_JOINTS: usize = 24;

#[derive(Error, Debug)]
pub enum PoseApiError {
    #[error("invalid pose JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the numbers of a landmark set map onto the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateConvention {
    /// Absolute pixels in the original image.
    GlobalPixel,
    /// `[0, 1]` of the full image.
    NormalizedUnit,
    /// `[0, 1]` inside the body bounding box.
    BBoxRelativeUnit,
    /// Signed offsets from the bounding-box center, in units of the landmark y-range.
    BBoxCenteredSigned,
    /// Pixels of the 192x256 detector input crop taken from the bounding box.
    DetectorInputPixel,
    /// Pixels of the full image, for sets that carry no bounding box.
    ImagePixel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LandmarkJson {
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: Option<f32>,
        #[serde(default)]
        visibility: Option<f32>,
    },
    Tuple(Vec<f32>),
    /// Anything else, including objects with `null` or non-numeric coordinates.
    Other(serde_json::Value),
}

/// A field that reads as [`Lenient::Invalid`] instead of failing the whole
/// frame when its JSON has the wrong shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(serde_json::Value),
}

impl<T> Lenient<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        }
    }
}

/// Per-set convention tags written by whichever producer emitted the frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConventionTags {
    #[serde(default)]
    pub landmarks: Option<CoordinateConvention>,
    #[serde(default)]
    pub high_fidelity_joints_2d: Option<CoordinateConvention>,
    #[serde(default)]
    pub body_joints_2d: Option<CoordinateConvention>,
    #[serde(default)]
    pub body_joints_2d_orig: Option<CoordinateConvention>,
}

/// One frame as it arrives over the wire. Every array is dense and index-addressed,
/// so `null` entries are kept as placeholders. A malformed field or element is
/// dropped on its own and never fails the frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseFrameJson {
    #[serde(default)]
    pub frame_index: Option<Lenient<u32>>,
    #[serde(default)]
    pub timestamp_ms: Option<Lenient<f64>>,
    #[serde(default)]
    pub landmarks: Option<Lenient<Vec<Option<LandmarkJson>>>>,
    #[serde(default, alias = "mhr_joints_2d")]
    pub high_fidelity_joints_2d: Option<Lenient<Vec<Option<LandmarkJson>>>>,
    #[serde(default, alias = "smpl_joints_2d")]
    pub body_joints_2d: Option<Lenient<Vec<Option<LandmarkJson>>>>,
    #[serde(default, alias = "smpl_joints_2d_orig")]
    pub body_joints_2d_orig: Option<Lenient<Vec<Option<LandmarkJson>>>>,
    #[serde(default, alias = "smpl_bbox")]
    pub body_bbox: Option<Lenient<Vec<f32>>>,
    #[serde(default, alias = "smpl_pose")]
    pub body_pose: Option<Lenient<Vec<Lenient<Vec<Vec<f32>>>>>>,
    #[serde(default)]
    pub conventions: Option<Lenient<ConventionTags>>,
}

/// An operator-supplied rotation override, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerDegrees {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl EulerDegrees {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// `frameIndex -> jointIndex -> euler`, the body sent when corrections are saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionsPayload {
    pub corrections: BTreeMap<u32, BTreeMap<u32, EulerDegrees>>,
}

impl CorrectionsPayload {
    pub fn correction_count(&self) -> usize {
        self.corrections.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCorrectionsResponse {
    pub status: SaveStatus,
    pub message: String,
    #[serde(default)]
    pub corrections_count: Option<usize>,
}

impl SaveCorrectionsResponse {
    /// Only a full success lets the client drop its in-memory corrections.
    pub fn is_success(&self) -> bool {
        self.status == SaveStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrections_payload_uses_string_keys() {
        let json = r#"{"corrections":{"12":{"16":{"x":0,"y":0,"z":90},"18":{"x":10}}}}"#;
        let payload: CorrectionsPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.correction_count(), 2);
        assert_eq!(payload.corrections[&12][&16], EulerDegrees::new(0.0, 0.0, 90.0));
        assert_eq!(payload.corrections[&12][&18], EulerDegrees::new(10.0, 0.0, 0.0));

        let encoded = serde_json::to_value(&payload).unwrap();
        assert!(encoded["corrections"]["12"]["16"].is_object());
    }

    #[test]
    fn partial_save_is_not_success() {
        let response: SaveCorrectionsResponse = serde_json::from_str(
            r#"{"status":"partial","message":"Corrections saved but no poses to recalculate"}"#,
        )
        .unwrap();
        assert!(!response.is_success());

        let response: SaveCorrectionsResponse = serde_json::from_str(
            r#"{"status":"success","message":"ok","corrections_count":3,"new_overall_score":71}"#,
        )
        .unwrap();
        assert!(response.is_success());
        assert_eq!(response.corrections_count, Some(3));
    }
}
