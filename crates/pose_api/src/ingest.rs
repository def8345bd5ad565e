use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    BODY_POSE_JOINTS, CoordinateConvention, ConventionTags, LandmarkJson, Lenient, PoseApiError,
    PoseFrameJson,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: Vec3,
    pub visibility: Option<f32>,
    /// Set only for entries that were `null` or malformed on the wire.
    #[serde(default)]
    pub placeholder: bool,
}

impl Landmark {
    /// Placeholder for a `null` or malformed entry. It keeps its index but is never drawn.
    pub const MISSING: Landmark = Landmark {
        position: Vec3::ZERO,
        visibility: Some(0.0),
        placeholder: true,
    };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            visibility: None,
            placeholder: false,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn xy(&self) -> Vec2 {
        self.position.truncate()
    }

    /// Visibility with the absent case treated as fully visible.
    pub fn confidence(&self) -> f32 {
        self.visibility.unwrap_or(1.0)
    }

    pub fn is_drawable(&self, threshold: f32) -> bool {
        !self.placeholder && self.confidence() > threshold
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

impl From<&LandmarkJson> for Landmark {
    fn from(value: &LandmarkJson) -> Self {
        match value {
            LandmarkJson::Object { x, y, z, visibility } => Landmark {
                position: Vec3::new(*x, *y, z.unwrap_or(0.0)),
                visibility: *visibility,
                placeholder: false,
            },
            LandmarkJson::Tuple(values) => match values.as_slice() {
                [x, y] => Landmark::new(*x, *y),
                [x, y, z, ..] => Landmark {
                    position: Vec3::new(*x, *y, *z),
                    visibility: None,
                    placeholder: false,
                },
                _ => Landmark::MISSING,
            },
            LandmarkJson::Other(_) => Landmark::MISSING,
        }
    }
}

/// Where a landmark set came from; fixes its priority and its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkSource {
    HighFidelity,
    BodyModel,
    BodyModelOriginal,
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    pub source: LandmarkSource,
    pub convention: Option<CoordinateConvention>,
    pub landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(source: LandmarkSource, landmarks: Vec<Landmark>) -> Self {
        Self {
            source,
            convention: None,
            landmarks,
        }
    }

    pub fn tagged(mut self, convention: CoordinateConvention) -> Self {
        self.convention = Some(convention);
        self
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    fn from_json(
        source: LandmarkSource,
        entries: &[Option<LandmarkJson>],
        convention: Option<CoordinateConvention>,
    ) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let landmarks = entries
            .iter()
            .map(|entry| entry.as_ref().map(Landmark::from).unwrap_or(Landmark::MISSING))
            .collect();
        Some(Self {
            source,
            convention,
            landmarks,
        })
    }
}

/// Axis-aligned box in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            min: Vec2::new(x1, y1),
            max: Vec2::new(x2, y2),
        }
    }

    /// Reads `[x1, y1, x2, y2]`. Short or non-finite input yields `None`.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x1, y1, x2, y2, ..] if values[..4].iter().all(|v| v.is_finite()) => {
                Some(Self::from_corners(*x1, *y1, *x2, *y2))
            }
            _ => None,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Per-joint local rotations in body-model joint order. Entries that were
/// missing or not 3x3 on the wire are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyPose {
    pub rotations: Vec<Option<Mat3>>,
}

impl BodyPose {
    pub fn identity() -> Self {
        Self {
            rotations: vec![Some(Mat3::IDENTITY); BODY_POSE_JOINTS],
        }
    }

    pub fn get(&self, joint: usize) -> Option<Mat3> {
        self.rotations.get(joint).copied().flatten()
    }

    pub fn valid_count(&self) -> usize {
        self.rotations.iter().flatten().count()
    }

    fn from_json(raw: &[Lenient<Vec<Vec<f32>>>]) -> Self {
        let rotations: Vec<_> = raw
            .iter()
            .map(|entry| entry.valid().and_then(|rows| mat3_from_nested(rows)))
            .collect();
        if rotations.len() != BODY_POSE_JOINTS {
            tracing::warn!(
                "body pose has {} entries, expected {}",
                rotations.len(),
                BODY_POSE_JOINTS
            );
        }
        Self { rotations }
    }

    pub fn to_rows(&self) -> Vec<Option<[[f32; 3]; 3]>> {
        self.rotations
            .iter()
            .map(|m| m.map(|m| rows_from_mat3(&m)))
            .collect()
    }
}

/// Builds a matrix from row-major `[[f32; 3]; 3]`.
pub fn mat3_from_rows(rows: &[[f32; 3]; 3]) -> Mat3 {
    Mat3::from_cols_array_2d(rows).transpose()
}

pub fn rows_from_mat3(m: &Mat3) -> [[f32; 3]; 3] {
    m.transpose().to_cols_array_2d()
}

fn mat3_from_nested(rows: &[Vec<f32>]) -> Option<Mat3> {
    let [r0, r1, r2] = rows else {
        return None;
    };
    let row = |r: &Vec<f32>| -> Option<[f32; 3]> {
        match r.as_slice() {
            [a, b, c] if a.is_finite() && b.is_finite() && c.is_finite() => Some([*a, *b, *c]),
            _ => None,
        }
    };
    Some(mat3_from_rows(&[row(r0)?, row(r1)?, row(r2)?]))
}

/// A frame after ingestion: every landmark set in one canonical form, tagged
/// with a convention where its producer is known.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FramePose {
    pub frame_index: u32,
    pub timestamp_ms: f64,
    pub high_fidelity: Option<LandmarkSet>,
    pub body_model: Option<LandmarkSet>,
    pub body_model_original: Option<LandmarkSet>,
    pub generic: Option<LandmarkSet>,
    pub body_bbox: Option<BoundingBox>,
    pub body_pose: Option<BodyPose>,
}

impl FramePose {
    pub fn from_slice(src: &[u8]) -> Result<FramePose, PoseApiError> {
        let json = serde_json::from_slice::<PoseFrameJson>(src)?;
        Ok(Self::from(&json))
    }

    pub fn with_generic(landmarks: Vec<Landmark>) -> Self {
        Self {
            generic: Some(LandmarkSet::new(LandmarkSource::Generic, landmarks)),
            ..Default::default()
        }
    }
}

impl From<&PoseFrameJson> for FramePose {
    fn from(json: &PoseFrameJson) -> Self {
        let tags = valid_field(&json.conventions, "conventions")
            .copied()
            .unwrap_or_default();
        let ConventionTags {
            landmarks: generic_tag,
            high_fidelity_joints_2d: high_fidelity_tag,
            body_joints_2d: body_tag,
            body_joints_2d_orig: body_orig_tag,
        } = tags;

        let high_fidelity = landmark_entries(&json.high_fidelity_joints_2d, "high_fidelity_joints_2d");
        let high_fidelity = high_fidelity.and_then(|entries| {
            LandmarkSet::from_json(
                LandmarkSource::HighFidelity,
                entries,
                Some(high_fidelity_tag.unwrap_or(CoordinateConvention::GlobalPixel)),
            )
        });
        let body_model = landmark_entries(&json.body_joints_2d, "body_joints_2d");
        let body_model = body_model.and_then(|entries| {
            LandmarkSet::from_json(LandmarkSource::BodyModel, entries, body_tag)
        });
        let body_model_original = landmark_entries(&json.body_joints_2d_orig, "body_joints_2d_orig");
        let body_model_original = body_model_original.and_then(|entries| {
            LandmarkSet::from_json(
                LandmarkSource::BodyModelOriginal,
                entries,
                Some(body_orig_tag.unwrap_or(CoordinateConvention::GlobalPixel)),
            )
        });
        let generic = landmark_entries(&json.landmarks, "landmarks").and_then(|entries| {
            LandmarkSet::from_json(LandmarkSource::Generic, entries, generic_tag)
        });

        let body_bbox = valid_field(&json.body_bbox, "body_bbox").and_then(|values| {
            let bbox = BoundingBox::from_slice(values);
            if bbox.is_none() {
                tracing::warn!("ignoring malformed body bounding box {:?}", values);
            }
            bbox
        });

        Self {
            frame_index: valid_field(&json.frame_index, "frame_index")
                .copied()
                .unwrap_or(0),
            timestamp_ms: valid_field(&json.timestamp_ms, "timestamp_ms")
                .copied()
                .unwrap_or(0.0),
            high_fidelity,
            body_model,
            body_model_original,
            generic,
            body_bbox,
            body_pose: valid_field(&json.body_pose, "body_pose")
                .map(|raw| BodyPose::from_json(raw)),
        }
    }
}

/// The value of an optional wire field, or `None` (with a warning) if it was malformed.
fn valid_field<'a, T>(field: &'a Option<Lenient<T>>, name: &str) -> Option<&'a T> {
    match field.as_ref()? {
        Lenient::Valid(value) => Some(value),
        Lenient::Invalid(raw) => {
            tracing::warn!("ignoring malformed {}: {}", name, raw);
            None
        }
    }
}

fn landmark_entries<'a>(
    field: &'a Option<Lenient<Vec<Option<LandmarkJson>>>>,
    name: &str,
) -> Option<&'a [Option<LandmarkJson>]> {
    valid_field(field, name).map(Vec::as_slice)
}

/// Reads a whole session file: a JSON array of frames.
pub fn parse_frames(src: &[u8]) -> Result<Vec<FramePose>, PoseApiError> {
    let frames = serde_json::from_slice::<Vec<PoseFrameJson>>(src)?;
    Ok(frames.iter().map(FramePose::from).collect())
}

/// Lifts crop-space joints into original-image pixels by offsetting with the
/// bounding-box origin, keeping placeholders in place.
pub fn lift_to_image(landmarks: &[Landmark], bbox: &BoundingBox) -> Vec<Landmark> {
    landmarks
        .iter()
        .map(|lm| {
            if lm.is_placeholder() {
                return *lm;
            }
            Landmark {
                position: lm.position + bbox.min.extend(0.0),
                ..*lm
            }
        })
        .collect()
}
