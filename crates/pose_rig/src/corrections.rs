use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Mat3, Quat};
use pose_api::{BodyPose, CorrectionsPayload, EulerDegrees, Landmark, SaveCorrectionsResponse};

use crate::{euler_delta, BodyJoint, JointRotations};

/// `joint index -> correction` for one frame.
pub type FrameCorrections = BTreeMap<u32, EulerDegrees>;

/// Operator corrections for a session, keyed by frame.
///
/// Cloning is cheap and a clone never observes later edits: every write goes
/// through [`Arc::make_mut`], so a snapshot handed to a save request stays
/// intact while the operator keeps editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionStore {
    frames: Arc<BTreeMap<u32, FrameCorrections>>,
}

impl CorrectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payload(payload: CorrectionsPayload) -> Self {
        let mut frames = payload.corrections;
        frames.retain(|_, joints| !joints.is_empty());
        Self {
            frames: Arc::new(frames),
        }
    }

    pub fn set(&mut self, frame: u32, joint: u32, euler: EulerDegrees) {
        Arc::make_mut(&mut self.frames)
            .entry(frame)
            .or_default()
            .insert(joint, euler);
    }

    pub fn remove(&mut self, frame: u32, joint: u32) -> Option<EulerDegrees> {
        let frames = Arc::make_mut(&mut self.frames);
        let joints = frames.get_mut(&frame)?;
        let removed = joints.remove(&joint);
        if joints.is_empty() {
            frames.remove(&frame);
        }
        removed
    }

    pub fn frame(&self, frame: u32) -> Option<&FrameCorrections> {
        self.frames.get(&frame)
    }

    pub fn get(&self, frame: u32, joint: u32) -> Option<EulerDegrees> {
        self.frames.get(&frame)?.get(&joint).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of corrected joints over all frames.
    pub fn len(&self) -> usize {
        self.frames.values().map(BTreeMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.frames = Arc::default();
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<u32, FrameCorrections>> {
        self.frames.clone()
    }

    pub fn to_payload(&self) -> CorrectionsPayload {
        CorrectionsPayload {
            corrections: (*self.frames).clone(),
        }
    }

    /// Clears the store once the server reports a full success. Returns whether
    /// it was cleared.
    pub fn acknowledge_saved(&mut self, response: &SaveCorrectionsResponse) -> bool {
        if !response.is_success() {
            tracing::warn!("corrections kept, save reported: {}", response.message);
            return false;
        }
        self.clear();
        true
    }
}

/// Right-multiplies each correction onto its joint's pose quaternion.
///
/// A corrected joint with no pose data starts from identity. Indices outside
/// the body model are ignored.
pub fn compose_corrections(pose: &mut JointRotations, corrections: &FrameCorrections) {
    for (&index, euler) in corrections {
        let Some(joint) = BodyJoint::from_index(index as usize) else {
            tracing::debug!("ignoring correction for unknown joint {}", index);
            continue;
        };
        let current = pose.get(&joint).copied().unwrap_or(Quat::IDENTITY);
        pose.insert(joint, current * euler_delta(euler));
    }
}

/// Bakes corrections into a rotation block, `R_new = R_old * R_corr`.
pub fn apply_to_body_pose(pose: &mut BodyPose, corrections: &FrameCorrections) {
    for (&index, euler) in corrections {
        let Some(Some(matrix)) = pose.rotations.get_mut(index as usize) else {
            continue;
        };
        *matrix *= Mat3::from_quat(euler_delta(euler));
    }
}

/// Landmark a body-model joint pivots about in the 33-point layout.
fn landmark_pivot(joint: BodyJoint) -> Option<usize> {
    Some(match joint {
        BodyJoint::LeftShoulder => 11,
        BodyJoint::RightShoulder => 12,
        BodyJoint::LeftElbow => 13,
        BodyJoint::RightElbow => 14,
        BodyJoint::LeftHip => 23,
        BodyJoint::RightHip => 24,
        BodyJoint::LeftKnee => 25,
        BodyJoint::RightKnee => 26,
        _ => return None,
    })
}

/// Landmarks carried along when the pivot rotates.
fn landmark_subtree(pivot: usize) -> &'static [usize] {
    match pivot {
        11 => &[13, 15, 17, 19, 21],
        12 => &[14, 16, 18, 20, 22],
        13 => &[15, 17, 19, 21],
        14 => &[16, 18, 20, 22],
        23 => &[25, 27, 29, 31],
        24 => &[26, 28, 30, 32],
        25 => &[27, 29, 31],
        26 => &[28, 30, 32],
        _ => &[],
    }
}

/// Rotates the limb below each corrected shoulder, elbow, hip or knee about
/// its pivot landmark. Other joints have no landmark counterpart.
pub fn apply_to_landmarks(landmarks: &mut [Landmark], corrections: &FrameCorrections) {
    for (&index, euler) in corrections {
        let Some(pivot) = BodyJoint::from_index(index as usize).and_then(landmark_pivot) else {
            continue;
        };
        let Some(origin) = landmarks
            .get(pivot)
            .filter(|lm| !lm.is_placeholder())
            .map(|lm| lm.position)
        else {
            continue;
        };

        let delta = euler_delta(euler);
        for &child in landmark_subtree(pivot) {
            if let Some(lm) = landmarks.get_mut(child).filter(|lm| !lm.is_placeholder()) {
                lm.position = origin + delta * (lm.position - origin);
            }
        }
    }
}
