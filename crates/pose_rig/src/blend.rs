use glam::Mat3;
use pose_api::BodyPose;
use serde::{Deserialize, Serialize};

use crate::{rotation_to_quat, BodyJoint};

/// How far each joint group is pulled toward the reference pose, `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    /// Spine chain and neck.
    pub torso: f32,
    /// Hips, knees and ankles.
    pub lower_body: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            torso: 0.55,
            lower_body: 0.75,
        }
    }
}

impl BlendWeights {
    pub fn weight(&self, joint: BodyJoint) -> f32 {
        use BodyJoint::*;
        match joint {
            Spine1 | Spine2 | Spine3 | Neck => self.torso,
            LeftHip | RightHip | LeftKnee | RightKnee | LeftAnkle | RightAnkle => self.lower_body,
            _ => 0.0,
        }
    }
}

/// Slerps each joint of `pose` toward `reference` by its group weight.
///
/// Arms, hands, head and root are never touched. Poses of different lengths
/// come back unchanged, as do joints where either rotation is unusable.
pub fn blend_with_reference(pose: &BodyPose, reference: &BodyPose, weights: &BlendWeights) -> BodyPose {
    if pose.rotations.len() != reference.rotations.len() {
        tracing::debug!(
            "not blending, pose has {} joints and reference {}",
            pose.rotations.len(),
            reference.rotations.len()
        );
        return pose.clone();
    }

    let mut out = pose.clone();
    for (index, slot) in out.rotations.iter_mut().enumerate() {
        let Some(joint) = BodyJoint::from_index(index) else {
            continue;
        };
        let alpha = weights.weight(joint).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            continue;
        }
        let (Some(from), Some(to)) = (
            slot.as_ref().and_then(rotation_to_quat),
            reference.get(index).as_ref().and_then(rotation_to_quat),
        ) else {
            continue;
        };
        *slot = Some(Mat3::from_quat(from.slerp(to, alpha)));
    }
    out
}
