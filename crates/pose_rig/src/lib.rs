use std::f32::consts::PI;

use glam::Quat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use blend::{blend_with_reference, BlendWeights};
pub use convert::{euler_delta, rotation_to_quat, to_quaternion_map, JointRotations};
pub use corrections::{
    apply_to_body_pose, apply_to_landmarks, compose_corrections, CorrectionStore,
    FrameCorrections,
};
pub use joints::{BodyJoint, DEFAULT_BONE_MAP};
pub use plugin::{CaptureRig, ModelScale, RetargetPlugin, RetargetRig, TargetPose};
pub use retarget::{apply_pose, BoneRotation, RetargetContext};
pub use skeleton::{sanitize_bone_name, BindSkeleton, Bone, PoseRig, RestPose};
pub use smoothing::smooth_sequence;
pub use viewer::PoseViewer;

mod blend;
mod convert;
mod corrections;
mod joints;
mod plugin;
mod retarget;
mod skeleton;
mod smoothing;
mod viewer;

#[derive(Error, Debug)]
pub enum SkeletonError {
    #[error("failed to read skeleton asset: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("skeleton asset has no bones")]
    NoBones,
}

/// One row of the joint-to-bone table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneBinding {
    pub joint: BodyJoint,
    pub bone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    pub bone_map: Vec<BoneBinding>,
    /// Applied to the root joint only, between its rest rotation and its pose.
    pub root_axis_correction: Quat,
    pub model_scale: f32,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            bone_map: DEFAULT_BONE_MAP
                .iter()
                .map(|(joint, bone)| BoneBinding {
                    joint: *joint,
                    bone: (*bone).to_string(),
                })
                .collect(),
            root_axis_correction: Quat::from_rotation_z(PI),
            model_scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_flips_the_root_upright() {
        let config = RetargetConfig::default();
        assert_eq!(config.bone_map.len(), DEFAULT_BONE_MAP.len());
        let up = config.root_axis_correction * glam::Vec3::Y;
        assert!(up.abs_diff_eq(-glam::Vec3::Y, 1e-6));
    }

    #[test]
    fn config_reads_partial_json() {
        let config: RetargetConfig = serde_json::from_str(
            r#"{"model_scale": 2.5, "bone_map": [{"joint": "pelvis", "bone": "Root"}]}"#,
        )
        .unwrap();
        assert_eq!(config.model_scale, 2.5);
        assert_eq!(config.bone_map[0].joint, BodyJoint::Pelvis);
        assert_eq!(config.root_axis_correction, RetargetConfig::default().root_axis_correction);
    }
}
