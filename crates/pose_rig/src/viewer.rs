use std::sync::Arc;

use pose_api::FramePose;

use crate::{
    apply_pose, compose_corrections, to_quaternion_map, BindSkeleton, BodyJoint, CorrectionStore,
    RestPose, RetargetConfig, RetargetContext,
};

/// One 3D figure: its bind skeleton, the context derived from it and the
/// operator corrections for the session.
///
/// Viewers share nothing. Two viewers that load the same asset still capture
/// separate rest poses.
#[derive(Debug)]
pub struct PoseViewer {
    config: RetargetConfig,
    skeleton: Option<BindSkeleton>,
    context: RetargetContext,
    corrections: CorrectionStore,
}

impl Default for PoseViewer {
    fn default() -> Self {
        Self::new(RetargetConfig::default())
    }
}

impl PoseViewer {
    pub fn new(config: RetargetConfig) -> Self {
        let context = RetargetContext::new(&config, Arc::new(RestPose::default()));
        Self {
            config,
            skeleton: None,
            context,
            corrections: CorrectionStore::new(),
        }
    }

    /// Loads a bind skeleton from glTF bytes. A failed load is logged and the
    /// viewer keeps whatever it had before.
    pub fn load_skeleton(&mut self, bytes: &[u8]) -> bool {
        match BindSkeleton::from_gltf_slice(bytes) {
            Ok(skeleton) => {
                self.attach_skeleton(skeleton);
                true
            }
            Err(err) => {
                tracing::warn!("failed to load bind skeleton: {}", err);
                false
            }
        }
    }

    pub fn attach_skeleton(&mut self, mut skeleton: BindSkeleton) {
        skeleton.set_model_scale(self.config.model_scale);
        self.context = RetargetContext::new(&self.config, skeleton.rest_pose());
        self.skeleton = Some(skeleton);
    }

    pub fn skeleton(&self) -> Option<&BindSkeleton> {
        self.skeleton.as_ref()
    }

    pub fn context(&self) -> &RetargetContext {
        &self.context
    }

    pub fn corrections(&self) -> &CorrectionStore {
        &self.corrections
    }

    pub fn corrections_mut(&mut self) -> &mut CorrectionStore {
        &mut self.corrections
    }

    pub fn set_model_scale(&mut self, scale: f32) {
        self.config.model_scale = scale;
        if let Some(skeleton) = &mut self.skeleton {
            skeleton.set_model_scale(scale);
        }
    }

    /// Poses the figure for `frame` with the current corrections. Returns
    /// `false` and leaves the figure alone when there is no skeleton or the
    /// frame has no rotation block.
    pub fn show_frame(&mut self, frame: &FramePose) -> bool {
        let Some(skeleton) = &mut self.skeleton else {
            return false;
        };
        let Some(body_pose) = &frame.body_pose else {
            return false;
        };

        let mut rotations = to_quaternion_map(body_pose, &BodyJoint::ALL);
        if let Some(corrections) = self.corrections.frame(frame.frame_index) {
            compose_corrections(&mut rotations, corrections);
        }
        let posed = apply_pose(&rotations, skeleton, &self.context);
        tracing::trace!("posed {} bones for frame {}", posed, frame.frame_index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_asset_keeps_prior_state() {
        let mut viewer = PoseViewer::default();
        assert!(!viewer.load_skeleton(b"{}"));
        assert!(viewer.skeleton().is_none());

        let frame = FramePose {
            body_pose: Some(pose_api::BodyPose::identity()),
            ..Default::default()
        };
        assert!(!viewer.show_frame(&frame));
    }

    #[test]
    fn model_scale_follows_config() {
        let mut viewer = PoseViewer::new(RetargetConfig {
            model_scale: 0.01,
            ..Default::default()
        });
        let skeleton =
            BindSkeleton::new(vec![crate::Bone::new("mixamorigHips", None, glam::Quat::IDENTITY)])
                .unwrap();
        viewer.attach_skeleton(skeleton);
        assert_eq!(viewer.skeleton().unwrap().model_scale(), 0.01);

        viewer.set_model_scale(2.0);
        assert_eq!(viewer.skeleton().unwrap().model_scale(), 2.0);
    }
}
