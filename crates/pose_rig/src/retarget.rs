use std::sync::Arc;

use glam::Quat;

use crate::skeleton::{PoseRig, RestPose};
use crate::{BoneBinding, JointRotations, RetargetConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct BoneRotation {
    pub bone: String,
    pub rotation: Quat,
}

/// Everything the retargeter reads besides the pose itself. Each viewer owns
/// one; the rest pose inside is shared read-only.
#[derive(Debug, Clone)]
pub struct RetargetContext {
    bindings: Vec<BoneBinding>,
    rest: Arc<RestPose>,
    root_axis_correction: Quat,
}

impl RetargetContext {
    pub fn new(config: &RetargetConfig, rest: Arc<RestPose>) -> Self {
        Self {
            bindings: config.bone_map.clone(),
            rest,
            root_axis_correction: config.root_axis_correction,
        }
    }

    pub fn rest_pose(&self) -> &RestPose {
        &self.rest
    }

    pub fn bindings(&self) -> &[BoneBinding] {
        &self.bindings
    }

    /// Local bone rotations for `pose`, one per bound joint.
    ///
    /// The root gets `rest * root_axis_correction * pose`, every other bone
    /// `rest * pose`. A joint absent from `pose` counts as identity and a bone
    /// without a cached rest rotation counts as identity.
    pub fn solve(&self, pose: &JointRotations) -> Vec<BoneRotation> {
        self.bindings
            .iter()
            .map(|binding| {
                let base = self.rest.get(&binding.bone).unwrap_or(Quat::IDENTITY);
                let local = pose.get(&binding.joint).copied().unwrap_or(Quat::IDENTITY);
                let rotation = if binding.joint.is_root() {
                    base * self.root_axis_correction * local
                } else {
                    base * local
                };
                BoneRotation {
                    bone: binding.bone.clone(),
                    rotation,
                }
            })
            .collect()
    }
}

/// Writes the solved rotations into `rig`. Returns how many bones were posed.
pub fn apply_pose<R: PoseRig + ?Sized>(
    pose: &JointRotations,
    rig: &mut R,
    context: &RetargetContext,
) -> usize {
    let mut applied = 0;
    for BoneRotation { bone, rotation } in context.solve(pose) {
        if rig.set_local_rotation(&bone, rotation) {
            applied += 1;
        } else {
            tracing::debug!("rig has no bone {}, skipping", bone);
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::f32::consts::PI;

    use super::*;
    use crate::BodyJoint;

    #[derive(Default)]
    struct MapRig(HashMap<String, Quat>);

    impl PoseRig for MapRig {
        fn set_local_rotation(&mut self, bone: &str, rotation: Quat) -> bool {
            match self.0.get_mut(bone) {
                Some(slot) => {
                    *slot = rotation;
                    true
                }
                None => false,
            }
        }
    }

    fn context(rest: &[(&str, Quat)]) -> RetargetContext {
        let rest = RestPose::capture(rest.iter().map(|(n, q)| (n.to_string(), *q)));
        RetargetContext::new(&RetargetConfig::default(), Arc::new(rest))
    }

    #[test]
    fn root_gets_axis_correction() {
        let ctx = context(&[("mixamorigHips", Quat::IDENTITY)]);
        let pose = JointRotations::from([(BodyJoint::Pelvis, Quat::IDENTITY)]);
        let solved = ctx.solve(&pose);
        let hips = solved.iter().find(|r| r.bone == "mixamorigHips").unwrap();
        assert!(hips.rotation.abs_diff_eq(Quat::from_rotation_z(PI), 1e-6));
    }

    #[test]
    fn other_bones_compose_rest_then_pose() {
        let rest = Quat::from_rotation_x(0.4);
        let ctx = context(&[("mixamorigLeftForeArm", rest)]);
        let local = Quat::from_rotation_y(0.7);
        let pose = JointRotations::from([(BodyJoint::LeftElbow, local)]);
        let solved = ctx.solve(&pose);
        let elbow = solved.iter().find(|r| r.bone == "mixamorigLeftForeArm").unwrap();
        assert_eq!(elbow.rotation, rest * local);
    }

    #[test]
    fn missing_rest_and_pose_degrade_to_identity() {
        let ctx = context(&[]);
        let solved = ctx.solve(&JointRotations::new());
        let neck = solved.iter().find(|r| r.bone == "mixamorigNeck").unwrap();
        assert_eq!(neck.rotation, Quat::IDENTITY);
    }

    #[test]
    fn unknown_bones_are_skipped() {
        let ctx = context(&[]);
        let mut rig = MapRig::default();
        rig.0.insert("mixamorigHead".into(), Quat::IDENTITY);
        let applied = apply_pose(&JointRotations::new(), &mut rig, &ctx);
        assert_eq!(applied, 1);
    }
}
