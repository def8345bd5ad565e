use std::collections::HashMap;

use bevy::app::{App, Plugin, Update};
use bevy::core::Name;
use bevy::hierarchy::{Children, HierarchyQueryExt};
use bevy::math::Vec3;
use bevy::prelude::{Commands, Component, Entity, IntoSystemConfigs, Query, Transform, Without};
use pose_api::FramePose;

use crate::{
    compose_corrections, sanitize_bone_name, to_quaternion_map, BodyJoint, FrameCorrections,
    JointRotations, RestPose, RetargetConfig, RetargetContext,
};

/// Drives spawned rigs from [`TargetPose`] components.
pub struct RetargetPlugin;

impl Plugin for RetargetPlugin {
    fn name(&self) -> &str {
        "Retarget"
    }

    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (capture_rigs, apply_target_poses, apply_model_scale).chain(),
        );
    }
}

/// Put this on the root of a spawned skeleton. Once its named descendants
/// exist, their rest rotations are captured and it is replaced by a
/// [`RetargetRig`].
#[derive(Component, Debug, Clone, Default)]
pub struct CaptureRig {
    pub config: RetargetConfig,
}

/// A captured rig: its own retarget context and the bone entities by name.
#[derive(Component, Debug, Clone)]
pub struct RetargetRig {
    pub context: RetargetContext,
    pub bones: HashMap<String, Entity>,
}

/// Joint rotations the rig should show.
#[derive(Component, Debug, Clone, Default)]
pub struct TargetPose {
    pub rotations: JointRotations,
}

impl TargetPose {
    pub fn from_frame(frame: &FramePose, corrections: Option<&FrameCorrections>) -> Self {
        let mut rotations = frame
            .body_pose
            .as_ref()
            .map(|pose| to_quaternion_map(pose, &BodyJoint::ALL))
            .unwrap_or_default();
        if let Some(corrections) = corrections {
            compose_corrections(&mut rotations, corrections);
        }
        Self { rotations }
    }
}

/// Uniform scale of a rig root, independent of pose data.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ModelScale(pub f32);

pub fn capture_rigs(
    mut commands: Commands,
    rigs: Query<(Entity, &CaptureRig)>,
    children: Query<&Children>,
    bones: Query<(&Name, &Transform)>,
) {
    for (entity, capture) in &rigs {
        let mut by_name = HashMap::new();
        let mut rest = Vec::new();
        for descendant in children.iter_descendants(entity) {
            let Ok((name, transform)) = bones.get(descendant) else {
                continue;
            };
            let name = sanitize_bone_name(name.as_str());
            if by_name.contains_key(&name) {
                continue;
            }
            by_name.insert(name.clone(), descendant);
            rest.push((name, transform.rotation));
        }

        // The scene may not have spawned yet.
        if by_name.is_empty() {
            continue;
        }

        tracing::debug!("captured rig {:?} with {} bones", entity, by_name.len());
        let context = RetargetContext::new(&capture.config, RestPose::capture(rest).into());
        commands
            .entity(entity)
            .remove::<CaptureRig>()
            .insert((
                RetargetRig {
                    context,
                    bones: by_name,
                },
                ModelScale(capture.config.model_scale),
            ));
    }
}

pub fn apply_target_poses(
    rigs: Query<(&RetargetRig, &TargetPose)>,
    mut transforms: Query<&mut Transform, Without<RetargetRig>>,
) {
    for (rig, target) in &rigs {
        for solved in rig.context.solve(&target.rotations) {
            let Some(mut transform) = rig
                .bones
                .get(&solved.bone)
                .and_then(|e| transforms.get_mut(*e).ok())
            else {
                tracing::trace!("rig has no bone {}", solved.bone);
                continue;
            };
            transform.rotation = solved.rotation;
        }
    }
}

pub fn apply_model_scale(mut rigs: Query<(&ModelScale, &mut Transform)>) {
    for (scale, mut transform) in &mut rigs {
        transform.scale = Vec3::splat(scale.0);
    }
}
