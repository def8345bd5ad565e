use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::SkeletonError;

/// Strips the characters scene loaders drop from node names, so
/// `mixamorig:Hips` and `mixamorigHips` address the same bone.
pub fn sanitize_bone_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/' | '\\'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Bone {
    pub fn new(name: impl AsRef<str>, parent: Option<usize>, rotation: Quat) -> Self {
        Self {
            name: sanitize_bone_name(name.as_ref()),
            parent,
            translation: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }
}

/// Local rest rotations of a skeleton, captured once when it is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestPose {
    rotations: HashMap<String, Quat>,
}

impl RestPose {
    pub fn capture<I, S>(bones: I) -> Self
    where
        I: IntoIterator<Item = (S, Quat)>,
        S: Into<String>,
    {
        let mut rotations = HashMap::new();
        for (name, rotation) in bones {
            rotations.entry(name.into()).or_insert(rotation);
        }
        Self { rotations }
    }

    pub fn get(&self, bone: &str) -> Option<Quat> {
        self.rotations.get(bone).copied()
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }
}

/// Something whose bones can be posed by name.
pub trait PoseRig {
    /// Sets a bone's local rotation. Returns `false` if the rig has no such bone.
    fn set_local_rotation(&mut self, bone: &str, rotation: Quat) -> bool;
}

/// A loaded bind skeleton: the bone hierarchy, its current local rotations and
/// the rest pose it was loaded with.
#[derive(Debug, Clone)]
pub struct BindSkeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, usize>,
    rest: Arc<RestPose>,
    model_scale: f32,
}

impl BindSkeleton {
    pub fn new(bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        if bones.is_empty() {
            return Err(SkeletonError::NoBones);
        }

        let mut by_name = HashMap::new();
        for (index, bone) in bones.iter().enumerate() {
            if by_name.contains_key(&bone.name) {
                tracing::warn!("duplicate bone {}, keeping the first", bone.name);
                continue;
            }
            by_name.insert(bone.name.clone(), index);
        }

        let rest = RestPose::capture(bones.iter().map(|b| (b.name.clone(), b.rotation)));
        Ok(Self {
            bones,
            by_name,
            rest: Arc::new(rest),
            model_scale: 1.0,
        })
    }

    /// Reads the bone hierarchy of a glTF or GLB asset.
    ///
    /// Uses the joints of the first skin; without a skin every named node is a
    /// bone. Only node names and local transforms are read.
    pub fn from_gltf_slice(bytes: &[u8]) -> Result<Self, SkeletonError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;

        let mut parents = vec![None; gltf.nodes().len()];
        for node in gltf.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let nodes: Vec<gltf::Node> = match gltf.skins().next() {
            Some(skin) => skin.joints().collect(),
            None => gltf.nodes().filter(|n| n.name().is_some()).collect(),
        };
        let node_to_bone: HashMap<usize, usize> = nodes
            .iter()
            .enumerate()
            .map(|(bone, node)| (node.index(), bone))
            .collect();

        let bones = nodes
            .iter()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                let name = node
                    .name()
                    .map(sanitize_bone_name)
                    .unwrap_or_else(|| format!("Node{}", node.index()));

                // Nearest ancestor that is itself a bone.
                let mut parent = parents[node.index()];
                let mut steps = 0;
                while let Some(p) = parent {
                    if node_to_bone.contains_key(&p) || steps > parents.len() {
                        break;
                    }
                    parent = parents[p];
                    steps += 1;
                }

                Bone {
                    name,
                    parent: parent.and_then(|p| node_to_bone.get(&p).copied()),
                    translation: Vec3::from_array(translation),
                    rotation: Quat::from_array(rotation),
                    scale: Vec3::from_array(scale),
                }
            })
            .collect();

        Self::new(bones)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.by_name.get(name).map(|&i| &self.bones[i])
    }

    pub fn rest_pose(&self) -> Arc<RestPose> {
        self.rest.clone()
    }

    /// Puts every bone back to its rest rotation.
    pub fn reset(&mut self) {
        for bone in &mut self.bones {
            if let Some(rotation) = self.rest.get(&bone.name) {
                bone.rotation = rotation;
            }
        }
    }

    pub fn model_scale(&self) -> f32 {
        self.model_scale
    }

    /// Uniform scale of the whole figure. Pose data never changes it.
    pub fn set_model_scale(&mut self, scale: f32) {
        self.model_scale = scale;
    }

    /// Rotation of a bone in skeleton space, composed through its parents.
    pub fn model_rotation(&self, name: &str) -> Option<Quat> {
        let mut index = *self.by_name.get(name)?;
        let mut rotation = self.bones[index].rotation;
        let mut guard = self.bones.len();
        while let Some(parent) = self.bones[index].parent {
            rotation = self.bones[parent].rotation * rotation;
            index = parent;
            guard = guard.checked_sub(1)?;
        }
        Some(rotation)
    }
}

impl PoseRig for BindSkeleton {
    fn set_local_rotation(&mut self, bone: &str, rotation: Quat) -> bool {
        match self.by_name.get(bone) {
            Some(&index) => {
                self.bones[index].rotation = rotation;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARMATURE: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [
            {"name": "Armature", "children": [1], "rotation": [0.7071068, 0.0, 0.0, 0.7071068]},
            {"name": "mixamorig:Hips", "children": [2], "translation": [0.0, 1.0, 0.0]},
            {"name": "mixamorig:Spine", "rotation": [0.0, 0.0, 0.7071068, 0.7071068]}
        ],
        "skins": [{"joints": [1, 2]}]
    }"#;

    #[test]
    fn names_are_sanitized() {
        assert_eq!(sanitize_bone_name("mixamorig:Hips"), "mixamorigHips");
        assert_eq!(sanitize_bone_name("Upper Arm.L"), "Upper_ArmL");
    }

    #[test]
    fn skin_joints_become_bones() {
        let skeleton = BindSkeleton::from_gltf_slice(ARMATURE.as_bytes()).unwrap();
        assert_eq!(skeleton.bones().len(), 2);

        let hips = skeleton.bone("mixamorigHips").unwrap();
        assert_eq!(hips.parent, None, "the armature node is not a joint");
        assert_eq!(hips.translation, Vec3::Y);

        let spine = skeleton.bone("mixamorigSpine").unwrap();
        assert_eq!(spine.parent, Some(0));
        let rest = skeleton.rest_pose().get("mixamorigSpine").unwrap();
        assert!(rest.abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-6));
    }

    #[test]
    fn posing_never_touches_the_rest_cache() {
        let mut skeleton = BindSkeleton::from_gltf_slice(ARMATURE.as_bytes()).unwrap();
        let before = skeleton.rest_pose();
        assert!(skeleton.set_local_rotation("mixamorigSpine", Quat::from_rotation_x(1.0)));
        assert!(!skeleton.set_local_rotation("mixamorigTail", Quat::IDENTITY));
        assert_eq!(*skeleton.rest_pose(), *before);

        skeleton.reset();
        assert_eq!(
            skeleton.bone("mixamorigSpine").unwrap().rotation,
            before.get("mixamorigSpine").unwrap()
        );
    }

    #[test]
    fn model_rotation_composes_parents() {
        let bones = vec![
            Bone::new("root", None, Quat::from_rotation_y(0.5)),
            Bone::new("child", Some(0), Quat::from_rotation_y(0.25)),
        ];
        let skeleton = BindSkeleton::new(bones).unwrap();
        let rotation = skeleton.model_rotation("child").unwrap();
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(0.75), 1e-6));
    }

    #[test]
    fn empty_and_broken_assets_are_errors() {
        assert!(matches!(BindSkeleton::new(Vec::new()), Err(SkeletonError::NoBones)));
        assert!(BindSkeleton::from_gltf_slice(b"not a model").is_err());
    }
}
