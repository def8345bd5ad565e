use std::f32::consts::PI;

use glam::{Mat3, Quat};
use pose_api::{BodyPose, EulerDegrees, FramePose};
use pose_rig::{
    apply_pose, compose_corrections, rotation_to_quat, to_quaternion_map, BindSkeleton, BodyJoint,
    FrameCorrections, PoseViewer, RetargetConfig, RetargetContext,
};

const RIG: &str = r#"{
    "asset": {"version": "2.0"},
    "scene": 0,
    "scenes": [{"nodes": [0]}],
    "nodes": [
        {"name": "Armature", "children": [1]},
        {"name": "mixamorig:Hips", "children": [2, 4], "rotation": [0.0, 0.0, 0.0, 1.0]},
        {"name": "mixamorig:Spine", "children": [3], "rotation": [0.1305262, 0.0, 0.0, 0.9914449]},
        {"name": "mixamorig:Neck"},
        {"name": "mixamorig:LeftUpLeg", "rotation": [0.0, 0.0, 1.0, 0.0]}
    ],
    "skins": [{"joints": [1, 2, 3, 4]}]
}"#;

fn skeleton() -> BindSkeleton {
    BindSkeleton::from_gltf_slice(RIG.as_bytes()).unwrap()
}

fn sample_pose() -> BodyPose {
    let mut pose = BodyPose::identity();
    pose.rotations[BodyJoint::Pelvis.index()] = Some(Mat3::from_rotation_y(0.4));
    pose.rotations[BodyJoint::Spine1.index()] = Some(Mat3::from_rotation_x(-0.2));
    pose.rotations[BodyJoint::LeftHip.index()] = Some(Mat3::from_rotation_z(0.9));
    pose
}

fn rotations(skeleton: &BindSkeleton) -> Vec<Quat> {
    skeleton.bones().iter().map(|b| b.rotation).collect()
}

#[test]
fn retargeting_twice_is_bit_identical() {
    let mut skeleton = skeleton();
    let context = RetargetContext::new(&RetargetConfig::default(), skeleton.rest_pose());
    let pose = to_quaternion_map(&sample_pose(), &BodyJoint::ALL);

    apply_pose(&pose, &mut skeleton, &context);
    let first = rotations(&skeleton);
    apply_pose(&pose, &mut skeleton, &context);
    let second = rotations(&skeleton);

    assert_eq!(first, second);
}

#[test]
fn zero_degree_correction_changes_nothing() {
    let pose = to_quaternion_map(&sample_pose(), &BodyJoint::ALL);
    let mut corrected = pose.clone();
    compose_corrections(
        &mut corrected,
        &FrameCorrections::from([(BodyJoint::Spine1.index() as u32, EulerDegrees::ZERO)]),
    );
    assert_eq!(corrected, pose);

    let context = RetargetContext::new(&RetargetConfig::default(), skeleton().rest_pose());
    assert_eq!(context.solve(&corrected), context.solve(&pose));
}

#[test]
fn identity_pose_leaves_rest_and_flips_root() {
    let mut skeleton = skeleton();
    let rest = skeleton.rest_pose();
    let context = RetargetContext::new(&RetargetConfig::default(), rest.clone());
    let pose = to_quaternion_map(&BodyPose::identity(), &BodyJoint::ALL);
    let posed = apply_pose(&pose, &mut skeleton, &context);
    assert_eq!(posed, 4);

    for name in ["mixamorigSpine", "mixamorigNeck", "mixamorigLeftUpLeg"] {
        let bone = skeleton.bone(name).unwrap();
        assert!(bone.rotation.abs_diff_eq(rest.get(name).unwrap(), 1e-6), "{name}");
    }
    let hips = skeleton.bone("mixamorigHips").unwrap();
    assert!(hips.rotation.abs_diff_eq(Quat::from_rotation_z(PI), 1e-6));
}

#[test]
fn identity_matrix_round_trip() {
    let q = rotation_to_quat(&Mat3::IDENTITY).unwrap();
    assert_eq!(q, Quat::IDENTITY);
    let base = Quat::from_rotation_x(0.7);
    assert_eq!(base * q, base);
}

#[test]
fn viewer_applies_frame_corrections() {
    let mut viewer = PoseViewer::default();
    assert!(viewer.load_skeleton(RIG.as_bytes()));

    let frame = FramePose {
        frame_index: 3,
        body_pose: Some(BodyPose::identity()),
        ..Default::default()
    };
    viewer
        .corrections_mut()
        .set(3, BodyJoint::Spine1.index() as u32, EulerDegrees::new(0.0, 90.0, 0.0));
    assert!(viewer.show_frame(&frame));

    let rest = viewer.context().rest_pose().get("mixamorigSpine").unwrap();
    let spine = viewer.skeleton().unwrap().bone("mixamorigSpine").unwrap().rotation;
    assert!(spine.abs_diff_eq(rest * Quat::from_rotation_y(PI / 2.0), 1e-6));

    // Other frames are not corrected.
    let other = FramePose {
        frame_index: 4,
        ..frame
    };
    assert!(viewer.show_frame(&other));
    let spine = viewer.skeleton().unwrap().bone("mixamorigSpine").unwrap().rotation;
    assert!(spine.abs_diff_eq(rest, 1e-6));
}

#[test]
fn viewers_do_not_share_rest_poses() {
    let mut a = PoseViewer::default();
    let mut b = PoseViewer::default();
    assert!(a.load_skeleton(RIG.as_bytes()));
    assert!(b.load_skeleton(RIG.as_bytes()));

    let frame = FramePose {
        body_pose: Some(sample_pose()),
        ..Default::default()
    };
    a.show_frame(&frame);
    assert_ne!(
        a.skeleton().unwrap().bone("mixamorigHips").unwrap().rotation,
        b.skeleton().unwrap().bone("mixamorigHips").unwrap().rotation
    );
    assert_eq!(*a.context().rest_pose(), *b.context().rest_pose());
}

#[test]
fn frame_without_rotations_is_a_no_op() {
    let mut viewer = PoseViewer::default();
    assert!(viewer.load_skeleton(RIG.as_bytes()));
    let before: Vec<_> = viewer.skeleton().unwrap().bones().to_vec();
    assert!(!viewer.show_frame(&FramePose::default()));
    assert_eq!(viewer.skeleton().unwrap().bones(), before.as_slice());
}
