use serde::{Deserialize, Serialize};

/// Joints of the 24-joint body model, in rotation-block order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyJoint {
    Pelvis,
    LeftHip,
    RightHip,
    Spine1,
    LeftKnee,
    RightKnee,
    Spine2,
    LeftAnkle,
    RightAnkle,
    Spine3,
    LeftFoot,
    RightFoot,
    Neck,
    LeftCollar,
    RightCollar,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHand,
    RightHand,
}

impl BodyJoint {
    pub const ALL: [BodyJoint; 24] = [
        BodyJoint::Pelvis,
        BodyJoint::LeftHip,
        BodyJoint::RightHip,
        BodyJoint::Spine1,
        BodyJoint::LeftKnee,
        BodyJoint::RightKnee,
        BodyJoint::Spine2,
        BodyJoint::LeftAnkle,
        BodyJoint::RightAnkle,
        BodyJoint::Spine3,
        BodyJoint::LeftFoot,
        BodyJoint::RightFoot,
        BodyJoint::Neck,
        BodyJoint::LeftCollar,
        BodyJoint::RightCollar,
        BodyJoint::Head,
        BodyJoint::LeftShoulder,
        BodyJoint::RightShoulder,
        BodyJoint::LeftElbow,
        BodyJoint::RightElbow,
        BodyJoint::LeftWrist,
        BodyJoint::RightWrist,
        BodyJoint::LeftHand,
        BodyJoint::RightHand,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<BodyJoint> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BodyJoint::Pelvis => "pelvis",
            BodyJoint::LeftHip => "left_hip",
            BodyJoint::RightHip => "right_hip",
            BodyJoint::Spine1 => "spine1",
            BodyJoint::LeftKnee => "left_knee",
            BodyJoint::RightKnee => "right_knee",
            BodyJoint::Spine2 => "spine2",
            BodyJoint::LeftAnkle => "left_ankle",
            BodyJoint::RightAnkle => "right_ankle",
            BodyJoint::Spine3 => "spine3",
            BodyJoint::LeftFoot => "left_foot",
            BodyJoint::RightFoot => "right_foot",
            BodyJoint::Neck => "neck",
            BodyJoint::LeftCollar => "left_collar",
            BodyJoint::RightCollar => "right_collar",
            BodyJoint::Head => "head",
            BodyJoint::LeftShoulder => "left_shoulder",
            BodyJoint::RightShoulder => "right_shoulder",
            BodyJoint::LeftElbow => "left_elbow",
            BodyJoint::RightElbow => "right_elbow",
            BodyJoint::LeftWrist => "left_wrist",
            BodyJoint::RightWrist => "right_wrist",
            BodyJoint::LeftHand => "left_hand",
            BodyJoint::RightHand => "right_hand",
        }
    }

    pub fn parent(self) -> Option<BodyJoint> {
        use BodyJoint::*;
        Some(match self {
            Pelvis => return None,
            LeftHip | RightHip | Spine1 => Pelvis,
            LeftKnee => LeftHip,
            RightKnee => RightHip,
            Spine2 => Spine1,
            LeftAnkle => LeftKnee,
            RightAnkle => RightKnee,
            Spine3 => Spine2,
            LeftFoot => LeftAnkle,
            RightFoot => RightAnkle,
            Neck | LeftCollar | RightCollar => Spine3,
            Head => Neck,
            LeftShoulder => LeftCollar,
            RightShoulder => RightCollar,
            LeftElbow => LeftShoulder,
            RightElbow => RightShoulder,
            LeftWrist => LeftElbow,
            RightWrist => RightElbow,
            LeftHand => LeftWrist,
            RightHand => RightWrist,
        })
    }

    pub fn is_root(self) -> bool {
        self == BodyJoint::Pelvis
    }
}

/// Joint-to-bone table for the shipped bind skeleton asset. Collars, feet and
/// hands have no counterpart and are left at rest. Replace this table when
/// the asset is replaced.
pub static DEFAULT_BONE_MAP: &[(BodyJoint, &str)] = &[
    (BodyJoint::Pelvis, "mixamorigHips"),
    (BodyJoint::LeftHip, "mixamorigLeftUpLeg"),
    (BodyJoint::RightHip, "mixamorigRightUpLeg"),
    (BodyJoint::Spine1, "mixamorigSpine"),
    (BodyJoint::LeftKnee, "mixamorigLeftLeg"),
    (BodyJoint::RightKnee, "mixamorigRightLeg"),
    (BodyJoint::Spine2, "mixamorigSpine1"),
    (BodyJoint::LeftAnkle, "mixamorigLeftFoot"),
    (BodyJoint::RightAnkle, "mixamorigRightFoot"),
    (BodyJoint::Spine3, "mixamorigSpine2"),
    (BodyJoint::Neck, "mixamorigNeck"),
    (BodyJoint::Head, "mixamorigHead"),
    (BodyJoint::LeftShoulder, "mixamorigLeftArm"),
    (BodyJoint::RightShoulder, "mixamorigRightArm"),
    (BodyJoint::LeftElbow, "mixamorigLeftForeArm"),
    (BodyJoint::RightElbow, "mixamorigRightForeArm"),
    (BodyJoint::LeftWrist, "mixamorigLeftHand"),
    (BodyJoint::RightWrist, "mixamorigRightHand"),
];
