use std::collections::BTreeMap;

use glam::{Mat3, Quat};
use pose_api::{BodyPose, EulerDegrees};

use crate::BodyJoint;

/// Local joint rotations keyed by joint. Absent joints stay at rest.
pub type JointRotations = BTreeMap<BodyJoint, Quat>;

/// Unit quaternion of a rotation matrix, or `None` for non-finite,
/// degenerate or mirrored input.
pub fn rotation_to_quat(m: &Mat3) -> Option<Quat> {
    if !m.is_finite() || m.determinant() <= 0.0 {
        return None;
    }

    let q = Quat::from_mat3(m);
    let length = q.length();
    if !length.is_finite() || length <= f32::EPSILON {
        return None;
    }
    Some(q / length)
}

/// Converts a rotation block into named quaternions following `order`.
///
/// A short or partially malformed block yields a partial map.
pub fn to_quaternion_map(pose: &BodyPose, order: &[BodyJoint]) -> JointRotations {
    let mut rotations = JointRotations::new();
    for (index, joint) in order.iter().enumerate() {
        let Some(matrix) = pose.get(index) else {
            continue;
        };
        match rotation_to_quat(&matrix) {
            Some(q) => {
                rotations.insert(*joint, q);
            }
            None => tracing::debug!("skipping invalid rotation for {}", joint.name()),
        }
    }
    rotations
}

/// Rotation of an operator correction: X, then Y, then Z about the rotating
/// axes, angles in degrees.
pub fn euler_delta(euler: &EulerDegrees) -> Quat {
    Quat::from_rotation_x(euler.x.to_radians())
        * Quat::from_rotation_y(euler.y.to_radians())
        * Quat::from_rotation_z(euler.z.to_radians())
}
