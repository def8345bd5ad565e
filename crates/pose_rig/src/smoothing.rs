use glam::{Mat3, Quat, Vec4};
use pose_api::BodyPose;

use crate::rotation_to_quat;

/// Truncated at four sigma, and never wider than `max_radius` on either side.
fn gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    let radius = ((4.0 * sigma + 0.5) as usize).min(max_radius);
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Gaussian-smooths each joint's rotation over time.
///
/// Quaternions are sign-aligned with the previous frame before filtering and
/// renormalized after; the sequence is padded by repeating its end frames.
/// Entries without a valid rotation stay `None` and do not contribute. A
/// non-positive or non-finite `sigma` returns the input unchanged.
pub fn smooth_sequence(frames: &[BodyPose], sigma: f32) -> Vec<BodyPose> {
    if frames.is_empty() {
        return Vec::new();
    }
    if !(sigma > 0.0) || !sigma.is_finite() {
        if sigma != 0.0 {
            tracing::warn!("not smoothing with sigma {}", sigma);
        }
        return frames.to_vec();
    }

    // Taps past the sequence length only ever read the padded end frames.
    let kernel = gaussian_kernel(sigma, frames.len());
    let radius = kernel.len() / 2;
    let joints = frames.iter().map(|f| f.rotations.len()).max().unwrap_or(0);
    let mut out: Vec<BodyPose> = frames.to_vec();

    for joint in 0..joints {
        let mut track: Vec<Option<Vec4>> = Vec::with_capacity(frames.len());
        let mut previous: Option<Vec4> = None;
        for frame in frames {
            let q = frame.get(joint).and_then(|m| rotation_to_quat(&m)).map(|q| {
                let mut v = Vec4::from(q);
                if previous.is_some_and(|p| p.dot(v) < 0.0) {
                    v = -v;
                }
                v
            });
            if q.is_some() {
                previous = q;
            }
            track.push(q);
        }

        // Gaps take the last valid sample so the filter never reads garbage.
        let mut filled = Vec::with_capacity(track.len());
        let mut last = track.iter().flatten().next().copied();
        for sample in &track {
            if sample.is_some() {
                last = *sample;
            }
            filled.push(last);
        }
        let Some(filled) = filled.into_iter().collect::<Option<Vec<Vec4>>>() else {
            continue;
        };

        let n = filled.len() as isize;
        for (i, sample) in track.iter().enumerate() {
            if sample.is_none() {
                continue;
            }
            let mut acc = Vec4::ZERO;
            for (k, weight) in kernel.iter().enumerate() {
                let j = (i as isize + k as isize - radius as isize).clamp(0, n - 1);
                acc += filled[j as usize] * *weight;
            }
            let length = acc.length();
            if length <= f32::EPSILON {
                continue;
            }
            let q = Quat::from_vec4(acc / length);
            out[i].rotations[joint] = Some(Mat3::from_quat(q));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with(joint: usize, m: Mat3) -> BodyPose {
        let mut pose = BodyPose::identity();
        pose.rotations[joint] = Some(m);
        pose
    }

    #[test]
    fn kernel_is_normalized_and_truncated() {
        let kernel = gaussian_kernel(2.0, 100);
        assert_eq!(kernel.len(), 17);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(kernel[8] > kernel[7]);

        assert_eq!(gaussian_kernel(2.0, 3).len(), 7);
    }

    #[test]
    fn huge_sigma_stays_bounded() {
        let kernel = gaussian_kernel(1e30, 4);
        assert_eq!(kernel.len(), 9);
        assert!(kernel.iter().all(|w| w.is_finite()));

        let mut frames = vec![BodyPose::identity(); 3];
        frames[1] = pose_with(3, Mat3::from_rotation_x(0.9));
        let smoothed = smooth_sequence(&frames, 1e30);
        assert_eq!(smoothed.len(), 3);
        assert!(smoothed[1].get(3).unwrap().is_finite());
    }

    #[test]
    fn non_finite_sigma_is_passthrough() {
        let frames = vec![pose_with(2, Mat3::from_rotation_x(0.3)); 2];
        assert_eq!(smooth_sequence(&frames, f32::INFINITY), frames);
        assert_eq!(smooth_sequence(&frames, f32::NAN), frames);
    }

    #[test]
    fn constant_sequence_is_unchanged() {
        let m = Mat3::from_rotation_x(0.6);
        let frames = vec![pose_with(5, m); 6];
        let smoothed = smooth_sequence(&frames, 1.5);
        for frame in &smoothed {
            assert!(frame.get(5).unwrap().abs_diff_eq(m, 1e-5));
            assert!(frame.get(0).unwrap().abs_diff_eq(Mat3::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn spike_is_damped() {
        let mut frames = vec![BodyPose::identity(); 9];
        frames[4] = pose_with(1, Mat3::from_rotation_z(1.0));
        let smoothed = smooth_sequence(&frames, 1.0);

        let angle = |m: Mat3| Quat::from_mat3(&m).angle_between(Quat::IDENTITY);
        let spike = angle(smoothed[4].get(1).unwrap());
        assert!(spike < 1.0 && spike > 0.0);
        assert!(angle(smoothed[3].get(1).unwrap()) > 0.0);
    }

    #[test]
    fn sign_flips_do_not_cancel_out() {
        // q and -q are the same rotation; averaging them naively gives zero.
        let q = Quat::from_rotation_y(0.8);
        let frames: Vec<_> = (0..5)
            .map(|i| {
                let q = if i % 2 == 0 { q } else { -q };
                let mut pose = BodyPose::default();
                pose.rotations.push(Some(Mat3::from_quat(q)));
                pose
            })
            .collect();
        let smoothed = smooth_sequence(&frames, 1.0);
        for frame in &smoothed {
            assert!(frame.get(0).unwrap().abs_diff_eq(Mat3::from_rotation_y(0.8), 1e-5));
        }
    }

    #[test]
    fn gaps_stay_gaps() {
        let mut frames = vec![BodyPose::identity(); 4];
        frames[2].rotations[7] = None;
        let smoothed = smooth_sequence(&frames, 1.0);
        assert_eq!(smoothed[2].get(7), None);
        assert!(smoothed[1].get(7).is_some());
    }

    #[test]
    fn zero_sigma_is_passthrough() {
        let frames = vec![pose_with(2, Mat3::from_rotation_x(0.3))];
        assert_eq!(smooth_sequence(&frames, 0.0), frames);
    }
}
