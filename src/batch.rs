//! Conversions over many pose buffers that share one [Skeleton] (e.g., a crowd of avatars).
//!
//! With the `rayon` feature the buffers are processed on the rayon thread pool, otherwise
//! sequentially. Each buffer is only ever touched by one thread.

use crate::{PoseBuffer, RigidPose, Skeleton};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "rayon")]
fn for_each_buffer<F>(buffers: &mut [PoseBuffer], op: F)
where
    F: Fn(&mut [RigidPose]) + Sync + Send,
{
    buffers.par_iter_mut().for_each(|poses| op(poses.as_mut_slice()));
}

#[cfg(not(feature = "rayon"))]
fn for_each_buffer<F>(buffers: &mut [PoseBuffer], op: F)
where
    F: Fn(&mut [RigidPose]),
{
    buffers.iter_mut().for_each(|poses| op(poses.as_mut_slice()));
}

/// [Skeleton::convert_relative_to_absolute] for every buffer
pub fn convert_relative_to_absolute_batch(skeleton: &Skeleton, buffers: &mut [PoseBuffer]) {
    for_each_buffer(buffers, |poses| skeleton.convert_relative_to_absolute(poses));
}

/// [Skeleton::convert_absolute_to_relative] for every buffer
pub fn convert_absolute_to_relative_batch(skeleton: &Skeleton, buffers: &mut [PoseBuffer]) {
    for_each_buffer(buffers, |poses| skeleton.convert_absolute_to_relative(poses));
}

/// [Skeleton::mirror_relative_poses] for every buffer
pub fn mirror_relative_batch(skeleton: &Skeleton, buffers: &mut [PoseBuffer]) {
    for_each_buffer(buffers, |poses| skeleton.mirror_relative_poses(poses));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Joint;
    use approx::assert_abs_diff_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    fn skeleton() -> Skeleton {
        Skeleton::from_joints(vec![
            Joint::new("Hips", None),
            Joint::new("LeftUpLeg", Some(0)).with_translation(Vector3::new(0.5, -0.2, 0.0)),
            Joint::new("LeftLeg", Some(1)).with_translation(Vector3::new(0.0, -1.0, 0.0)),
            Joint::new("RightUpLeg", Some(0)).with_translation(Vector3::new(-0.5, -0.2, 0.0)),
            Joint::new("RightLeg", Some(3)).with_translation(Vector3::new(0.0, -1.0, 0.0)),
        ])
        .unwrap()
    }

    fn buffers(skeleton: &Skeleton) -> Vec<Vec<RigidPose>> {
        (0..8)
            .map(|k| {
                skeleton
                    .relative_default_poses()
                    .iter()
                    .map(|p| p.with_rotation(UnitQuaternion::from_euler_angles(0.1 * k as f32, 0.0, -0.05 * k as f32)))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_batch_matches_single() {
        let skeleton = skeleton();
        let mut batch = buffers(&skeleton);
        let mut single = batch.clone();

        convert_relative_to_absolute_batch(&skeleton, &mut batch);
        single.iter_mut().for_each(|b| skeleton.convert_relative_to_absolute(b));
        assert_eq!(batch, single);

        mirror_relative_batch(&skeleton, &mut batch);
        single.iter_mut().for_each(|b| skeleton.mirror_relative_poses(b));
        assert_eq!(batch, single);
    }

    #[test]
    fn test_batch_round_trip() {
        let skeleton = skeleton();
        let original = buffers(&skeleton);
        let mut batch = original.clone();

        convert_relative_to_absolute_batch(&skeleton, &mut batch);
        convert_absolute_to_relative_batch(&skeleton, &mut batch);
        for (converted, expected) in batch.iter().zip(&original) {
            for (a, b) in converted.iter().zip(expected) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
            }
        }
    }
}
