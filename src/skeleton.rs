/*! The joint hierarchy: cached default poses, lookups, and in-place pose buffer conversions.
 *
 * All algorithms walk joint indices and rely on parents being stored before their children
 * (`parent < index`). [Skeleton::new] validates this, so every method can assume it.
 */

use crate::{Joint, MirrorRules, RigidPose, SkeletonError};
use itertools::izip;
use nalgebra::{UnitQuaternion, Vector3};
use std::collections::HashMap;
use tracing::{debug, trace, warn};
use tracing_attributes::instrument;

/// A read-only joint hierarchy built once from a rig's joint list.
///
/// Pose buffers are flat slices of [RigidPose] indexed like the joints. They are owned by the caller
/// and converted in place. Only the prefix `min(buffer.len(), num_joints)` is touched; trailing
/// entries are left alone so partial buffers (e.g., simplified LOD rigs) are tolerated.
///
/// The skeleton holds no mutable state after construction and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    joint_indices: HashMap<String, usize>,
    relative_default_poses: Vec<RigidPose>,
    absolute_default_poses: Vec<RigidPose>,
    relative_pre_rotation_poses: Vec<RigidPose>,
    relative_post_rotation_poses: Vec<RigidPose>,
    mirror_map: Vec<usize>,
    /// Ascending
    non_mirrored_indices: Vec<usize>,
    rules: MirrorRules,
}

impl Skeleton {
    /// Builds a skeleton with the default [MirrorRules].
    ///
    /// `rotation_offsets` maps joint indices to corrective rotations that are applied to the
    /// *absolute* default pose of that joint (realigning an imported rig without touching the asset).
    pub fn new(
        joints: Vec<Joint>,
        rotation_offsets: &HashMap<usize, UnitQuaternion<f32>>,
    ) -> Result<Self, SkeletonError> {
        Self::with_rules(joints, rotation_offsets, MirrorRules::default())
    }

    /// Builds a skeleton without rotation offsets and with the default [MirrorRules]
    pub fn from_joints(joints: Vec<Joint>) -> Result<Self, SkeletonError> {
        Self::with_rules(joints, &HashMap::new(), MirrorRules::default())
    }

    #[instrument(skip_all, fields(joints = joints.len(), offsets = rotation_offsets.len()))]
    pub fn with_rules(
        joints: Vec<Joint>,
        rotation_offsets: &HashMap<usize, UnitQuaternion<f32>>,
        rules: MirrorRules,
    ) -> Result<Self, SkeletonError> {
        validate(&joints)?;
        let count = joints.len();
        for index in rotation_offsets.keys().filter(|&&k| k >= count) {
            warn!(index, "ignoring rotation offset for a joint the skeleton does not have");
        }

        let mut relative_pre_rotation_poses = Vec::with_capacity(count);
        let mut relative_post_rotation_poses = Vec::with_capacity(count);
        let mut absolute_default_poses: Vec<RigidPose> = Vec::with_capacity(count);

        for (index, joint) in joints.iter().enumerate() {
            relative_pre_rotation_poses.push(RigidPose::from_matrix(&joint.pre_rotation_transform()));
            relative_post_rotation_poses.push(RigidPose::from_matrix(&joint.post_rotation_transform()));

            let relative = RigidPose::from_matrix(&joint.relative_default_matrix());
            if !(relative.scale() > 0.0 && relative.scale().is_finite()) {
                return Err(SkeletonError::DegenerateScale(index));
            }
            trace!(index, name = %joint.name, pose = %relative, "relative default pose");

            let absolute = match joint.parent {
                Some(parent) => absolute_default_poses[parent] * relative,
                None => relative,
            };
            absolute_default_poses.push(absolute);
        }

        // Offsets correct the absolute defaults, so relative defaults can only be derived after
        // every parent has received its own offset (parents precede children).
        let mut relative_default_poses = Vec::with_capacity(count);
        for (index, joint) in joints.iter().enumerate() {
            if let Some(offset) = rotation_offsets.get(&index) {
                let local_offset = RigidPose::from_rotation_translation(*offset, Vector3::zeros());
                absolute_default_poses[index] = absolute_default_poses[index] * local_offset;
            }
            relative_default_poses.push(match joint.parent {
                Some(parent) => absolute_default_poses[parent].inverse() * absolute_default_poses[index],
                None => absolute_default_poses[index],
            });
        }

        let mut joint_indices = HashMap::with_capacity(count);
        for (index, joint) in joints.iter().enumerate() {
            if let Some(previous) = joint_indices.insert(joint.name.clone(), index) {
                warn!(name = %joint.name, previous, index, "duplicate joint name, lookups resolve to the later joint");
            }
        }

        let mirror = rules.build_mirror_map(joints.iter().map(|j| j.name.as_str()), |name| {
            joint_indices.get(name).copied()
        });

        debug!(
            non_mirrored = mirror.non_mirrored.len(),
            paired = mirror.map.iter().enumerate().filter(|(i, m)| i != *m).count(),
            "built skeleton"
        );

        Ok(Skeleton {
            joints,
            joint_indices,
            relative_default_poses,
            absolute_default_poses,
            relative_pre_rotation_poses,
            relative_post_rotation_poses,
            mirror_map: mirror.map,
            non_mirrored_indices: mirror.non_mirrored,
            rules,
        })
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn rules(&self) -> &MirrorRules {
        &self.rules
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_indices.get(name).copied()
    }

    /// Resolves several names at once, emits a warning for each name that is not found
    pub fn lookup_joint_indices<S: AsRef<str>>(&self, names: &[S]) -> Vec<Option<usize>> {
        names
            .iter()
            .map(|name| {
                let name: &str = name.as_ref();
                let index = self.joint_index(name);
                if index.is_none() {
                    warn!(name, "could not find joint");
                }
                index
            })
            .collect()
    }

    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.joints.get(index)?.parent
    }

    pub fn joint_name(&self, index: usize) -> Option<&str> {
        self.joints.get(index).map(|j| j.name.as_str())
    }

    /// Iterates from `index` (inclusive) up to its root. Empty for an invalid index.
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            joints: &self.joints,
            next: (index < self.joints.len()).then_some(index),
        }
    }

    /// Number of joints on the path from the root to `index`, both inclusive. Zero for an invalid index.
    pub fn chain_depth(&self, index: usize) -> usize {
        self.ancestors(index).count()
    }

    /// All descendants of `index` (children, grandchildren, ...) in ascending order
    pub fn children_of(&self, index: usize) -> Vec<usize> {
        let mut result: Vec<usize> = vec![];
        for (i, joint) in self.joints.iter().enumerate().skip(index.saturating_add(1)) {
            if let Some(parent) = joint.parent {
                if parent == index || result.binary_search(&parent).is_ok() {
                    result.push(i);
                }
            }
        }
        result
    }

    pub fn relative_default_pose(&self, index: usize) -> Option<&RigidPose> {
        self.relative_default_poses.get(index)
    }

    pub fn absolute_default_pose(&self, index: usize) -> Option<&RigidPose> {
        self.absolute_default_poses.get(index)
    }

    pub fn relative_default_poses(&self) -> &[RigidPose] {
        &self.relative_default_poses
    }

    pub fn absolute_default_poses(&self) -> &[RigidPose] {
        &self.absolute_default_poses
    }

    /// `pre_transform * pre_rotation` of the joint as a pose
    pub fn pre_rotation_pose(&self, index: usize) -> Option<&RigidPose> {
        self.relative_pre_rotation_poses.get(index)
    }

    /// `post_rotation * post_transform` of the joint as a pose
    pub fn post_rotation_pose(&self, index: usize) -> Option<&RigidPose> {
        self.relative_post_rotation_poses.get(index)
    }

    pub fn mirror_map(&self) -> &[usize] {
        &self.mirror_map
    }

    pub fn mirror_index(&self, index: usize) -> Option<usize> {
        self.mirror_map.get(index).copied()
    }

    pub fn non_mirrored_indices(&self) -> &[usize] {
        &self.non_mirrored_indices
    }

    /// Composes the relative poses from the root down to `index`.
    ///
    /// Returns the identity if `index` is outside the skeleton or the buffer.
    pub fn absolute_pose(&self, index: usize, relative_poses: &[RigidPose]) -> RigidPose {
        if index >= relative_poses.len() || index >= self.joints.len() {
            return RigidPose::IDENTITY;
        }
        // ancestors have lower indices and are therefore inside the buffer
        self.ancestors(index)
            .fold(RigidPose::IDENTITY, |accumulated, i| relative_poses[i] * accumulated)
    }

    /// Converts a buffer from parent-relative to root-relative poses in place.
    ///
    /// Walks indices in ascending order; requires `parent < index`.
    pub fn convert_relative_to_absolute(&self, poses: &mut [RigidPose]) {
        let last = poses.len().min(self.joints.len());
        for i in 0..last {
            if let Some(parent) = self.joints[i].parent {
                poses[i] = poses[parent] * poses[i];
            }
        }
    }

    /// Converts a buffer from root-relative to parent-relative poses in place.
    ///
    /// Walks indices in descending order; requires `parent < index`, so a parent is still absolute
    /// when its children are converted.
    pub fn convert_absolute_to_relative(&self, poses: &mut [RigidPose]) {
        let last = poses.len().min(self.joints.len());
        for i in (0..last).rev() {
            if let Some(parent) = self.joints[i].parent {
                poses[i] = poses[parent].inverse() * poses[i];
            }
        }
    }

    /// Same as [Skeleton::convert_absolute_to_relative] for rotations only
    pub fn convert_absolute_rotations_to_relative(&self, rotations: &mut [UnitQuaternion<f32>]) {
        let last = rotations.len().min(self.joints.len());
        for i in (0..last).rev() {
            if let Some(parent) = self.joints[i].parent {
                rotations[i] = rotations[parent].inverse() * rotations[i];
            }
        }
    }

    /// Copies the poses of the non-mirrored joints, to be handed to [Skeleton::restore_non_mirrored_poses]
    pub fn save_non_mirrored_poses(&self, poses: &[RigidPose]) -> Vec<RigidPose> {
        self.non_mirrored_indices
            .iter()
            .map_while(|&i| poses.get(i).copied())
            .collect()
    }

    pub fn restore_non_mirrored_poses(&self, poses: &mut [RigidPose], saved: &[RigidPose]) {
        for (&index, pose) in izip!(&self.non_mirrored_indices, saved) {
            if let Some(slot) = poses.get_mut(index) {
                *slot = *pose;
            }
        }
    }

    /// Swaps left and right in a buffer of absolute poses and reflects each pose about the x axis.
    ///
    /// Reads from a snapshot, so a joint and its counterpart can be exchanged safely.
    pub fn mirror_absolute_poses(&self, poses: &mut [RigidPose]) {
        let last = poses.len().min(self.joints.len());
        let snapshot = poses[..last].to_vec();
        for (pose, &target) in izip!(&snapshot, &self.mirror_map) {
            if let Some(slot) = poses.get_mut(target) {
                *slot = pose.mirror();
            }
        }
    }

    /// Mirrors a buffer of relative poses in place.
    ///
    /// The relative poses of the non-mirrored joints (see [MirrorRules]) are left untouched.
    pub fn mirror_relative_poses(&self, poses: &mut [RigidPose]) {
        let saved = self.save_non_mirrored_poses(poses);
        self.convert_relative_to_absolute(poses);
        self.mirror_absolute_poses(poses);
        self.convert_absolute_to_relative(poses);
        self.restore_non_mirrored_poses(poses, &saved);
    }
}

fn validate(joints: &[Joint]) -> Result<(), SkeletonError> {
    for (index, joint) in joints.iter().enumerate() {
        match joint.parent {
            Some(parent) if parent >= index => return Err(SkeletonError::InvalidParent { joint: index, parent }),
            _ => {}
        }
    }
    Ok(())
}

/// Iterator over a joint and its ancestors, see [Skeleton::ancestors]
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    joints: &'a [Joint],
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.joints[current].parent;
        Some(current)
    }
}
