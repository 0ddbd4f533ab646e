//! Human readable listings of a [Skeleton] for diagnostics.
//!
//! Nothing is logged here; route the output through `tracing`, e.g.,
//! `tracing::debug!("{}", skeleton.dump(false))`.

use crate::{RigidPose, Skeleton};
use core::fmt;

/// See [Skeleton::dump]
pub struct SkeletonDump<'a> {
    skeleton: &'a Skeleton,
    verbose: bool,
}

/// See [Skeleton::dump_poses]
pub struct PoseDump<'a> {
    skeleton: &'a Skeleton,
    poses: &'a [RigidPose],
}

impl Skeleton {
    /// Lists index, name, default poses, and parent of every joint. `verbose` adds the authored joint data.
    pub fn dump(&self, verbose: bool) -> SkeletonDump<'_> {
        SkeletonDump { skeleton: self, verbose }
    }

    /// Like [Skeleton::dump] with the current value of each joint in `poses`
    pub fn dump_poses<'a>(&'a self, poses: &'a [RigidPose]) -> PoseDump<'a> {
        PoseDump { skeleton: self, poses }
    }
}

fn write_joint_header(f: &mut fmt::Formatter<'_>, skeleton: &Skeleton, index: usize) -> fmt::Result {
    writeln!(f, "    {{")?;
    writeln!(f, "        index = {index}")?;
    writeln!(f, "        name = {}", skeleton.joint_name(index).unwrap_or_default())?;
    if let Some(pose) = skeleton.absolute_default_pose(index) {
        writeln!(f, "        absDefaultPose = {pose}")?;
    }
    if let Some(pose) = skeleton.relative_default_pose(index) {
        writeln!(f, "        relDefaultPose = {pose}")?;
    }
    Ok(())
}

fn write_joint_footer(f: &mut fmt::Formatter<'_>, skeleton: &Skeleton, index: usize) -> fmt::Result {
    if let Some(parent) = skeleton.parent_index(index).and_then(|p| skeleton.joint_name(p)) {
        writeln!(f, "        parent = {parent}")?;
    }
    writeln!(f, "    }},")
}

impl<'a> fmt::Display for SkeletonDump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for (index, joint) in self.skeleton.joints().iter().enumerate() {
            write_joint_header(f, self.skeleton, index)?;
            if self.verbose {
                writeln!(f, "        joint =")?;
                writeln!(f, "            parentIndex = {:?}", joint.parent)?;
                writeln!(f, "            translation = {:?}", joint.translation.as_slice())?;
                writeln!(f, "            preTransform = {:?}", joint.pre_transform.as_slice())?;
                writeln!(f, "            preRotation = {:?}", joint.pre_rotation.coords.as_slice())?;
                writeln!(f, "            rotation = {:?}", joint.rotation.coords.as_slice())?;
                writeln!(f, "            postRotation = {:?}", joint.post_rotation.coords.as_slice())?;
                writeln!(f, "            postTransform = {:?}", joint.post_transform.as_slice())?;
            }
            write_joint_footer(f, self.skeleton, index)?;
        }
        write!(f, "]")
    }
}

impl<'a> fmt::Display for PoseDump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for index in 0..self.skeleton.num_joints() {
            write_joint_header(f, self.skeleton, index)?;
            match self.poses.get(index) {
                Some(pose) => writeln!(f, "        pose = {pose}")?,
                None => writeln!(f, "        pose = <missing>")?,
            }
            write_joint_footer(f, self.skeleton, index)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use crate::{Joint, RigidPose, Skeleton};
    use nalgebra::Vector3;

    fn skeleton() -> Skeleton {
        Skeleton::from_joints(vec![
            Joint::new("Hips", None),
            Joint::new("Spine", Some(0)).with_translation(Vector3::new(0.0, 1.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_dump() {
        let skeleton = skeleton();
        let short = skeleton.dump(false).to_string();
        assert!(short.starts_with("[\n"));
        assert!(short.contains("name = Spine"));
        assert!(short.contains("parent = Hips"));
        assert!(short.contains("relDefaultPose = (trans: [0, 1, 0]"));
        assert!(!short.contains("preTransform"));

        let verbose = skeleton.dump(true).to_string();
        assert!(verbose.contains("preTransform"));
        assert!(verbose.contains("parentIndex = Some(0)"));
    }

    #[test]
    fn test_dump_poses() {
        let skeleton = skeleton();
        let poses = [RigidPose::IDENTITY];
        let dump = skeleton.dump_poses(&poses).to_string();
        assert!(dump.contains("pose = (trans: [0, 0, 0]"));
        assert!(dump.contains("pose = <missing>"));
    }
}
