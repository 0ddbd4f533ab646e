//! Naming conventions that decide how joints are paired and which joints survive a mirror pass.
//!
//! The defaults match the usual humanoid rig naming (`LeftArm`/`RightArm`, `Hips`, `Spine`, ...).

use itertools::Itertools;

/// Side of a joint as derived from its name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Configuration of the mirror map.
///
/// * Joints whose name starts with `left_prefix` are paired with the joint whose name has the
///   prefix swapped for `right_prefix` (and vice versa). Unmatched joints map onto themselves.
/// * Centre joints, paired exceptions (e.g. the eyes), and all joints without a side prefix are
///   *non-mirrored*: their relative poses are restored after mirroring.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct MirrorRules {
    pub left_prefix: String,
    pub right_prefix: String,
    pub centre_joints: Vec<String>,
    pub paired_exceptions: Vec<String>,
}

impl Default for MirrorRules {
    fn default() -> Self {
        MirrorRules::new("Left", "Right")
            .with_centre_joints(["Hips", "Spine", "Spine1", "Spine2", "Neck", "Head"])
            .with_paired_exceptions(["LeftEye", "RightEye"])
    }
}

impl MirrorRules {
    /// Rules without any centre joints or exceptions
    pub fn new(left_prefix: impl Into<String>, right_prefix: impl Into<String>) -> Self {
        MirrorRules {
            left_prefix: left_prefix.into(),
            right_prefix: right_prefix.into(),
            centre_joints: vec![],
            paired_exceptions: vec![],
        }
    }

    pub fn with_centre_joints<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.centre_joints = names.into_iter().map_into::<String>().collect_vec();
        self
    }

    pub fn with_paired_exceptions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paired_exceptions = names.into_iter().map_into::<String>().collect_vec();
        self
    }

    pub fn side(&self, name: &str) -> Option<Side> {
        if name.starts_with(self.left_prefix.as_str()) {
            Some(Side::Left)
        } else if name.starts_with(self.right_prefix.as_str()) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Name with the side prefix swapped, `None` if the name has no side prefix
    pub fn counterpart_name(&self, name: &str) -> Option<String> {
        match self.side(name)? {
            Side::Left => Some(format!("{}{}", self.right_prefix, &name[self.left_prefix.len()..])),
            Side::Right => Some(format!("{}{}", self.left_prefix, &name[self.right_prefix.len()..])),
        }
    }

    pub fn is_non_mirrored(&self, name: &str) -> bool {
        self.centre_joints.iter().any(|n| n == name)
            || self.paired_exceptions.iter().any(|n| n == name)
            || self.side(name).is_none()
    }

    /// Builds the mirror map and the list of non-mirrored joints for a sequence of joint names.
    ///
    /// `lookup` resolves a name to a joint index. Paired exceptions still map onto their
    /// counterpart; they are restored afterwards anyway.
    pub fn build_mirror_map<'a, I, F>(&self, names: I, lookup: F) -> MirrorMap
    where
        I: IntoIterator<Item = &'a str>,
        F: Fn(&str) -> Option<usize>,
    {
        let mut map = vec![];
        let mut non_mirrored = vec![];
        for (index, name) in names.into_iter().enumerate() {
            if self.is_non_mirrored(name) {
                non_mirrored.push(index);
            }
            let counterpart = self.counterpart_name(name).and_then(|n| lookup(&n));
            map.push(counterpart.unwrap_or(index));
        }
        MirrorMap { map, non_mirrored }
    }
}

/// Output of [MirrorRules::build_mirror_map]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorMap {
    /// For each joint, the index of its left/right counterpart (itself if none)
    pub map: Vec<usize>,
    /// Ascending indices of the joints that are saved and restored around a mirror pass
    pub non_mirrored: Vec<usize>,
}
