/*! The joint description consumed (read-only) when building a [crate::Skeleton] */

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// A single node of an authored rig as produced by a model loader.
///
/// The relative default transformation is
/// `translate(translation) * pre_transform * pre_rotation * rotation * post_rotation * post_transform`.
/// Joints are stored in a flat list; `parent` refers to an index in that list and must be lower
/// than the joint's own index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    pub name: String,
    /// `None` for root joints
    pub parent: Option<usize>,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub pre_rotation: UnitQuaternion<f32>,
    pub post_rotation: UnitQuaternion<f32>,
    pub pre_transform: Matrix4<f32>,
    pub post_transform: Matrix4<f32>,
}

impl Joint {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Joint {
            name: name.into(),
            parent,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            pre_rotation: UnitQuaternion::identity(),
            post_rotation: UnitQuaternion::identity(),
            pre_transform: Matrix4::identity(),
            post_transform: Matrix4::identity(),
        }
    }

    pub fn with_translation(mut self, translation: Vector3<f32>) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_pre_rotation(mut self, pre_rotation: UnitQuaternion<f32>) -> Self {
        self.pre_rotation = pre_rotation;
        self
    }

    pub fn with_post_rotation(mut self, post_rotation: UnitQuaternion<f32>) -> Self {
        self.post_rotation = post_rotation;
        self
    }

    pub fn with_pre_transform(mut self, pre_transform: Matrix4<f32>) -> Self {
        self.pre_transform = pre_transform;
        self
    }

    pub fn with_post_transform(mut self, post_transform: Matrix4<f32>) -> Self {
        self.post_transform = post_transform;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// `pre_transform * pre_rotation`, the authoring correction applied before the joint rotation
    pub fn pre_rotation_transform(&self) -> Matrix4<f32> {
        self.pre_transform * self.pre_rotation.to_homogeneous()
    }

    /// `post_rotation * post_transform`, the authoring correction applied after the joint rotation
    pub fn post_rotation_transform(&self) -> Matrix4<f32> {
        self.post_rotation.to_homogeneous() * self.post_transform
    }

    /// Default transformation relative to the parent joint as a homogeneous matrix
    pub fn relative_default_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.pre_rotation_transform()
            * self.rotation.to_homogeneous()
            * self.post_rotation_transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_defaults() {
        let joint = Joint::new("Hips", None);
        assert!(joint.is_root());
        assert_eq!(joint.relative_default_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_relative_default_matrix_order() {
        // the rotation acts before the translation, the pre-transform sits in between
        let joint = Joint::new("LeftArm", Some(0))
            .with_translation(Vector3::new(1.0, 0.0, 0.0))
            .with_pre_transform(Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)))
            .with_rotation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2));

        let origin = joint.relative_default_matrix().transform_point(&Point3::origin());
        assert_abs_diff_eq!(origin.coords, Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-6);

        let tip = joint.relative_default_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(tip.coords, Vector3::new(1.0, 3.0, 0.0), epsilon = 1e-6);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_json() {
        let joint = Joint::new("LeftArm", Some(3))
            .with_translation(Vector3::new(1.0, 2.5, -0.25))
            .with_rotation(UnitQuaternion::new_normalize(nalgebra::Quaternion::new(0.5, 0.5, 0.5, 0.5)))
            .with_post_transform(Matrix4::new_scaling(2.0));
        let json = serde_json::to_string(&joint).unwrap();
        let decoded: Joint = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, joint);

        let root: Joint = serde_json::from_str(&serde_json::to_string(&Joint::new("Hips", None)).unwrap()).unwrap();
        assert!(root.is_root());
    }
}
