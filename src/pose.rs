/*! Defines [RigidPose], the uniform-scale rigid transformation all hierarchy math is built on */

use approx::{AbsDiffEq, RelativeEq};
use core::fmt;
use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use std::ops::Mul;

/// Tolerance on the squared quaternion norm before a rotation extracted from a matrix is renormalized.
pub const RENORMALIZE_EPSILON: f32 = 1e-4;

/// A rigid transformation with a uniform scale: translation, rotation, and scale.
///
/// Applying a pose to a point `v` computes `translation + rotation * (scale * v)`.
/// Operators return new values; [RigidPose::blend] is the only method that mutates in place.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidPose {
    scale: f32,
    rotation: UnitQuaternion<f32>,
    translation: Vector3<f32>,
}

impl RigidPose {
    /// Neutral element wrt. [RigidPose::compose]
    pub const IDENTITY: RigidPose = RigidPose {
        scale: 1.0,
        rotation: UnitQuaternion::new_unchecked(Quaternion::new(1.0, 0.0, 0.0, 0.0)),
        translation: Vector3::new(0.0, 0.0, 0.0),
    };

    pub fn new(scale: f32, rotation: UnitQuaternion<f32>, translation: Vector3<f32>) -> Self {
        RigidPose {
            scale,
            rotation,
            translation,
        }
    }

    /// Unscaled pose, e.g., for rotation offsets (zero translation)
    pub fn from_rotation_translation(rotation: UnitQuaternion<f32>, translation: Vector3<f32>) -> Self {
        Self::new(1.0, rotation, translation)
    }

    /// Factors a general affine matrix into a uniform-scale pose.
    ///
    /// The per-axis scale (column lengths of the linear part) is divided out before the rotation is
    /// extracted, and the uniform scale is the mean of the three axis scales. Non-uniform input is
    /// thus reduced to a single representative scale. The extracted rotation is renormalized if its
    /// squared length drifts from one by more than [RENORMALIZE_EPSILON] (non-orthonormal input).
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        let mut linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let axis_scale = Vector3::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        );
        for (k, s) in axis_scale.iter().enumerate() {
            // A collapsed axis cannot be unscaled; keep it and let the mean report the degeneracy
            if *s > 0.0 {
                linear.column_mut(k).unscale_mut(*s);
            }
        }
        let scale = axis_scale.mean();

        let mut rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(linear));
        let length_squared = rotation.quaternion().norm_squared();
        if (length_squared - 1.0).abs() > RENORMALIZE_EPSILON {
            rotation = UnitQuaternion::new_normalize(rotation.into_inner());
        }

        let translation = matrix.fixed_view::<3, 1>(0, 3).into_owned();
        Self::new(scale, rotation, translation)
    }

    /// Homogeneous 4x4 matrix with columns `rotation * (scale * e_k)` and the translation
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation) * self.rotation.to_homogeneous() * Matrix4::new_scaling(self.scale)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> &UnitQuaternion<f32> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f32> {
        &self.translation
    }

    pub fn with_scale(self, scale: f32) -> Self {
        Self { scale, ..self }
    }

    pub fn with_rotation(self, rotation: UnitQuaternion<f32>) -> Self {
        Self { rotation, ..self }
    }

    pub fn with_translation(self, translation: Vector3<f32>) -> Self {
        Self { translation, ..self }
    }

    /// Applies `other` in the local frame of `self`. Associative but not commutative.
    pub fn compose(&self, other: &RigidPose) -> RigidPose {
        RigidPose {
            scale: self.scale * other.scale,
            rotation: self.rotation * other.rotation,
            translation: self.translation + self.rotation * (other.translation * self.scale),
        }
    }

    /// Exact algebraic inverse. Requires `scale > 0`.
    pub fn inverse(&self) -> RigidPose {
        let inv_scale = 1.0 / self.scale;
        let inv_rotation = self.rotation.inverse();
        RigidPose {
            scale: inv_scale,
            rotation: inv_rotation,
            translation: (inv_rotation * -self.translation) * inv_scale,
        }
    }

    pub fn transform_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.translation + self.transform_vector(point)
    }

    /// Like [RigidPose::transform_point] but ignores the translation (directions, normals)
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * (vector * self.scale)
    }

    /// Reflects about the x axis without introducing a negative scale: the y and z components of
    /// the rotation and the x component of the translation are negated.
    pub fn mirror(&self) -> RigidPose {
        let q = self.rotation.quaternion();
        RigidPose {
            scale: self.scale,
            rotation: UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, -q.j, -q.k)),
            translation: Vector3::new(-self.translation.x, self.translation.y, self.translation.z),
        }
    }

    /// Blends `source` into `self` in place: `alpha == 1` leaves `self` unchanged and
    /// `alpha == 0` yields `source`.
    ///
    /// Scale and translation are interpolated linearly. The rotation takes the shortest path
    /// (normalized linear interpolation after aligning the quaternion hemispheres).
    pub fn blend(&mut self, source: &RigidPose, alpha: f32) {
        self.scale = lerp(source.scale, self.scale, alpha);
        self.rotation = shortest_nlerp(&source.rotation, &self.rotation, alpha);
        self.translation = source.translation.lerp(&self.translation, alpha);
    }
}

fn lerp(from: f32, to: f32, alpha: f32) -> f32 {
    from + (to - from) * alpha
}

fn shortest_nlerp(from: &UnitQuaternion<f32>, to: &UnitQuaternion<f32>, alpha: f32) -> UnitQuaternion<f32> {
    let from = from.quaternion();
    let mut to = *to.quaternion();
    if from.coords.dot(&to.coords) < 0.0 {
        to = -to;
    }
    UnitQuaternion::new_normalize(from.lerp(&to, alpha))
}

impl Default for RigidPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<RigidPose> for RigidPose {
    type Output = RigidPose;

    fn mul(self, rhs: RigidPose) -> RigidPose {
        self.compose(&rhs)
    }
}

impl<'a> Mul<&'a RigidPose> for &'a RigidPose {
    type Output = RigidPose;

    fn mul(self, rhs: &'a RigidPose) -> RigidPose {
        self.compose(rhs)
    }
}

impl Mul<Vector3<f32>> for RigidPose {
    type Output = Vector3<f32>;

    fn mul(self, rhs: Vector3<f32>) -> Vector3<f32> {
        self.transform_point(&rhs)
    }
}

impl Mul<Point3<f32>> for RigidPose {
    type Output = Point3<f32>;

    fn mul(self, rhs: Point3<f32>) -> Point3<f32> {
        Point3::from(self.transform_point(&rhs.coords))
    }
}

impl From<&Matrix4<f32>> for RigidPose {
    fn from(matrix: &Matrix4<f32>) -> Self {
        Self::from_matrix(matrix)
    }
}

impl From<RigidPose> for Matrix4<f32> {
    fn from(pose: RigidPose) -> Self {
        pose.to_matrix()
    }
}

impl AbsDiffEq for RigidPose {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    // q and -q encode the same rotation
    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        let (a, b) = (&self.rotation.quaternion().coords, &other.rotation.quaternion().coords);
        self.scale.abs_diff_eq(&other.scale, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
            && (a.abs_diff_eq(b, epsilon) || a.abs_diff_eq(&-b, epsilon))
    }
}

impl RelativeEq for RigidPose {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        let (a, b) = (&self.rotation.quaternion().coords, &other.rotation.quaternion().coords);
        self.scale.relative_eq(&other.scale, epsilon, max_relative)
            && self.translation.relative_eq(&other.translation, epsilon, max_relative)
            && (a.relative_eq(b, epsilon, max_relative) || a.relative_eq(&-b, epsilon, max_relative))
    }
}

impl fmt::Display for RigidPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let q = self.rotation.quaternion();
        write!(
            f,
            "(trans: [{}, {}, {}], rot: [{}, {}, {}, {}], scale: {})",
            self.translation.x, self.translation.y, self.translation.z, q.w, q.i, q.j, q.k, self.scale
        )
    }
}
