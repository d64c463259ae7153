//! Rigid transformation type for registration results.

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{RegistrationError, RegistrationResult};

/// Tolerance used by [`RigidTransform::from_matrix4`].
const RIGID_TOLERANCE: f64 = 1e-6;

/// A rigid transformation consisting of rotation, translation, and optional uniform scale.
///
/// The transformation is applied in the order: scale -> rotate -> translate.
/// The rotation is a unit quaternion, so every transform built through this
/// type has an orthonormal rotation block.
///
/// # Example
///
/// ```
/// use mesh_registration::RigidTransform;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
/// use std::f64::consts::PI;
///
/// // Rotate 90 degrees around Z, then translate
/// let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 2.0);
/// let transform = RigidTransform::new(rotation, Vector3::new(1.0, 2.0, 3.0));
///
/// let moved = transform.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert!((moved - Point3::new(1.0, 3.0, 3.0)).norm() < 1e-12);
///
/// // Matrix form round-trips
/// let back = RigidTransform::from_matrix4(&transform.to_matrix4()).unwrap();
/// assert!(back.rotation_angle_to(&transform) < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidTransform {
    /// Rotation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
    /// Translation vector.
    pub translation: Vector3<f64>,
    /// Uniform scale factor (1.0 for rigid registration).
    pub scale: f64,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Creates a new rigid transform with the given rotation and translation.
    ///
    /// Scale is set to 1.0 (no scaling).
    #[must_use]
    pub const fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
            scale: 1.0,
        }
    }

    /// Creates a new rigid transform with rotation, translation, and scale.
    #[must_use]
    pub const fn with_scale(
        rotation: UnitQuaternion<f64>,
        translation: Vector3<f64>,
        scale: f64,
    ) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Creates an identity transform (no rotation, translation, or scaling).
    #[must_use]
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// Creates a transform with only translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// Creates a transform with only rotation.
    #[must_use]
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// Rotation about `center` (the point `center` stays fixed).
    #[must_use]
    pub fn rotation_about(rotation: UnitQuaternion<f64>, center: &Point3<f64>) -> Self {
        Self::new(rotation, center.coords - rotation * center.coords)
    }

    /// Transforms a 3D point.
    ///
    /// The transformation order is: scale -> rotate -> translate.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let rotated = self.rotation * (point.coords * self.scale);
        Point3::from(rotated + self.translation)
    }

    /// Transforms a 3D vector (direction).
    ///
    /// Vectors are scaled and rotated but not translated.
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * (vector * self.scale)
    }

    /// Composes this transform with another (self * other).
    ///
    /// The result applies `other` first, then `self`. The combined rotation
    /// is renormalized so long ICP chains do not drift off the unit sphere.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let rotation = UnitQuaternion::new_normalize((self.rotation * other.rotation).into_inner());
        let translation = self.translation + self.rotation * (other.translation * self.scale);

        Self {
            rotation,
            translation,
            scale: self.scale * other.scale,
        }
    }

    /// Computes the inverse of this transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_scale = 1.0 / self.scale;
        let inv_rotation = self.rotation.inverse();
        let inv_translation = inv_rotation * (-self.translation * inv_scale);

        Self {
            rotation: inv_rotation,
            translation: inv_translation,
            scale: inv_scale,
        }
    }

    /// Converts to a 4x4 homogeneous transformation matrix.
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        let mut mat = Matrix4::identity();
        let block = self.rotation.to_rotation_matrix().into_inner() * self.scale;
        mat.fixed_view_mut::<3, 3>(0, 0).copy_from(&block);
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        mat
    }

    /// Converts a 4x4 homogeneous matrix into a rigid transform.
    ///
    /// The upper-left 3x3 block must be orthonormal with determinant +1 and
    /// the bottom row must be `[0 0 0 1]`, all within `1e-6`. Scaled or
    /// sheared matrices are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NotRigid`] naming the failed check.
    pub fn from_matrix4(matrix: &Matrix4<f64>) -> RegistrationResult<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(not_rigid("matrix has non-finite entries"));
        }

        let bottom = matrix.fixed_view::<1, 4>(3, 0);
        let expected = [0.0, 0.0, 0.0, 1.0];
        if bottom
            .iter()
            .zip(expected)
            .any(|(v, e)| (v - e).abs() > RIGID_TOLERANCE)
        {
            return Err(not_rigid("bottom row is not [0 0 0 1]"));
        }

        let block: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let gram_error = (block.transpose() * block - Matrix3::identity()).amax();
        if gram_error > RIGID_TOLERANCE {
            return Err(not_rigid(&format!(
                "rotation block is not orthonormal (deviation {gram_error:.3e})"
            )));
        }
        let det = block.determinant();
        if (det - 1.0).abs() > RIGID_TOLERANCE {
            return Err(not_rigid(&format!("rotation block has determinant {det:.6}")));
        }

        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(block));
        let translation = matrix.fixed_view::<3, 1>(0, 3).into_owned();
        Ok(Self::new(rotation, translation))
    }

    /// Angle in radians between this transform's rotation and `other`'s.
    #[must_use]
    pub fn rotation_angle_to(&self, other: &Self) -> f64 {
        self.rotation.angle_to(&other.rotation)
    }

    /// Returns true if this transform is approximately the identity.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.rotation.angle().abs() < epsilon
            && self.translation.norm() < epsilon
            && (self.scale - 1.0).abs() < epsilon
    }
}

fn not_rigid(reason: &str) -> RegistrationError {
    RegistrationError::NotRigid {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sample_transform() -> RigidTransform {
        let axis = nalgebra::Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5));
        RigidTransform::new(
            UnitQuaternion::from_axis_angle(&axis, 0.7),
            Vector3::new(12.0, -4.0, 3.5),
        )
    }

    #[test]
    fn test_identity_transform() {
        let point = Point3::new(1.0, 2.0, 3.0);
        let result = RigidTransform::identity().transform_point(&point);
        assert_relative_eq!(result, point, epsilon = 1e-12);
        assert_eq!(RigidTransform::default(), RigidTransform::identity());
    }

    #[test]
    fn test_rotation_90_degrees_z() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 2.0);
        let transform = RigidTransform::from_rotation(rotation);
        let result = transform.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(result, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        // Vectors ignore translation
        let shifted = RigidTransform::new(rotation, Vector3::new(100.0, 100.0, 100.0));
        let v = shifted.transform_vector(&Vector3::x());
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_applies_right_first() {
        let a = sample_transform();
        let b = RigidTransform::from_translation(Vector3::new(0.0, 2.0, 0.0));
        let p = Point3::new(0.3, -1.0, 2.0);
        let composed = a.compose(&b).transform_point(&p);
        assert_relative_eq!(
            composed,
            a.transform_point(&b.transform_point(&p)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_inverse_round_trip() {
        let transform = RigidTransform::with_scale(sample_transform().rotation, Vector3::new(1.0, 2.0, 3.0), 1.5);
        let point = Point3::new(1.0, 2.0, 3.0);
        let recovered = transform.inverse().transform_point(&transform.transform_point(&point));
        assert_relative_eq!(recovered, point, epsilon = 1e-10);
        assert!(transform.compose(&transform.inverse()).is_identity(1e-10));
    }

    #[test]
    fn test_rotation_about_keeps_center_fixed() {
        let center = Point3::new(3.0, -1.0, 2.0);
        let t = RigidTransform::rotation_about(sample_transform().rotation, &center);
        assert_relative_eq!(t.transform_point(&center), center, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix4_round_trip() {
        let t = sample_transform();
        let m = t.to_matrix4();
        assert_relative_eq!(m[(3, 3)], 1.0);
        assert_relative_eq!(m[(0, 3)], 12.0);

        let back = RigidTransform::from_matrix4(&m).unwrap();
        assert_relative_eq!(back.translation, t.translation, epsilon = 1e-12);
        assert!(back.rotation_angle_to(&t) < 1e-10);
        let p = Point3::new(-2.0, 5.0, 1.0);
        assert_relative_eq!(
            (m * p.to_homogeneous()).xyz(),
            t.transform_point(&p).coords,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_from_matrix4_rejects_shear() {
        let mut m = Matrix4::identity();
        m[(0, 1)] = 0.2;
        let err = RigidTransform::from_matrix4(&m).unwrap_err();
        assert!(matches!(err, RegistrationError::NotRigid { .. }));
        assert!(err.to_string().contains("orthonormal"));
    }

    #[test]
    fn test_from_matrix4_rejects_reflection_scale_and_projection() {
        let mut reflect = Matrix4::identity();
        reflect[(2, 2)] = -1.0;
        assert!(
            RigidTransform::from_matrix4(&reflect)
                .unwrap_err()
                .to_string()
                .contains("determinant")
        );

        let scaled = Matrix4::new_scaling(2.0);
        assert!(RigidTransform::from_matrix4(&scaled).is_err());

        let mut projective = Matrix4::identity();
        projective[(3, 0)] = 0.5;
        assert!(
            RigidTransform::from_matrix4(&projective)
                .unwrap_err()
                .to_string()
                .contains("bottom row")
        );

        let mut nan = Matrix4::identity();
        nan[(1, 3)] = f64::NAN;
        assert!(RigidTransform::from_matrix4(&nan).is_err());
    }

    #[test]
    fn test_is_identity() {
        assert!(RigidTransform::identity().is_identity(1e-10));

        let translation = RigidTransform::from_translation(Vector3::new(0.001, 0.0, 0.0));
        assert!(!translation.is_identity(1e-10));
        assert!(translation.is_identity(0.01));
    }

    #[test]
    fn test_long_compose_chain_stays_unit() {
        let step = sample_transform();
        let mut acc = RigidTransform::identity();
        for _ in 0..10_000 {
            acc = step.compose(&acc);
        }
        assert_relative_eq!(acc.rotation.into_inner().norm(), 1.0, epsilon = 1e-12);
    }
}
