//! Principal axes of point sets and mesh surfaces.
//!
//! The axes give a coarse orientation frame. Mapping the source frame onto
//! the target frame yields initial transforms for ICP that do not depend on
//! the two shapes already being close.

use mesh_types::{IndexedMesh, MeshTopology};
use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, UnitQuaternion, Vector3};

use crate::{RegistrationError, RegistrationResult, RigidTransform};

/// Sign patterns with determinant +1, applied to the axis columns.
const PROPER_FLIPS: [[f64; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
];

/// Centroid and principal directions of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxes {
    /// Mean position.
    pub centroid: Point3<f64>,
    /// Unit axes as columns, by descending variance. Always right-handed.
    pub axes: Matrix3<f64>,
    /// Variance along each axis, descending.
    pub variances: Vector3<f64>,
}

impl PrincipalAxes {
    /// Principal axes of a mesh surface, weighting every point of every face equally.
    ///
    /// Unlike [`principal_axes`] on the vertices, the result does not depend
    /// on how finely the surface is triangulated.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::InvalidMesh`] for out-of-range face indices
    /// - [`RegistrationError::DegenerateInput`] for a mesh with zero surface area
    pub fn of_surface(mesh: &IndexedMesh) -> RegistrationResult<Self> {
        if let Some((face, index)) = mesh.first_invalid_face() {
            return Err(RegistrationError::InvalidMesh {
                role: "mesh",
                reason: format!("face {face} references missing vertex {index}"),
            });
        }
        let Some(first) = mesh.triangles().next() else {
            return Err(RegistrationError::DegenerateInput {
                reason: "mesh has no faces".to_string(),
            });
        };

        // Moments relative to one surface point keep the sums well conditioned
        let origin = first.v0.coords;
        let mut total_area = 0.0;
        let mut first_moment = Vector3::zeros();
        let mut second_moment = Matrix3::zeros();

        for tri in mesh.triangles() {
            let area = tri.area();
            let a = tri.v0.coords - origin;
            let b = tri.v1.coords - origin;
            let c = tri.v2.coords - origin;
            let s = a + b + c;

            total_area += area;
            first_moment += s * (area / 3.0);
            second_moment += (a * a.transpose()
                + b * b.transpose()
                + c * c.transpose()
                + s * s.transpose())
                * (area / 12.0);
        }

        if !(total_area > 0.0 && total_area.is_finite()) {
            return Err(RegistrationError::DegenerateInput {
                reason: format!("mesh surface area is {total_area}"),
            });
        }

        let mean = first_moment / total_area;
        let covariance = second_moment / total_area - mean * mean.transpose();
        Ok(Self::from_covariance(Point3::from(origin + mean), covariance))
    }

    fn from_covariance(centroid: Point3<f64>, covariance: Matrix3<f64>) -> Self {
        let eigen = SymmetricEigen::new(covariance);

        let mut order = [0usize, 1, 2];
        order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

        let mut axes = Matrix3::zeros();
        let mut variances = Vector3::zeros();
        for (col, &i) in order.iter().enumerate() {
            axes.set_column(col, &eigen.eigenvectors.column(i));
            variances[col] = eigen.eigenvalues[i].max(0.0);
        }
        if axes.determinant() < 0.0 {
            let flipped = -axes.column(2).clone_owned();
            axes.set_column(2, &flipped);
        }

        Self {
            centroid,
            axes,
            variances,
        }
    }

    /// The four proper rigid transforms that map this frame onto `target`.
    ///
    /// Each maps the centroid onto the target centroid and the axes onto the
    /// target axes up to a sign pattern with determinant +1. Order follows
    /// the sign patterns: identity first, then flips of axes (0,1), (0,2), (1,2).
    #[must_use]
    pub fn alignments_to(&self, target: &Self) -> Vec<RigidTransform> {
        PROPER_FLIPS
            .iter()
            .map(|flip| {
                let f = Matrix3::from_diagonal(&Vector3::from(*flip));
                let r = target.axes * f * self.axes.transpose();
                let rotation =
                    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
                let translation = target.centroid.coords - rotation * self.centroid.coords;
                RigidTransform::new(rotation, translation)
            })
            .collect()
    }
}

/// Computes the principal axes of a point set.
///
/// # Errors
///
/// Returns [`RegistrationError::InsufficientPoints`] for an empty slice.
///
/// # Example
///
/// ```
/// use mesh_registration::principal_axes;
/// use nalgebra::Point3;
///
/// let points: Vec<_> = (0..10)
///     .map(|i| Point3::new(f64::from(i), 0.1 * f64::from(i % 2), 0.0))
///     .collect();
/// let axes = principal_axes(&points).unwrap();
/// assert!(axes.axes.column(0).x.abs() > 0.99);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn principal_axes(points: &[Point3<f64>]) -> RegistrationResult<PrincipalAxes> {
    if points.is_empty() {
        return Err(RegistrationError::InsufficientPoints {
            required: 1,
            provided: 0,
        });
    }
    let n = points.len() as f64;
    let mean: Vector3<f64> = points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p.coords - mean;
        covariance += d * d.transpose();
    }
    covariance /= n;

    Ok(PrincipalAxes::from_covariance(Point3::from(mean), covariance))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_subdivide::subdivide;
    use mesh_types::box_mesh;

    #[test]
    fn test_axes_are_right_handed_and_sorted() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.2, 0.1),
            Point3::new(0.1, 2.0, 0.0),
            Point3::new(0.3, 0.1, 0.7),
            Point3::new(-4.0, -1.0, 0.2),
            Point3::new(1.0, -2.5, -0.6),
        ];
        let axes = principal_axes(&points).unwrap();
        assert_relative_eq!(axes.axes.determinant(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(axes.axes.transpose() * axes.axes, Matrix3::identity(), epsilon = 1e-9);
        assert!(axes.variances[0] >= axes.variances[1]);
        assert!(axes.variances[1] >= axes.variances[2]);
    }

    #[test]
    fn test_box_surface_axes_follow_extents() {
        let axes = PrincipalAxes::of_surface(&box_mesh([6.0, 12.0, 2.0])).unwrap();
        assert_relative_eq!(axes.centroid, Point3::origin(), epsilon = 1e-12);
        assert!(axes.axes.column(0).y.abs() > 1.0 - 1e-9);
        assert!(axes.axes.column(1).x.abs() > 1.0 - 1e-9);
        assert!(axes.axes.column(2).z.abs() > 1.0 - 1e-9);
        assert!(axes.variances[0] > 1.5 * axes.variances[1]);
        assert!(axes.variances[1] > 1.5 * axes.variances[2]);
    }

    #[test]
    fn test_surface_axes_ignore_tessellation() {
        let mesh = box_mesh([3.0, 5.0, 1.0]);
        let fine = subdivide(&subdivide(&mesh).unwrap()).unwrap();
        let coarse_axes = PrincipalAxes::of_surface(&mesh).unwrap();
        let fine_axes = PrincipalAxes::of_surface(&fine).unwrap();
        assert_relative_eq!(coarse_axes.variances, fine_axes.variances, epsilon = 1e-9);
        assert_relative_eq!(coarse_axes.centroid, fine_axes.centroid, epsilon = 1e-9);
    }

    #[test]
    fn test_cube_variances_coincide() {
        let axes = PrincipalAxes::of_surface(&box_mesh([2.0, 2.0, 2.0])).unwrap();
        assert_relative_eq!(axes.variances[0], axes.variances[2], epsilon = 1e-9);
        assert_relative_eq!(axes.axes.determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_alignments_contain_true_pose() {
        let mesh = box_mesh([6.0, 12.0, 2.0]);
        let truth = RigidTransform::new(
            UnitQuaternion::from_euler_angles(0.4, -0.3, 1.1),
            Vector3::new(3.0, -7.0, 20.0),
        );
        let mut moved = mesh.clone();
        for v in &mut moved.vertices {
            v.position = truth.transform_point(&v.position);
        }

        let source = PrincipalAxes::of_surface(&mesh).unwrap();
        let target = PrincipalAxes::of_surface(&moved).unwrap();
        let candidates = source.alignments_to(&target);
        assert_eq!(candidates.len(), 4);

        let best = candidates
            .iter()
            .map(|c| c.rotation_angle_to(&truth))
            .fold(f64::INFINITY, f64::min);
        assert!(best < 1e-6, "closest candidate is {best} rad away");
        for c in &candidates {
            assert_relative_eq!(
                c.transform_point(&source.centroid),
                target.centroid,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_empty_points() {
        assert!(matches!(
            principal_axes(&[]),
            Err(RegistrationError::InsufficientPoints { required: 1, provided: 0 })
        ));
    }
}
