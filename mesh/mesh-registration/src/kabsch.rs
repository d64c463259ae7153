//! Kabsch algorithm for computing optimal rigid transformations.
//!
//! Given paired points, finds the rotation (and optionally uniform scale)
//! plus translation that minimizes the sum of squared distances between
//! transformed source points and their targets. Reflections are never
//! returned: when the SVD solution has determinant -1 the axis of least
//! variance is flipped.

use crate::{RegistrationError, RegistrationResult, RigidTransform};
use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, UnitQuaternion, Vector3};

/// Minimum number of correspondences for a unique rotation.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Ratio of second to largest covariance eigenvalue below which a set is collinear.
const COLLINEAR_RATIO: f64 = 1e-12;

/// Computes the optimal rigid transform that aligns source points to target points.
///
/// # Arguments
///
/// * `source_points` - Points to be transformed
/// * `target_points` - Target points to align to, paired by index
/// * `compute_scale` - If true, also computes optimal uniform scale
///
/// # Errors
///
/// - [`RegistrationError::EmptySourceMesh`] / [`RegistrationError::EmptyTargetMesh`]
///   for empty inputs
/// - [`RegistrationError::InvalidParameter`] when the lengths differ
/// - [`RegistrationError::InsufficientPoints`] for fewer than three pairs
/// - [`RegistrationError::DegenerateInput`] when either set is coincident or collinear
/// - [`RegistrationError::SvdFailed`] if the decomposition does not produce factors
///
/// # Example
///
/// ```
/// use mesh_registration::compute_rigid_transform;
/// use nalgebra::Point3;
///
/// let source = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
///
/// // Target is source translated by (1, 2, 3)
/// let target = vec![
///     Point3::new(1.0, 2.0, 3.0),
///     Point3::new(2.0, 2.0, 3.0),
///     Point3::new(1.0, 3.0, 3.0),
/// ];
///
/// let transform = compute_rigid_transform(&source, &target, false).unwrap();
/// let aligned = transform.transform_point(&source[0]);
/// assert!((aligned - target[0]).norm() < 1e-9);
/// ```
pub fn compute_rigid_transform(
    source_points: &[Point3<f64>],
    target_points: &[Point3<f64>],
    compute_scale: bool,
) -> RegistrationResult<RigidTransform> {
    let weights = vec![1.0; source_points.len()];
    compute_weighted_rigid_transform(source_points, target_points, &weights, compute_scale)
}

/// Computes the optimal rigid transform using weighted point correspondences.
///
/// Each correspondence can have a different weight, allowing for robust
/// estimation when some correspondences are more reliable than others.
/// Weights must be non-negative with a positive sum.
///
/// # Errors
///
/// Same as [`compute_rigid_transform`], plus
/// [`RegistrationError::InvalidParameter`] when the weights length differs or
/// the weights are negative, non-finite or sum to zero.
pub fn compute_weighted_rigid_transform(
    source_points: &[Point3<f64>],
    target_points: &[Point3<f64>],
    weights: &[f64],
    compute_scale: bool,
) -> RegistrationResult<RigidTransform> {
    if source_points.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }
    if target_points.is_empty() {
        return Err(RegistrationError::EmptyTargetMesh);
    }
    if source_points.len() != target_points.len() {
        return Err(RegistrationError::InvalidParameter(format!(
            "point sets must have equal length: {} vs {}",
            source_points.len(),
            target_points.len()
        )));
    }
    if weights.len() != source_points.len() {
        return Err(RegistrationError::InvalidParameter(format!(
            "expected {} weights, got {}",
            source_points.len(),
            weights.len()
        )));
    }
    if source_points.len() < MIN_CORRESPONDENCES {
        return Err(RegistrationError::InsufficientPoints {
            required: MIN_CORRESPONDENCES,
            provided: source_points.len(),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(RegistrationError::InvalidParameter(
            "weights must be finite and non-negative".to_string(),
        ));
    }
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Err(RegistrationError::InvalidParameter(
            "total weight must be positive".to_string(),
        ));
    }

    let source_centroid = weighted_centroid(source_points, weights, total_weight);
    let target_centroid = weighted_centroid(target_points, weights, total_weight);

    let source_centered: Vec<Vector3<f64>> = source_points
        .iter()
        .map(|p| p.coords - source_centroid)
        .collect();
    let target_centered: Vec<Vector3<f64>> = target_points
        .iter()
        .map(|p| p.coords - target_centroid)
        .collect();

    check_spread("source", &source_centered, weights)?;
    check_spread("target", &target_centered, weights)?;

    // H = sum(w_i * s_i * t_i^T)
    let mut h = Matrix3::zeros();
    for ((s, t), &w) in source_centered
        .iter()
        .zip(target_centered.iter())
        .zip(weights.iter())
    {
        h += w * s * t.transpose();
    }

    let rotation = optimal_rotation(&h)?;

    let scale = if compute_scale {
        optimal_scale(&source_centered, &target_centered, weights, &rotation)
    } else {
        1.0
    };

    // t = target_centroid - scale * R * source_centroid
    let translation = target_centroid - scale * (rotation * source_centroid);

    Ok(RigidTransform::with_scale(rotation, translation, scale))
}

/// Proper rotation R = V * U^T from the SVD of the cross-covariance.
fn optimal_rotation(h: &Matrix3<f64>) -> RegistrationResult<UnitQuaternion<f64>> {
    let svd = h.svd(true, true);
    let u = svd.u.ok_or(RegistrationError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(RegistrationError::SvdFailed)?;

    let mut rotation_matrix = v_t.transpose() * u.transpose();

    // det(R) = -1 is a reflection; flip the singular vector of least variance
    if rotation_matrix.determinant() < 0.0 {
        let mut v = v_t.transpose();
        for i in 0..3 {
            v[(i, 2)] = -v[(i, 2)];
        }
        rotation_matrix = v * u.transpose();
    }

    if rotation_matrix.iter().any(|x| !x.is_finite()) {
        return Err(RegistrationError::SvdFailed);
    }

    Ok(UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix_unchecked(rotation_matrix),
    ))
}

/// Rejects coincident and collinear point sets, which leave the rotation undetermined.
fn check_spread(
    role: &'static str,
    centered: &[Vector3<f64>],
    weights: &[f64],
) -> RegistrationResult<()> {
    let mut cov = Matrix3::zeros();
    for (c, &w) in centered.iter().zip(weights.iter()) {
        cov += w * c * c.transpose();
    }

    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(cov).eigenvalues.iter().copied().collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    let largest = eigenvalues[0];
    let second = eigenvalues[1];

    if !largest.is_finite() {
        return Err(RegistrationError::DegenerateInput {
            reason: format!("{role} points contain non-finite coordinates"),
        });
    }
    if largest <= f64::MIN_POSITIVE {
        return Err(RegistrationError::DegenerateInput {
            reason: format!("{role} points are coincident"),
        });
    }
    if second / largest < COLLINEAR_RATIO {
        return Err(RegistrationError::DegenerateInput {
            reason: format!("{role} points are collinear"),
        });
    }
    Ok(())
}

fn weighted_centroid(points: &[Point3<f64>], weights: &[f64], total_weight: f64) -> Vector3<f64> {
    let weighted_sum: Vector3<f64> = points
        .iter()
        .zip(weights.iter())
        .map(|(p, &w)| p.coords * w)
        .sum();
    weighted_sum / total_weight
}

/// Least-squares uniform scale given the rotation.
fn optimal_scale(
    source_centered: &[Vector3<f64>],
    target_centered: &[Vector3<f64>],
    weights: &[f64],
    rotation: &UnitQuaternion<f64>,
) -> f64 {
    let mut source_variance = 0.0;
    let mut cross_variance = 0.0;

    for ((s, t), &w) in source_centered
        .iter()
        .zip(target_centered.iter())
        .zip(weights.iter())
    {
        source_variance += w * s.norm_squared();
        cross_variance += w * (rotation * s).dot(t);
    }

    if source_variance > 1e-10 {
        cross_variance / source_variance
    } else {
        1.0
    }
}
