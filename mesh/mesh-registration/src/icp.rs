//! Iterative Closest Point (ICP) algorithm for mesh registration.
//!
//! ICP iteratively refines the alignment between a source point set and a
//! target by:
//! 1. Finding the closest target point for every transformed source point
//! 2. Computing the optimal rigid transform for those correspondences
//! 3. Composing it onto the current transform and repeating until the RMS
//!    error stops changing
//!
//! Targets are either triangle surfaces (BVH nearest-surface queries from
//! `mesh-nearest`) or bare point sets (KD-tree queries via `kiddo`).

use std::fmt;

use crate::kabsch::compute_rigid_transform;
use crate::{RegistrationError, RegistrationResult, RigidTransform};
use kiddo::{KdTree, SquaredEuclidean};
use mesh_nearest::NearestSurface;
use mesh_types::IndexedMesh;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for ICP registration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IcpParams {
    /// Maximum number of iterations (default: 100).
    pub max_iterations: u32,
    /// Convergence threshold for RMS error change (default: 1e-6).
    pub convergence_threshold: f64,
    /// Maximum correspondence distance. Points farther than this are rejected.
    /// `None` means no distance filtering (default: `None`).
    pub max_correspondence_distance: Option<f64>,
    /// Subsample ratio for large inputs (0.01-1.0, default: 1.0 = no subsampling).
    pub subsample_ratio: f64,
    /// Whether to compute uniform scale (default: false).
    pub compute_scale: bool,
    /// Initial transform guess (default: identity).
    pub initial_transform: RigidTransform,
    /// Log a warning when the iteration cap is hit (default: true).
    ///
    /// Candidate ranking runs are capped on purpose and turn this off.
    pub warn_on_cap: bool,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            convergence_threshold: 1e-6,
            max_correspondence_distance: None,
            subsample_ratio: 1.0,
            compute_scale: false,
            initial_transform: RigidTransform::identity(),
            warn_on_cap: true,
        }
    }
}

impl IcpParams {
    /// Creates new ICP parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence threshold.
    #[must_use]
    pub const fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Sets the maximum correspondence distance.
    #[must_use]
    pub const fn with_max_correspondence_distance(mut self, distance: f64) -> Self {
        self.max_correspondence_distance = Some(distance);
        self
    }

    /// Sets the subsample ratio (clamped to 0.01-1.0).
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // clamp is not const fn
    pub fn with_subsample_ratio(mut self, ratio: f64) -> Self {
        self.subsample_ratio = ratio.clamp(0.01, 1.0);
        self
    }

    /// Enables or disables scale computation.
    #[must_use]
    pub const fn with_scale(mut self, compute_scale: bool) -> Self {
        self.compute_scale = compute_scale;
        self
    }

    /// Sets the initial transform guess.
    #[must_use]
    pub const fn with_initial_transform(mut self, transform: RigidTransform) -> Self {
        self.initial_transform = transform;
        self
    }

    /// Enables or disables the iteration cap warning.
    #[must_use]
    pub const fn with_cap_warning(mut self, warn_on_cap: bool) -> Self {
        self.warn_on_cap = warn_on_cap;
        self
    }

    /// Checks that the parameters describe a runnable ICP.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidParameter`] for a negative or
    /// non-finite threshold, a non-positive correspondence distance, or a
    /// subsample ratio outside `(0, 1]`.
    pub fn validate(&self) -> RegistrationResult<()> {
        if !(self.convergence_threshold >= 0.0 && self.convergence_threshold.is_finite()) {
            return Err(RegistrationError::InvalidParameter(format!(
                "convergence_threshold must be finite and >= 0, got {}",
                self.convergence_threshold
            )));
        }
        if let Some(d) = self.max_correspondence_distance {
            if !(d > 0.0) {
                return Err(RegistrationError::InvalidParameter(format!(
                    "max_correspondence_distance must be positive, got {d}"
                )));
            }
        }
        if !(self.subsample_ratio > 0.0 && self.subsample_ratio <= 1.0) {
            return Err(RegistrationError::InvalidParameter(format!(
                "subsample_ratio must be in (0, 1], got {}",
                self.subsample_ratio
            )));
        }
        Ok(())
    }
}

/// Result of ICP registration.
///
/// The error metrics describe the returned transform: they come from a
/// final correspondence pass after the last update.
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// The computed rigid transform from source to target.
    pub transform: RigidTransform,
    /// Final RMS error after registration.
    pub rms_error: f64,
    /// Maximum error across all correspondences.
    pub max_error: f64,
    /// Mean squared correspondence distance.
    pub cost: f64,
    /// Number of iterations performed.
    pub iterations: u32,
    /// Whether the RMS change fell below the threshold before the iteration cap.
    pub converged: bool,
    /// Number of valid correspondences in the final pass.
    pub correspondence_count: usize,
}

impl fmt::Display for IcpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ICP {} after {} iterations: rms {:.6}, max {:.6}, {} correspondences",
            if self.converged { "converged" } else { "stopped" },
            self.iterations,
            self.rms_error,
            self.max_error,
            self.correspondence_count
        )
    }
}

/// Aligns a source mesh to a target mesh surface using ICP.
///
/// Source vertices (optionally subsampled) are matched to the closest
/// point anywhere on the target triangles, not just the target vertices.
///
/// # Errors
///
/// - [`RegistrationError::EmptySourceMesh`] if the source has no vertices
/// - [`RegistrationError::EmptyTargetMesh`] if the target has no faces
/// - [`RegistrationError::InvalidMesh`] if a target face index is out of range
/// - any error of [`icp_align_to_surface`]
///
/// # Example
///
/// ```
/// use mesh_registration::{icp_align, transform_mesh, IcpParams, RigidTransform};
/// use mesh_types::box_mesh;
/// use nalgebra::Vector3;
///
/// let target = box_mesh([4.0, 6.0, 2.0]);
/// let source = transform_mesh(
///     &target,
///     &RigidTransform::from_translation(Vector3::new(0.2, -0.1, 0.1)),
/// );
///
/// let result = icp_align(&source, &target, &IcpParams::default()).unwrap();
/// assert!(result.converged);
/// assert!(result.rms_error < 1e-2);
/// ```
pub fn icp_align(
    source: &IndexedMesh,
    target: &IndexedMesh,
    params: &IcpParams,
) -> RegistrationResult<IcpResult> {
    if source.vertices.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }
    let surface = NearestSurface::new(target)?;
    icp_align_to_surface(&source.positions(), &surface, params)
}

/// Aligns source points to a prepared target surface using point-to-surface ICP.
///
/// This is the core loop used by [`icp_align`] and [`crate::register`];
/// build the [`NearestSurface`] once and reuse it across runs.
///
/// # Errors
///
/// - [`RegistrationError::EmptySourceMesh`] for an empty point slice
/// - [`RegistrationError::InvalidParameter`] if [`IcpParams::validate`] fails
/// - [`RegistrationError::NoCorrespondences`] if distance filtering rejects every point
/// - Kabsch errors when the correspondences are degenerate
pub fn icp_align_to_surface(
    source_points: &[Point3<f64>],
    surface: &NearestSurface,
    params: &IcpParams,
) -> RegistrationResult<IcpResult> {
    run_icp(source_points, params, |transformed, max_dist_sq| {
        surface
            .nearest_many(transformed)
            .into_iter()
            .enumerate()
            .filter_map(|(source_idx, hit)| {
                let distance_sq = hit.distance * hit.distance;
                (distance_sq <= max_dist_sq).then_some(Correspondence {
                    source_idx,
                    target_point: hit.point,
                    distance_sq,
                })
            })
            .collect()
    })
}

/// Aligns source points to target points using point-to-point ICP.
///
/// This is a lower-level function that works directly with point arrays
/// rather than meshes; nearest neighbours come from a KD-tree over the
/// target points.
///
/// # Errors
///
/// Returns an error if:
/// - Either point set is empty
/// - The parameters are invalid
/// - No valid correspondences found
/// - The correspondences are degenerate or SVD computation fails
pub fn icp_align_points(
    source_points: &[Point3<f64>],
    target_points: &[Point3<f64>],
    params: &IcpParams,
) -> RegistrationResult<IcpResult> {
    if target_points.is_empty() {
        return Err(RegistrationError::EmptyTargetMesh);
    }

    let mut target_tree: KdTree<f64, 3> = KdTree::new();
    for (i, p) in target_points.iter().enumerate() {
        target_tree.add(&[p.x, p.y, p.z], i as u64);
    }

    run_icp(source_points, params, |transformed, max_dist_sq| {
        transformed
            .par_iter()
            .enumerate()
            .filter_map(|(source_idx, p)| {
                let nearest = target_tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]);
                #[allow(clippy::cast_possible_truncation)]
                let target_idx = nearest.item as usize;
                (nearest.distance <= max_dist_sq).then(|| Correspondence {
                    source_idx,
                    target_point: target_points[target_idx],
                    distance_sq: nearest.distance,
                })
            })
            .collect()
    })
}

/// A point correspondence between source and target.
#[derive(Debug, Clone, Copy)]
struct Correspondence {
    source_idx: usize,
    target_point: Point3<f64>,
    distance_sq: f64,
}

/// Shared ICP loop. `correspond` maps transformed source points to
/// correspondences within the squared distance bound.
fn run_icp<F>(
    source_points: &[Point3<f64>],
    params: &IcpParams,
    correspond: F,
) -> RegistrationResult<IcpResult>
where
    F: Fn(&[Point3<f64>], f64) -> Vec<Correspondence>,
{
    if source_points.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }
    params.validate()?;

    let points = subsample(source_points, params.subsample_ratio);
    let max_dist_sq = params
        .max_correspondence_distance
        .map_or(f64::INFINITY, |d| d * d);

    let mut current_transform = params.initial_transform;
    let mut prev_rms = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..params.max_iterations {
        iterations = iter + 1;

        let transformed = transform_points(&points, &current_transform);
        let correspondences = correspond(&transformed, max_dist_sq);
        if correspondences.is_empty() {
            return Err(RegistrationError::NoCorrespondences);
        }

        let (rms_error, max_error) = compute_error_metrics(&correspondences);
        trace!(
            iteration = iterations,
            rms_error,
            max_error,
            correspondences = correspondences.len(),
            "ICP iteration"
        );

        let (matched_source, matched_target): (Vec<Point3<f64>>, Vec<Point3<f64>>) =
            correspondences
                .iter()
                .map(|c| (transformed[c.source_idx], c.target_point))
                .unzip();

        let incremental =
            compute_rigid_transform(&matched_source, &matched_target, params.compute_scale)?;
        current_transform = incremental.compose(&current_transform);

        if (prev_rms - rms_error).abs() < params.convergence_threshold {
            converged = true;
            break;
        }
        prev_rms = rms_error;
    }

    // Metrics for the transform actually returned
    let transformed = transform_points(&points, &current_transform);
    let correspondences = correspond(&transformed, max_dist_sq);
    if correspondences.is_empty() {
        return Err(RegistrationError::NoCorrespondences);
    }
    let (rms_error, max_error) = compute_error_metrics(&correspondences);

    if !converged && params.max_iterations > 0 && params.warn_on_cap {
        warn!(
            max_iterations = params.max_iterations,
            rms_error, "ICP reached the iteration cap without converging"
        );
    }
    debug!(
        iterations,
        converged,
        rms_error,
        max_error,
        points = points.len(),
        "ICP finished"
    );

    Ok(IcpResult {
        transform: current_transform,
        rms_error,
        max_error,
        cost: rms_error * rms_error,
        iterations,
        converged,
        correspondence_count: correspondences.len(),
    })
}

fn transform_points(points: &[Point3<f64>], transform: &RigidTransform) -> Vec<Point3<f64>> {
    points.iter().map(|p| transform.transform_point(p)).collect()
}

/// Every `ceil(1 / ratio)`-th point.
fn subsample(points: &[Point3<f64>], ratio: f64) -> Vec<Point3<f64>> {
    if ratio >= 1.0 {
        points.to_vec()
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let step = (1.0 / ratio).ceil() as usize;
        points.iter().step_by(step.max(1)).copied().collect()
    }
}

/// Computes RMS and max error from correspondences.
fn compute_error_metrics(correspondences: &[Correspondence]) -> (f64, f64) {
    if correspondences.is_empty() {
        return (f64::INFINITY, f64::INFINITY);
    }

    let sum_sq: f64 = correspondences.iter().map(|c| c.distance_sq).sum();
    let max_sq = correspondences
        .iter()
        .map(|c| c.distance_sq)
        .fold(0.0, f64::max);

    #[allow(clippy::cast_precision_loss)]
    let rms = (sum_sq / correspondences.len() as f64).sqrt();

    (rms, max_sq.sqrt())
}
