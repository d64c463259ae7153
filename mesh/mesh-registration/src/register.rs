//! Full rigid registration: candidate initial alignments, coarse ICP
//! ranking and final refinement.

use std::fmt;

use mesh_nearest::NearestSurface;
use mesh_types::{IndexedMesh, MeshBounds};
use nalgebra::{Matrix4, Point3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::icp::{IcpParams, IcpResult, icp_align_to_surface};
use crate::principal::{PrincipalAxes, principal_axes};
use crate::sample::sample_surface;
use crate::{RegistrationError, RegistrationResult, RigidTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for [`register`] and [`register_points`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegisterParams {
    /// Surface samples drawn from the source mesh (default: 500).
    /// Zero uses the source vertices instead.
    pub samples: usize,
    /// Seed for the sampling generator (default: 0).
    pub seed: u64,
    /// Try the principal-axes alignments as extra candidates (default: true).
    pub principal_axes: bool,
    /// ICP iterations spent ranking each candidate (default: 10).
    pub coarse_iterations: u32,
    /// Relative cost improvement a later candidate needs to replace the
    /// current best (default: 1e-3).
    pub candidate_margin: f64,
    /// First candidate, and the reference for ordering the others (default: identity).
    pub initial_transform: RigidTransform,
    /// Parameters for the final refinement.
    pub icp: IcpParams,
}

impl Default for RegisterParams {
    fn default() -> Self {
        Self {
            samples: 500,
            seed: 0,
            principal_axes: true,
            coarse_iterations: 10,
            candidate_margin: 1e-3,
            initial_transform: RigidTransform::identity(),
            icp: IcpParams::default(),
        }
    }
}

impl RegisterParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fewer samples and shorter ranking, for interactive use.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            samples: 200,
            coarse_iterations: 5,
            icp: IcpParams::default().with_max_iterations(50),
            ..Self::default()
        }
    }

    /// Dense sampling and a tight convergence threshold.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            samples: 2000,
            coarse_iterations: 20,
            icp: IcpParams::default()
                .with_max_iterations(300)
                .with_convergence_threshold(1e-10),
            ..Self::default()
        }
    }

    /// Sets the number of source surface samples.
    #[must_use]
    pub const fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Sets the sampling seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables principal-axes candidates.
    #[must_use]
    pub const fn with_principal_axes(mut self, enabled: bool) -> Self {
        self.principal_axes = enabled;
        self
    }

    /// Sets the ICP iterations per candidate.
    #[must_use]
    pub const fn with_coarse_iterations(mut self, iterations: u32) -> Self {
        self.coarse_iterations = iterations;
        self
    }

    /// Sets the relative margin a candidate must win by.
    #[must_use]
    pub const fn with_candidate_margin(mut self, margin: f64) -> Self {
        self.candidate_margin = margin;
        self
    }

    /// Sets the initial transform guess.
    #[must_use]
    pub const fn with_initial_transform(mut self, transform: RigidTransform) -> Self {
        self.initial_transform = transform;
        self
    }

    /// Sets the refinement parameters.
    #[must_use]
    pub fn with_icp(mut self, icp: IcpParams) -> Self {
        self.icp = icp;
        self
    }

    fn validate(&self) -> RegistrationResult<()> {
        if !(self.candidate_margin >= 0.0 && self.candidate_margin.is_finite()) {
            return Err(RegistrationError::InvalidParameter(format!(
                "candidate_margin must be finite and >= 0, got {}",
                self.candidate_margin
            )));
        }
        self.icp.validate()
    }
}

/// Outcome of [`register`].
#[derive(Debug, Clone)]
pub struct Registration {
    /// Transform mapping the source onto the target.
    pub transform: RigidTransform,
    /// Mean squared distance from the transformed source points to the target surface.
    pub cost: f64,
    /// Root of `cost`.
    pub rms_error: f64,
    /// Largest point-to-surface distance.
    pub max_error: f64,
    /// Iterations of the final refinement.
    pub iterations: u32,
    /// Whether the final refinement converged before its iteration cap.
    pub converged: bool,
    /// Number of initial transforms that were tried.
    pub candidates_evaluated: usize,
}

impl Registration {
    /// The transform as a 4x4 homogeneous matrix.
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        self.transform.to_matrix4()
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "registration cost {:.3e} (rms {:.6}, max {:.6}) from {} candidates, {} refinement iterations{}",
            self.cost,
            self.rms_error,
            self.max_error,
            self.candidates_evaluated,
            self.iterations,
            if self.converged { "" } else { " (not converged)" }
        )
    }
}

/// Registers a source mesh onto a target mesh.
///
/// 1. Sample the source surface (seeded, area weighted).
/// 2. Build candidate initial transforms: `initial_transform`, then the
///    four proper principal-axes alignments ordered by their rotation
///    angle from `initial_transform`.
/// 3. Rank every candidate by the cost after `coarse_iterations` of ICP.
///    A later candidate only wins with a cost lower by `candidate_margin`
///    (relative), so near-ties keep the earlier one.
/// 4. Refine the winner with `params.icp`.
///
/// # Errors
///
/// - [`RegistrationError::EmptySourceMesh`] / [`RegistrationError::EmptyTargetMesh`]
/// - [`RegistrationError::InvalidMesh`] for out-of-range face indices
/// - [`RegistrationError::DegenerateInput`] for zero-area meshes
/// - [`RegistrationError::InvalidParameter`] for invalid parameters
/// - the last candidate's error if every candidate fails
///
/// # Example
///
/// ```
/// use mesh_registration::{register, transform_mesh, RegisterParams, RigidTransform};
/// use mesh_types::box_mesh;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let target = box_mesh([6.0, 12.0, 2.0]);
/// let moved = RigidTransform::new(
///     UnitQuaternion::from_euler_angles(0.1, 0.0, 0.2),
///     Vector3::new(1.0, 0.5, 0.0),
/// );
/// let source = transform_mesh(&target, &moved);
///
/// let result = register(&source, &target, &RegisterParams::default()).unwrap();
/// assert!(result.cost < 1e-8);
/// ```
pub fn register(
    source: &IndexedMesh,
    target: &IndexedMesh,
    params: &RegisterParams,
) -> RegistrationResult<Registration> {
    params.validate()?;
    if source.vertices.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let points = sample_surface(source, params.samples, &mut rng)?;
    let surface = NearestSurface::new(target)?;

    let axes = if params.principal_axes {
        let source_axes = match PrincipalAxes::of_surface(source) {
            Ok(axes) => axes,
            Err(_) => principal_axes(&points)?,
        };
        Some((source_axes, PrincipalAxes::of_surface(target)?))
    } else {
        None
    };

    solve(&points, &surface, target.diagonal(), axes, params)
}

/// Registers a point set onto a target mesh.
///
/// Same as [`register`] with the given points in place of surface samples;
/// `params.samples` and `params.seed` are ignored.
///
/// # Errors
///
/// As [`register`].
pub fn register_points(
    points: &[Point3<f64>],
    target: &IndexedMesh,
    params: &RegisterParams,
) -> RegistrationResult<Registration> {
    params.validate()?;
    if points.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }
    let surface = NearestSurface::new(target)?;

    let axes = if params.principal_axes {
        Some((principal_axes(points)?, PrincipalAxes::of_surface(target)?))
    } else {
        None
    };

    solve(points, &surface, target.diagonal(), axes, params)
}

/// ICP parameters for a capped ranking run from `candidate`.
fn ranking_params(params: &RegisterParams, candidate: RigidTransform) -> IcpParams {
    params
        .icp
        .clone()
        .with_max_iterations(params.coarse_iterations)
        .with_initial_transform(candidate)
        .with_cap_warning(false)
}

fn solve(
    points: &[Point3<f64>],
    surface: &NearestSurface,
    target_diagonal: f64,
    axes: Option<(PrincipalAxes, PrincipalAxes)>,
    params: &RegisterParams,
) -> RegistrationResult<Registration> {
    let initial = params.initial_transform;
    let mut candidates = vec![initial];
    if let Some((source_axes, target_axes)) = axes {
        let mut aligned = source_axes.alignments_to(&target_axes);
        aligned.sort_by(|a, b| {
            a.rotation_angle_to(&initial)
                .total_cmp(&b.rotation_angle_to(&initial))
        });
        candidates.extend(aligned);
    }

    // Absolute floor so exact fits (cost ~ 0) are not displaced by rounding noise
    let cost_floor = (1e-9 * target_diagonal).powi(2);

    let mut best: Option<(usize, IcpResult)> = None;
    let mut last_error = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let coarse = ranking_params(params, *candidate);
        let result = match icp_align_to_surface(points, surface, &coarse) {
            Ok(result) => result,
            Err(err) => {
                warn!(candidate = index, error = %err, "registration candidate failed");
                last_error = Some(err);
                continue;
            }
        };
        debug!(candidate = index, cost = result.cost, "registration candidate ranked");

        let replace = match &best {
            None => true,
            Some((_, current)) => {
                let margin = (current.cost * params.candidate_margin).max(cost_floor);
                result.cost < current.cost - margin
            }
        };
        if replace {
            best = Some((index, result));
        }
    }

    let Some((winner, coarse)) = best else {
        return Err(last_error.unwrap_or(RegistrationError::NoCorrespondences));
    };
    info!(
        candidate = winner,
        candidates = candidates.len(),
        cost = coarse.cost,
        "selected initial alignment"
    );

    let refine = params.icp.clone().with_initial_transform(coarse.transform);
    let refined = icp_align_to_surface(points, surface, &refine)?;

    Ok(Registration {
        transform: refined.transform,
        cost: refined.cost,
        rms_error: refined.rms_error,
        max_error: refined.max_error,
        iterations: refined.iterations,
        converged: refined.converged,
        candidates_evaluated: candidates.len(),
    })
}
