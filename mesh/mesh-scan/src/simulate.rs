//! Simulated scan generation.

use mesh_registration::{RigidTransform, transform_mesh};
use mesh_subdivide::{SubdivideParams, SubdivisionResult, subdivide_mesh};
use mesh_types::{IndexedMesh, box_mesh};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::ScanResult;
use crate::noise::{apply_systematic_error, perturb_vertices, random_rigid_transform};
use crate::params::{ScanParams, SystematicError};

/// Output of [`simulate_scan`].
#[derive(Debug, Clone)]
pub struct SimulatedScan {
    /// The final scan: subdivided, perturbed and posed.
    pub mesh: IndexedMesh,
    /// Pose applied to the scan (identity when no pose range was given).
    pub pose: RigidTransform,
    /// Subdivision statistics; `subdivision.mesh` is the scan before noise and pose.
    pub subdivision: SubdivisionResult,
}

/// Builds a synthetic scan of a box.
///
/// 1. Box of `extents` centred at the origin.
/// 2. Optional systematic artifact on one vertex.
/// 3. Midpoint subdivision while the face count is at most
///    `target_face_count`, for at most `max_iterations` passes.
/// 4. Uniform per-vertex noise.
/// 5. Optional random pose.
///
/// Noise and pose come from one `StdRng` seeded with `seed`, so equal
/// parameters give identical scans.
///
/// # Errors
///
/// - [`crate::ScanError::InvalidParameter`] for invalid parameters
/// - [`crate::ScanError::Subdivide`] if subdivision fails
///
/// # Example
///
/// ```
/// use mesh_scan::{simulate_scan, ScanParams};
///
/// let scan = simulate_scan(&ScanParams::default().with_target_face_count(500)).unwrap();
/// assert!(scan.mesh.faces.len() > 500);
/// assert!(scan.pose.is_identity(1e-12));
/// ```
pub fn simulate_scan(params: &ScanParams) -> ScanResult<SimulatedScan> {
    params.validate()?;

    let mut base = box_mesh(params.extents);
    if let Some(artifact) = &params.systematic_error {
        apply_systematic_error(&mut base, artifact)?;
    }

    let subdivision = subdivide_mesh(
        &base,
        &SubdivideParams::until_faces(params.target_face_count)
            .with_iterations(params.max_iterations),
    )?;

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut mesh = subdivision.mesh.clone();
    perturb_vertices(&mut mesh, params.noise, &mut rng)?;

    let pose = match &params.pose {
        Some(range) => {
            let pose = random_rigid_transform(&mut rng, range)?;
            mesh = transform_mesh(&mesh, &pose);
            pose
        }
        None => RigidTransform::identity(),
    };

    debug!(
        faces = mesh.faces.len(),
        vertices = mesh.vertices.len(),
        passes = subdivision.iterations,
        noise = params.noise,
        "simulated scan"
    );

    Ok(SimulatedScan {
        mesh,
        pose,
        subdivision,
    })
}

/// Generates a noisy box scan with the standard artifact and no pose.
///
/// The artifact displaces vertex 0 by its normal plus `2 * noise_magnitude`
/// on every axis before subdivision.
///
/// # Errors
///
/// As [`simulate_scan`].
///
/// # Example
///
/// ```
/// use mesh_scan::generate_noisy_mesh;
///
/// let mesh = generate_noisy_mesh([10.0, 20.0, 5.0], 1000, 0.1, 8, 42).unwrap();
/// assert_eq!(mesh.faces.len(), 3072);
/// ```
pub fn generate_noisy_mesh(
    base_extents: [f64; 3],
    target_face_count: usize,
    noise_magnitude: f64,
    max_iterations: u32,
    random_seed: u64,
) -> ScanResult<IndexedMesh> {
    let params = ScanParams::new()
        .with_extents(base_extents)
        .with_target_face_count(target_face_count)
        .with_noise(noise_magnitude)
        .with_max_iterations(max_iterations)
        .with_seed(random_seed)
        .with_systematic_error(SystematicError::for_noise(noise_magnitude));
    simulate_scan(&params).map(|scan| scan.mesh)
}
