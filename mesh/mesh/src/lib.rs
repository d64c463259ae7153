//! Scan registration toolkit.
//!
//! This umbrella crate re-exports the mesh-* crates and exposes the four
//! entry points of a simulated scan workflow as plain functions over mesh,
//! point and matrix data:
//!
//! - [`subdivide`] - one midpoint subdivision pass
//! - [`generate_noisy_mesh`] - a subdivided, perturbed box "scan"
//! - [`register`] - rigid registration, returning a 4x4 matrix and its cost
//! - [`nearest_on_surface`] - closest surface points and distances
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! // A noisy scan and the box it was made from
//! let scan = mesh::generate_noisy_mesh([6.0, 12.0, 2.0], 500, 0.02, 8, 7).unwrap();
//! let truth = box_mesh([6.0, 12.0, 2.0]);
//!
//! // Move the truth onto the scan
//! let (matrix, cost) = mesh::register(&truth, &scan).unwrap();
//! let transform = RigidTransform::from_matrix4(&matrix).unwrap();
//! let aligned = transform_mesh(&truth, &transform);
//!
//! // Distance from the aligned truth surface to every scan vertex
//! let (_, distances) = mesh::nearest_on_surface(&aligned, &scan.positions()).unwrap();
//! let stats = DeviationStats::from_distances(&distances);
//! println!("cost {cost:.3e}, {stats}");
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core data structures: `IndexedMesh`, `Vertex`, `Triangle`, `Aabb`
//! - [`subdivide`](mod@subdivide) - Midpoint subdivision with fixed or target-face-count policies
//! - [`nearest`] - Closest point on triangles, BVH, batch surface queries
//! - [`registration`] - Kabsch, ICP, principal axes, full registration
//! - [`scan`] - Simulated scans, deviation statistics and colour maps
//!
//! # Feature Flags
//!
//! - `serde` - Serialize/deserialize mesh data, transforms and parameters

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

use mesh_nearest::NearestError;
use mesh_registration::{RegisterParams, RegistrationError};
use mesh_scan::ScanError;
use mesh_subdivide::SubdivideError;
use mesh_types::IndexedMesh;
use nalgebra::{Matrix4, Point3};

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `IndexedMesh`, `Vertex`, `Triangle`, `Aabb`.
pub use mesh_types as types;

/// Midpoint subdivision.
pub use mesh_subdivide as subdivide;

/// Nearest-surface queries.
pub use mesh_nearest as nearest;

/// Kabsch, ICP and full rigid registration.
pub use mesh_registration as registration;

/// Simulated scans and deviation analysis.
pub use mesh_scan as scan;

// =============================================================================
// Entry points
// =============================================================================

/// Splits every face of `mesh` into four at its edge midpoints.
///
/// # Errors
///
/// Returns [`SubdivideError`] for an empty mesh, a mesh without faces, or
/// an out-of-range face index.
pub fn subdivide(mesh: &IndexedMesh) -> Result<IndexedMesh, SubdivideError> {
    mesh_subdivide::subdivide(mesh)
}

/// Builds a noisy box scan.
///
/// The box of `base_extents` gets a one-vertex artifact, is subdivided
/// while its face count is at most `target_face_count` (at most
/// `max_iterations` passes), then every vertex is offset by up to
/// `noise_magnitude / 2` per axis from a generator seeded with `random_seed`.
///
/// # Errors
///
/// Returns [`ScanError`] for invalid parameters or failed subdivision.
pub fn generate_noisy_mesh(
    base_extents: [f64; 3],
    target_face_count: usize,
    noise_magnitude: f64,
    max_iterations: u32,
    random_seed: u64,
) -> Result<IndexedMesh, ScanError> {
    mesh_scan::generate_noisy_mesh(
        base_extents,
        target_face_count,
        noise_magnitude,
        max_iterations,
        random_seed,
    )
}

/// Registers `source` onto `target` with default parameters.
///
/// Returns the 4x4 homogeneous transform mapping source coordinates into
/// target coordinates, and the mean squared distance from the transformed
/// source surface samples to the target surface.
///
/// # Errors
///
/// Returns [`RegistrationError`] for empty or invalid meshes or when no
/// candidate alignment can be evaluated.
pub fn register(
    source: &IndexedMesh,
    target: &IndexedMesh,
) -> Result<(Matrix4<f64>, f64), RegistrationError> {
    let result = mesh_registration::register(source, target, &RegisterParams::default())?;
    Ok((result.to_matrix4(), result.cost))
}

/// Closest point on the surface of `mesh` and its distance, for every query point.
///
/// # Errors
///
/// Returns [`NearestError`] if the mesh has no faces or an invalid face index.
pub fn nearest_on_surface(
    mesh: &IndexedMesh,
    points: &[Point3<f64>],
) -> Result<(Vec<Point3<f64>>, Vec<f64>), NearestError> {
    mesh_nearest::nearest_on_surface(mesh, points)
}

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for scan registration.
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{
        Aabb, IndexedMesh, MeshBounds, MeshTopology, Point3, Triangle, Vector3, Vertex,
        VertexColor, box_mesh, unit_cube,
    };

    // Subdivision
    pub use mesh_subdivide::{SubdivideParams, subdivide_mesh};

    // Queries
    pub use mesh_nearest::NearestSurface;

    // Registration
    pub use mesh_registration::{
        IcpParams, RegisterParams, Registration, RigidTransform, transform_mesh,
    };

    // Scans
    pub use mesh_scan::{DeviationStats, ScanParams, deviation_colors, simulate_scan};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let mesh = IndexedMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_module_reexports() {
        let _ = types::IndexedMesh::new();
        let _ = subdivide::SubdivideParams::default();
        let _ = registration::IcpParams::default();
        let _ = scan::ScanParams::default();
        let p = nearest::closest_point_on_segment(
            Point3::new(0.5, 1.0, 0.0),
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert!((p.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_entry_points_agree_with_crates() {
        let cube = types::unit_cube();
        assert_eq!(subdivide(&cube).unwrap().faces.len(), 48);

        let (points, distances) =
            nearest_on_surface(&cube, &[Point3::new(0.5, 0.5, 0.5)]).unwrap();
        assert_eq!(points.len(), 1);
        assert!((distances[0] - 0.5).abs() < 1e-12);
    }
}
