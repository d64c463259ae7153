//! Rigid registration of meshes and point sets.
//!
//! This crate aligns a source shape onto a target mesh:
//! - **Kabsch** - optimal rigid (or similarity) transform from paired points
//! - **ICP (Iterative Closest Point)** - point-to-surface refinement against
//!   the target triangles, or point-to-point against a bare point set
//! - **Principal axes** - coarse orientation frames for initial alignment
//! - **`register`** - the full solver: seeded surface sampling, candidate
//!   initial transforms, coarse ICP ranking, final refinement
//!
//! # Quick Start
//!
//! ```
//! use mesh_registration::{register, transform_mesh, RegisterParams, RigidTransform};
//! use mesh_types::box_mesh;
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! let target = box_mesh([6.0, 12.0, 2.0]);
//! let pose = RigidTransform::new(
//!     UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3),
//!     Vector3::new(2.0, 0.0, 1.0),
//! );
//! let source = transform_mesh(&target, &pose);
//!
//! let result = register(&source, &target, &RegisterParams::default()).unwrap();
//! println!("{result}");
//! let matrix = result.to_matrix4();
//! assert!((matrix[(3, 3)] - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Direct Point-to-Point Alignment
//!
//! With known correspondences no iteration is needed:
//!
//! ```
//! use mesh_registration::compute_rigid_transform;
//! use nalgebra::Point3;
//!
//! let source = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let target = vec![
//!     Point3::new(5.0, 5.0, 0.0),
//!     Point3::new(6.0, 5.0, 0.0),
//!     Point3::new(5.0, 6.0, 0.0),
//! ];
//!
//! let transform = compute_rigid_transform(&source, &target, false).unwrap();
//! assert!((transform.translation.x - 5.0).abs() < 1e-9);
//! ```
//!
//! # Algorithm Selection
//!
//! | Scenario | Recommended Algorithm |
//! |----------|----------------------|
//! | Known correspondences | `compute_rigid_transform` |
//! | Small misalignment, mesh target | `icp_align` |
//! | Unknown pose, mesh target | `register` |
//! | Scanned points, mesh target | `register_points` |
//! | Bare point target | `icp_align_points` |
//! | Scans with outliers | `max_correspondence_distance` |
//! | Different scales | `with_scale(true)` |
//!
//! # Convergence
//!
//! ICP stops when the RMS error changes by less than
//! `convergence_threshold` between iterations. Reaching `max_iterations`
//! first is not an error: the result carries `converged == false` and a
//! `warn` event is emitted.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod icp;
mod kabsch;
mod principal;
mod register;
mod sample;
mod transform;

pub use error::{RegistrationError, RegistrationResult};
pub use icp::{IcpParams, IcpResult, icp_align, icp_align_points, icp_align_to_surface};
pub use kabsch::{MIN_CORRESPONDENCES, compute_rigid_transform, compute_weighted_rigid_transform};
pub use principal::{PrincipalAxes, principal_axes};
pub use register::{RegisterParams, Registration, register, register_points};
pub use sample::sample_surface;
pub use transform::RigidTransform;

use mesh_types::IndexedMesh;

/// Applies a rigid transform to a mesh, returning a new transformed mesh.
///
/// Positions are transformed fully; normals are only rotated.
///
/// # Example
///
/// ```
/// use mesh_registration::{transform_mesh, RigidTransform};
/// use mesh_types::{IndexedMesh, Vertex};
/// use nalgebra::Vector3;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
///
/// let transform = RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0));
/// let transformed = transform_mesh(&mesh, &transform);
///
/// assert!((transformed.vertices[0].position.x - 5.0).abs() < 1e-10);
/// ```
#[must_use]
pub fn transform_mesh(mesh: &IndexedMesh, transform: &RigidTransform) -> IndexedMesh {
    let mut result = mesh.clone();
    for v in &mut result.vertices {
        v.position = transform.transform_point(&v.position);
        if let Some(normal) = v.attributes.normal {
            v.attributes.normal = Some(transform.rotation * normal);
        }
    }
    result
}

/// Computes the alignment error between two meshes with matching vertex order.
///
/// Returns (RMS error, max error) over the distances between each
/// transformed source vertex and the target vertex with the same index.
/// Two empty meshes give `(0.0, 0.0)`.
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidParameter`] if the vertex counts differ.
///
/// # Example
///
/// ```
/// use mesh_registration::{compute_alignment_error, RigidTransform};
/// use mesh_types::{IndexedMesh, Vertex};
/// use nalgebra::Vector3;
///
/// let mut source = IndexedMesh::new();
/// source.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// source.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
///
/// let mut target = IndexedMesh::new();
/// target.vertices.push(Vertex::from_coords(5.0, 0.0, 0.0));
/// target.vertices.push(Vertex::from_coords(6.0, 0.0, 0.0));
///
/// let transform = RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0));
/// let (rms, max) = compute_alignment_error(&source, &target, &transform).unwrap();
///
/// assert!(rms < 1e-10);
/// assert!(max < 1e-10);
/// ```
pub fn compute_alignment_error(
    source: &IndexedMesh,
    target: &IndexedMesh,
    transform: &RigidTransform,
) -> RegistrationResult<(f64, f64)> {
    if source.vertices.len() != target.vertices.len() {
        return Err(RegistrationError::InvalidParameter(format!(
            "meshes must have the same vertex count: {} vs {}",
            source.vertices.len(),
            target.vertices.len()
        )));
    }
    if source.vertices.is_empty() {
        return Ok((0.0, 0.0));
    }

    let mut sum_sq = 0.0;
    let mut max_sq: f64 = 0.0;
    for (sv, tv) in source.vertices.iter().zip(target.vertices.iter()) {
        let dist_sq = (transform.transform_point(&sv.position) - tv.position).norm_squared();
        sum_sq += dist_sq;
        max_sq = max_sq.max(dist_sq);
    }

    #[allow(clippy::cast_precision_loss)]
    let rms = (sum_sq / source.vertices.len() as f64).sqrt();
    Ok((rms, max_sq.sqrt()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{Vertex, box_mesh};
    use nalgebra::{Point3, UnitQuaternion, Vector3};
    use std::f64::consts::PI;

    fn make_test_mesh() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh
    }

    #[test]
    fn test_transform_mesh() {
        let mesh = make_test_mesh();
        let translation = Vector3::new(5.0, 3.0, 1.0);
        let transformed = transform_mesh(&mesh, &RigidTransform::from_translation(translation));

        assert_relative_eq!(
            transformed.vertices[0].position,
            Point3::new(5.0, 3.0, 1.0),
            epsilon = 1e-10
        );
        assert_eq!(transformed.faces, mesh.faces);
    }

    #[test]
    fn test_transform_mesh_with_normals() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices
            .push(Vertex::with_normal(Point3::origin(), Vector3::z()));

        let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI / 2.0);
        let transform = RigidTransform::new(rotation, Vector3::new(3.0, 0.0, 0.0));
        let transformed = transform_mesh(&mesh, &transform);

        // Normal (0,0,1) rotated 90 degrees around X -> (0,-1,0), translation ignored
        let normal = transformed.vertices[0].attributes.normal.unwrap();
        assert_relative_eq!(normal, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_compute_alignment_error_perfect() {
        let source = make_test_mesh();
        let transform = RigidTransform::from_translation(Vector3::new(5.0, 3.0, 0.0));
        let target = transform_mesh(&source, &transform);

        let (rms, max) = compute_alignment_error(&source, &target, &transform).unwrap();

        assert!(rms < 1e-10);
        assert!(max < 1e-10);
    }

    #[test]
    fn test_compute_alignment_error_with_error() {
        let mut source = IndexedMesh::new();
        source.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        source.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));

        let mut target = IndexedMesh::new();
        target.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        target.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));

        let (rms, max) =
            compute_alignment_error(&source, &target, &RigidTransform::identity()).unwrap();

        assert_relative_eq!(rms, (0.5f64).sqrt(), epsilon = 1e-10);
        assert_relative_eq!(max, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_compute_alignment_error_count_mismatch() {
        let source = make_test_mesh();
        let target = IndexedMesh::new();
        let result = compute_alignment_error(&source, &target, &RigidTransform::identity());
        assert!(matches!(result, Err(RegistrationError::InvalidParameter(_))));
    }

    #[test]
    fn test_kabsch_then_icp_workflow() {
        let source = box_mesh([4.0, 6.0, 2.0]);
        let truth = RigidTransform::new(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2),
            Vector3::new(100.0, 50.0, 0.0),
        );
        let target = transform_mesh(&source, &truth);

        // Rough alignment from three known correspondences
        let picks = [0, 3, 6];
        let from: Vec<_> = picks.iter().map(|&i| source.vertices[i].position).collect();
        let to: Vec<_> = picks.iter().map(|&i| target.vertices[i].position).collect();
        let initial = compute_rigid_transform(&from, &to, false).unwrap();

        // Then refine against the surface
        let params = IcpParams::new().with_initial_transform(initial);
        let result = icp_align(&source, &target, &params).unwrap();

        assert!(result.converged);
        assert!(result.rms_error < 1e-6);
        let (rms, _) = compute_alignment_error(&source, &target, &result.transform).unwrap();
        assert!(rms < 1e-6);
    }
}
