//! Area-weighted surface sampling.

use mesh_types::{IndexedMesh, MeshTopology, Point3};
use rand::Rng;

use crate::{RegistrationError, RegistrationResult};

/// Draws `count` points uniformly distributed over the surface of `mesh`.
///
/// A face is picked with probability proportional to its area, then a point
/// inside it is drawn from uniform barycentric coordinates. With `count == 0`
/// the vertex positions are returned instead, unchanged and in order.
///
/// The generator is injected so that callers control reproducibility.
///
/// # Errors
///
/// - [`RegistrationError::EmptySourceMesh`] for a mesh without vertices
/// - [`RegistrationError::InvalidMesh`] for out-of-range face indices or no faces
/// - [`RegistrationError::DegenerateInput`] if the total surface area is zero
///
/// # Example
///
/// ```
/// use mesh_registration::sample_surface;
/// use mesh_types::unit_cube;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let points = sample_surface(&unit_cube(), 100, &mut rng).unwrap();
/// assert_eq!(points.len(), 100);
/// ```
pub fn sample_surface<R: Rng + ?Sized>(
    mesh: &IndexedMesh,
    count: usize,
    rng: &mut R,
) -> RegistrationResult<Vec<Point3<f64>>> {
    if mesh.vertices.is_empty() {
        return Err(RegistrationError::EmptySourceMesh);
    }
    if let Some((face, index)) = mesh.first_invalid_face() {
        return Err(RegistrationError::InvalidMesh {
            role: "source",
            reason: format!(
                "face {face} references vertex {index} but the mesh has {} vertices",
                mesh.vertices.len()
            ),
        });
    }
    if count == 0 {
        return Ok(mesh.positions());
    }
    if mesh.faces.is_empty() {
        return Err(RegistrationError::InvalidMesh {
            role: "source",
            reason: "mesh has no faces to sample".to_string(),
        });
    }

    let triangles: Vec<_> = mesh.triangles().collect();
    let mut cumulative = Vec::with_capacity(triangles.len());
    let mut total = 0.0;
    for tri in &triangles {
        total += tri.area();
        cumulative.push(total);
    }
    if !(total > 0.0 && total.is_finite()) {
        return Err(RegistrationError::DegenerateInput {
            reason: format!("mesh surface area is {total}"),
        });
    }

    let last = triangles.len() - 1;
    let points = (0..count)
        .map(|_| {
            let pick = rng.gen_range(0.0..total);
            let index = cumulative.partition_point(|&c| c <= pick).min(last);
            let tri = &triangles[index];

            let mut u: f64 = rng.gen_range(0.0..1.0);
            let mut v: f64 = rng.gen_range(0.0..1.0);
            if u + v > 1.0 {
                u = 1.0 - u;
                v = 1.0 - v;
            }
            tri.v0 + (tri.v1 - tri.v0) * u + (tri.v2 - tri.v0) * v
        })
        .collect();

    Ok(points)
}
