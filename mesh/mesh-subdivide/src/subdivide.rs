//! Midpoint subdivision and the pass loop.

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vertex};
use tracing::{debug, warn};

use crate::error::{SubdivideError, SubdivideResult};
use crate::params::{StopPolicy, SubdivideParams};
use crate::result::SubdivisionResult;

/// Split every face of a mesh into four via its edge midpoints.
///
/// Each shared edge gets exactly one new vertex, so the result has four
/// times the faces and `vertices + unique_edges` vertices. The four children
/// keep the winding of their parent face. Original vertices keep their index
/// and attributes; midpoint vertices carry a position only.
///
/// # Errors
///
/// Returns an error if the mesh has no vertices or faces, a face references
/// a missing vertex, or the result would not be addressable with `u32`
/// indices.
///
/// # Examples
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
/// use mesh_subdivide::subdivide;
///
/// let cube = unit_cube();
/// let fine = subdivide(&cube)?;
///
/// assert_eq!(fine.face_count(), 48);
/// // 8 corners + 18 edge midpoints
/// assert_eq!(fine.vertex_count(), 26);
/// # Ok::<(), mesh_subdivide::SubdivideError>(())
/// ```
pub fn subdivide(mesh: &IndexedMesh) -> SubdivideResult<IndexedMesh> {
    validate(mesh)?;
    subdivide_midpoint(mesh)
}

/// Subdivide a mesh using the specified parameters.
///
/// With [`StopPolicy::Fixed`] exactly `params.iterations` passes run (zero
/// passes returns an unchanged copy). With [`StopPolicy::UntilFaces`] passes
/// run while the face count is at most the target and fewer than
/// `params.iterations` passes have run; if the next pass would exceed
/// `params.max_faces` the loop stops early and logs a warning.
///
/// # Errors
///
/// Returns an error if:
/// - The mesh is empty (no vertices or faces)
/// - A face references a vertex that does not exist
/// - In fixed mode, the resulting mesh would exceed `max_faces`
///
/// # Examples
///
/// ```
/// use mesh_types::box_mesh;
/// use mesh_subdivide::{subdivide_mesh, SubdivideParams};
///
/// let brick = box_mesh([6.0, 12.0, 2.0]);
///
/// // 12 -> 48 -> 192 -> 768 -> 3072
/// let result = subdivide_mesh(&brick, &SubdivideParams::until_faces(1000))?;
/// assert_eq!(result.final_faces, 3072);
/// assert_eq!(result.iterations, 4);
/// # Ok::<(), mesh_subdivide::SubdivideError>(())
/// ```
pub fn subdivide_mesh(
    mesh: &IndexedMesh,
    params: &SubdivideParams,
) -> SubdivideResult<SubdivisionResult> {
    validate(mesh)?;

    let original_faces = mesh.faces.len();
    let original_vertices = mesh.vertices.len();

    if params.policy == StopPolicy::Fixed {
        let projected = params.expected_faces(original_faces);
        if projected > params.max_faces {
            return Err(SubdivideError::MeshTooLarge {
                current: original_faces,
                projected,
                max: params.max_faces,
            });
        }
    }

    debug!(
        "Subdividing mesh: {} faces, {} vertices, {:?}, up to {} iterations",
        original_faces, original_vertices, params.policy, params.iterations
    );

    let mut current = mesh.clone();
    let mut passes = 0;
    let mut hit_face_limit = false;

    while passes < params.iterations && wants_another_pass(&current, params.policy) {
        let next_faces = current.faces.len().saturating_mul(4);
        if next_faces > params.max_faces {
            warn!(
                "Stopping subdivision after {} iterations: next pass would produce {} faces (max {})",
                passes, next_faces, params.max_faces
            );
            hit_face_limit = true;
            break;
        }

        current = subdivide_midpoint(&current)?;
        passes += 1;
        debug!(
            "Iteration {}: {} faces, {} vertices",
            passes,
            current.faces.len(),
            current.vertices.len()
        );
    }

    if let StopPolicy::UntilFaces(target) = params.policy {
        if !hit_face_limit && current.faces.len() <= target {
            warn!(
                "Subdivision stopped at {} faces after {} iterations, target was more than {}",
                current.faces.len(),
                passes,
                target
            );
        }
    }

    Ok(SubdivisionResult {
        original_faces,
        final_faces: current.faces.len(),
        original_vertices,
        final_vertices: current.vertices.len(),
        iterations: passes,
        policy: params.policy,
        hit_face_limit,
        mesh: current,
    })
}

fn wants_another_pass(mesh: &IndexedMesh, policy: StopPolicy) -> bool {
    match policy {
        StopPolicy::Fixed => true,
        StopPolicy::UntilFaces(target) => mesh.faces.len() <= target,
    }
}

fn validate(mesh: &IndexedMesh) -> SubdivideResult<()> {
    if mesh.vertices.is_empty() {
        return Err(SubdivideError::EmptyMesh);
    }
    if mesh.faces.is_empty() {
        return Err(SubdivideError::NoFaces);
    }
    if let Some((face, index)) = mesh.first_invalid_face() {
        return Err(SubdivideError::InvalidFaceIndex {
            face,
            index,
            vertex_count: mesh.vertices.len(),
        });
    }
    Ok(())
}

/// Midpoint subdivision - split each triangle into 4 by adding edge midpoints.
///
/// Assumes every face index is in range.
fn subdivide_midpoint(mesh: &IndexedMesh) -> SubdivideResult<IndexedMesh> {
    // At most three new vertices per face
    let bound = mesh
        .vertices
        .len()
        .saturating_add(mesh.faces.len().saturating_mul(3));
    if u32::try_from(bound).is_err() {
        return Err(SubdivideError::VertexIndexOverflow { vertices: bound });
    }

    let mut new_vertices = mesh.vertices.clone();
    let mut new_faces = Vec::with_capacity(mesh.faces.len() * 4);

    // Map from edge (sorted vertex indices) to new midpoint vertex index
    let mut edge_midpoints: HashMap<(u32, u32), u32> =
        HashMap::with_capacity(mesh.faces.len() * 3 / 2 + 1);

    for &[v0, v1, v2] in &mesh.faces {
        let mut midpoint = |a, b| {
            get_or_create_midpoint(a, b, &mesh.vertices, &mut new_vertices, &mut edge_midpoints)
        };
        let m01 = midpoint(v0, v1);
        let m12 = midpoint(v1, v2);
        let m20 = midpoint(v2, v0);

        // Corner triangles
        new_faces.push([v0, m01, m20]);
        new_faces.push([v1, m12, m01]);
        new_faces.push([v2, m20, m12]);
        // Center triangle
        new_faces.push([m01, m12, m20]);
    }

    Ok(IndexedMesh::from_parts(new_vertices, new_faces))
}

/// Get or create a midpoint vertex for an edge.
#[allow(clippy::cast_possible_truncation)]
// Truncation: the caller checked that every new index fits in u32
fn get_or_create_midpoint(
    v0: u32,
    v1: u32,
    original_vertices: &[Vertex],
    new_vertices: &mut Vec<Vertex>,
    edge_midpoints: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    *edge_midpoints
        .entry(normalize_edge(v0, v1))
        .or_insert_with(|| {
            let p0 = original_vertices[v0 as usize].position;
            let p1 = original_vertices[v1 as usize].position;
            let new_idx = new_vertices.len() as u32;
            new_vertices.push(Vertex::new(Point3::from((p0.coords + p1.coords) * 0.5)));
            new_idx
        })
}

/// Normalize edge so smaller vertex index comes first.
const fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 <= v1 { (v0, v1) } else { (v1, v0) }
}
