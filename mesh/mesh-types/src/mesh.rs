//! Indexed triangle mesh.

use crate::{Aabb, MeshBounds, MeshTopology, Triangle, Vertex};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// This is the mesh type shared by every crate in the workspace. It stores
/// vertices and faces separately, with faces referencing vertices by index.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Vertex>` - Vertex positions and attributes
/// - `faces`: `Vec<[u32; 3]>` - Triangle faces as vertex indices
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside.
/// This means normals point outward by the right-hand rule.
///
/// # Validity
///
/// Nothing stops a caller from pushing a face that references a missing
/// vertex. Accessors in this crate skip such faces instead of panicking;
/// algorithms that consume a mesh call [`IndexedMesh::first_invalid_face`]
/// and report an error.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, Point3, MeshTopology};
///
/// // Create a single triangle
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, MeshTopology};
    ///
    /// let mesh = IndexedMesh::new();
    /// assert!(mesh.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
    ///
    /// let vertices = vec![
    ///     Vertex::from_coords(0.0, 0.0, 0.0),
    ///     Vertex::from_coords(1.0, 0.0, 0.0),
    ///     Vertex::from_coords(0.0, 1.0, 0.0),
    /// ];
    /// let faces = vec![[0, 1, 2]];
    ///
    /// let mesh = IndexedMesh::from_parts(vertices, faces);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from bare positions and faces.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>], faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices: positions.iter().copied().map(Vertex::new).collect(),
            faces,
        }
    }

    /// Copy of all vertex positions, in vertex order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Find the first face that references a vertex outside the vertex array.
    ///
    /// Returns the face index and the offending vertex index.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Vertex};
    ///
    /// let mut mesh = IndexedMesh::new();
    /// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    /// mesh.faces.push([0, 0, 7]);
    /// assert_eq!(mesh.first_invalid_face(), Some((0, 7)));
    /// ```
    #[must_use]
    pub fn first_invalid_face(&self) -> Option<(usize, u32)> {
        let n = self.vertices.len();
        self.faces.iter().enumerate().find_map(|(fi, face)| {
            face.iter()
                .copied()
                .find(|&v| v as usize >= n)
                .map(|v| (fi, v))
        })
    }

    /// Mean of the vertex positions, or `None` for a mesh without vertices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.position.coords);
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Area-weighted vertex normals.
    ///
    /// Each vertex gets the normalised sum of the unnormalised normals of its
    /// incident faces, so a face counts in proportion to its area. At a box
    /// corner this tilts the normal towards the largest adjacent side instead
    /// of the diagonal a plain average of unit face normals would give.
    /// Vertices with no incident faces, or whose neighbourhood has zero area,
    /// get `None`.
    #[must_use]
    pub fn vertex_normals(&self) -> Vec<Option<Vector3<f64>>> {
        let mut sums = vec![Vector3::<f64>::zeros(); self.vertices.len()];
        for (fi, face) in self.faces.iter().enumerate() {
            let Some(tri) = self.triangle(fi) else {
                continue;
            };
            let n = tri.normal_unnormalized();
            for &vi in face {
                sums[vi as usize] += n;
            }
        }
        sums.into_iter()
            .map(|n| {
                let len = n.norm();
                (len > f64::EPSILON).then(|| n / len)
            })
            .collect()
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Sum of signed tetrahedra formed by each face and the origin. Positive
    /// for a closed mesh with outward-facing normals.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let volume: f64 = self
            .triangles()
            .map(|tri| tri.v0.coords.dot(&tri.v1.coords.cross(&tri.v2.coords)))
            .sum();
        volume / 6.0
    }

    /// Compute the total surface area of the mesh.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle {
            v0: self.vertices.get(i0 as usize)?.position,
            v1: self.vertices.get(i1 as usize)?.position,
            v2: self.vertices.get(i2 as usize)?.position,
        })
    }

    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.faces.len()).filter_map(|fi| self.triangle(fi))
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

/// Create an axis-aligned box mesh centred on the origin.
///
/// `extents` are the full edge lengths along X, Y and Z. The box has 8
/// vertices and 12 triangles with outward-facing normals. Vertex 0 is the
/// `(-x, -y, -z)` corner.
///
/// # Example
///
/// ```
/// use mesh_types::{box_mesh, MeshBounds};
///
/// let brick = box_mesh([6.0, 12.0, 2.0]);
/// let size = brick.bounds().size();
/// assert_eq!((size.x, size.y, size.z), (6.0, 12.0, 2.0));
/// assert!((brick.signed_volume() - 144.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn box_mesh(extents: [f64; 3]) -> IndexedMesh {
    let [hx, hy, hz] = extents.map(|e| e * 0.5);
    let mut mesh = unit_cube();
    for vertex in &mut mesh.vertices {
        let p = &mut vertex.position;
        p.x = (2.0 * p.x - 1.0) * hx;
        p.y = (2.0 * p.y - 1.0) * hy;
        p.z = (2.0 * p.z - 1.0) * hz;
    }
    mesh
}

/// Helper function to create a unit cube mesh.
///
/// Creates a cube from (0,0,0) to (1,1,1) with outward-facing normals.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];

    // Two triangles per side, CCW when viewed from outside
    let faces = vec![
        [0, 2, 1], // bottom (-Z)
        [0, 3, 2],
        [4, 5, 6], // top (+Z)
        [4, 6, 7],
        [0, 1, 5], // front (-Y)
        [0, 5, 4],
        [3, 7, 6], // back (+Y)
        [3, 6, 2],
        [0, 4, 7], // left (-X)
        [0, 7, 3],
        [1, 2, 6], // right (+X)
        [1, 6, 5],
    ];

    IndexedMesh::from_parts(corners.into_iter().map(Vertex::from).collect(), faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_is_empty() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());

        let mut mesh2 = IndexedMesh::new();
        mesh2.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert!(mesh2.is_empty()); // no faces

        mesh2.faces.push([0, 0, 0]);
        assert!(!mesh2.is_empty());
    }

    #[test]
    fn test_mesh_bounds() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(10.0, 5.0, 3.0));
        mesh.vertices.push(Vertex::from_coords(-2.0, 8.0, 1.0));

        let bounds = mesh.bounds();
        assert!((bounds.min.x - (-2.0)).abs() < f64::EPSILON);
        assert!((bounds.max.x - 10.0).abs() < f64::EPSILON);
        assert!((bounds.max.y - 8.0).abs() < f64::EPSILON);
        assert!((bounds.max.z - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_mesh_bounds_and_centroid() {
        let mesh = IndexedMesh::new();
        assert!(mesh.bounds().is_empty());
        assert!(mesh.centroid().is_none());
    }

    #[test]
    fn test_unit_cube_volume_and_area() {
        let cube = unit_cube();
        assert!((cube.signed_volume() - 1.0).abs() < 1e-10);
        assert!((cube.surface_area() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_unit_cube_centroid() {
        let c = unit_cube().centroid().unwrap_or_else(Point3::origin);
        assert!((c - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_box_mesh_is_centred() {
        let brick = box_mesh([6.0, 12.0, 2.0]);
        let c = brick.centroid().unwrap_or_else(|| Point3::new(9.0, 9.0, 9.0));
        assert!(c.coords.norm() < 1e-12);
        assert_eq!(brick.vertices[0].position, Point3::new(-3.0, -6.0, -1.0));
        assert!((brick.surface_area() - 2.0 * (72.0 + 12.0 + 24.0)).abs() < 1e-9);
    }

    #[test]
    fn test_box_normals_point_outward() {
        let brick = box_mesh([2.0, 4.0, 6.0]);
        for (v, n) in brick.vertices.iter().zip(brick.vertex_normals()) {
            let n = n.unwrap_or_else(Vector3::zeros);
            assert!((n.norm() - 1.0).abs() < 1e-12);
            // Corner normals point away from the centre
            assert!(n.dot(&v.position.coords) > 0.0);
        }
    }

    #[test]
    fn test_isolated_vertex_has_no_normal() {
        let mut mesh = unit_cube();
        mesh.vertices.push(Vertex::from_coords(5.0, 5.0, 5.0));
        let normals = mesh.vertex_normals();
        assert!(normals[8].is_none());
        assert!(normals[0].is_some());
    }

    #[test]
    fn test_corner_normal_is_area_weighted() {
        // Vertex 0 of a 6 x 12 x 2 box touches two triangles on each of the
        // -X (area 24), -Y (area 12) and -Z (area 72) sides.
        let brick = box_mesh([6.0, 12.0, 2.0]);
        let normal = brick.vertex_normals()[0].unwrap_or_else(Vector3::zeros);
        let expected = Vector3::new(-2.0, -1.0, -6.0).normalize();
        assert!((normal - expected).norm() < 1e-12);

        // A plain average of the three unit side normals would be the diagonal
        let diagonal = Vector3::new(-1.0, -1.0, -1.0).normalize();
        assert!(normal.dot(&diagonal) < 0.9);
    }

    #[test]
    fn test_invalid_face_is_skipped_and_reported() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 42]);
        assert_eq!(mesh.first_invalid_face(), Some((12, 42)));
        assert_eq!(mesh.triangles().count(), 12);
        assert!(mesh.triangle(12).is_none());
        assert!(unit_cube().first_invalid_face().is_none());
    }

    #[test]
    fn test_positions_round_trip() {
        let cube = unit_cube();
        let rebuilt = IndexedMesh::from_positions(&cube.positions(), cube.faces.clone());
        assert_eq!(rebuilt.positions(), cube.positions());
        assert_eq!(rebuilt.faces, cube.faces);
    }
}
