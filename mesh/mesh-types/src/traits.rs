//! Traits for mesh types.

use crate::{Aabb, Triangle};

/// Read access to a triangle mesh's vertices and faces.
///
/// Nearest-surface queries, surface sampling and principal axes all read
/// their triangles through [`MeshTopology::triangles`].
pub trait MeshTopology {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of triangular faces.
    fn face_count(&self) -> usize;

    /// True if the mesh has no vertices or no faces.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Face `face_index` with resolved positions.
    ///
    /// `None` if the face does not exist or references a missing vertex.
    fn triangle(&self, face_index: usize) -> Option<Triangle>;

    /// All faces with resolved positions, in face order.
    ///
    /// Faces with out-of-range indices are skipped.
    fn triangles(&self) -> impl Iterator<Item = Triangle>;
}

/// Types with an axis-aligned extent.
pub trait MeshBounds {
    /// Bounding box of all vertices; empty for a mesh without vertices.
    fn bounds(&self) -> Aabb;

    /// Length of the bounding box diagonal, used as a scale reference.
    fn diagonal(&self) -> f64 {
        self.bounds().diagonal()
    }
}
