//! Error types for mesh subdivision operations.

use thiserror::Error;

/// Errors that can occur during subdivision operations.
#[derive(Debug, Error)]
pub enum SubdivideError {
    /// Mesh has no vertices.
    #[error("Mesh has no vertices")]
    EmptyMesh,

    /// Mesh has no faces.
    #[error("Mesh has no faces")]
    NoFaces,

    /// A face references a vertex that does not exist.
    #[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        /// Index of the offending face.
        face: usize,
        /// Out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Mesh would exceed maximum size.
    #[error("Subdivision would exceed maximum mesh size ({current} -> {projected} faces, max {max})")]
    MeshTooLarge {
        /// Current face count.
        current: usize,
        /// Projected face count after subdivision.
        projected: usize,
        /// Maximum allowed face count.
        max: usize,
    },

    /// The subdivided mesh would need vertex indices beyond `u32`.
    #[error("Subdivided mesh would need {vertices} vertices, more than u32 indices can address")]
    VertexIndexOverflow {
        /// Upper bound on the vertex count after one pass.
        vertices: usize,
    },
}

/// Result type for subdivision operations.
pub type SubdivideResult<T> = std::result::Result<T, SubdivideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SubdivideError::EmptyMesh;
        assert_eq!(format!("{err}"), "Mesh has no vertices");

        let err = SubdivideError::InvalidFaceIndex {
            face: 3,
            index: 99,
            vertex_count: 8,
        };
        let display = format!("{err}");
        assert!(display.contains("Face 3"));
        assert!(display.contains("99"));

        let err = SubdivideError::MeshTooLarge {
            current: 1000,
            projected: 4000,
            max: 2000,
        };
        let display = format!("{err}");
        assert!(display.contains("1000"));
        assert!(display.contains("4000"));
        assert!(display.contains("2000"));
    }
}
