//! Error types for nearest-surface queries.

use thiserror::Error;

/// Result type for nearest-surface queries.
pub type NearestResult<T> = Result<T, NearestError>;

/// Errors that can occur when building a nearest-surface index.
#[derive(Debug, Error)]
pub enum NearestError {
    /// Target mesh has no faces, so there is no surface to query.
    #[error("target mesh has no faces")]
    EmptyTarget,

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        /// Index of the offending face.
        face: usize,
        /// Out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}
