//! Error types for mesh registration operations.

use mesh_nearest::NearestError;
use thiserror::Error;

/// Errors that can occur during mesh registration.
///
/// Running out of iterations is not an error: ICP and [`crate::register`]
/// report it through their `converged` flag.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Source mesh or point set is empty.
    #[error("source has no points")]
    EmptySourceMesh,

    /// Target mesh has no faces, or the target point set is empty.
    #[error("target has no surface to register against")]
    EmptyTargetMesh,

    /// A mesh failed validation (no faces, or a face index out of range).
    #[error("invalid {role} mesh: {reason}")]
    InvalidMesh {
        /// Which input was rejected ("source", "target" or "mesh").
        role: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Too few points to determine a rigid transform.
    #[error("at least {required} points required, got {provided}")]
    InsufficientPoints {
        /// Number of points required.
        required: usize,
        /// Number of points provided.
        provided: usize,
    },

    /// Points do not span enough dimensions to fix a rotation.
    #[error("degenerate input: {reason}")]
    DegenerateInput {
        /// Why the input was rejected.
        reason: String,
    },

    /// SVD computation failed during transform estimation.
    #[error("SVD computation failed during transform estimation")]
    SvdFailed,

    /// No valid correspondences found between source and target.
    #[error("no valid correspondences found between source and target")]
    NoCorrespondences,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A 4x4 matrix is not a proper rigid transform.
    #[error("matrix is not a rigid transform: {reason}")]
    NotRigid {
        /// Which check failed.
        reason: String,
    },
}

impl From<NearestError> for RegistrationError {
    fn from(err: NearestError) -> Self {
        match err {
            NearestError::EmptyTarget => Self::EmptyTargetMesh,
            err @ NearestError::InvalidFaceIndex { .. } => Self::InvalidMesh {
                role: "target",
                reason: err.to_string(),
            },
        }
    }
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
