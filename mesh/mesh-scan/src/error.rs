//! Error types for scan simulation and deviation analysis.

use mesh_nearest::NearestError;
use mesh_registration::RegistrationError;
use mesh_subdivide::SubdivideError;
use thiserror::Error;

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while simulating or analysing scans.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid parameter value.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Two meshes that must correspond do not.
    #[error("mesh mismatch: expected {expected} vertices, got {actual}")]
    VertexCountMismatch {
        /// Vertex count required.
        expected: usize,
        /// Vertex count found.
        actual: usize,
    },

    /// Subdividing the base mesh failed.
    #[error("subdivision failed: {0}")]
    Subdivide(#[from] SubdivideError),

    /// Registering the reference onto the scan failed.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Distance query against the reference surface failed.
    #[error("distance query failed: {0}")]
    Nearest(#[from] NearestError),
}

impl ScanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_error() {
        let err = ScanError::invalid("noise must be finite");
        assert_eq!(format!("{err}"), "invalid parameter: noise must be finite");
    }

    #[test]
    fn test_vertex_count_mismatch_error() {
        let err = ScanError::VertexCountMismatch {
            expected: 8,
            actual: 5,
        };
        assert_eq!(format!("{err}"), "mesh mismatch: expected 8 vertices, got 5");
    }

    #[test]
    fn test_wrapped_errors_keep_source() {
        use std::error::Error as _;

        let err: ScanError = SubdivideError::NoFaces.into();
        assert!(matches!(err, ScanError::Subdivide(_)));
        assert!(err.source().is_some());

        let err: ScanError = NearestError::EmptyTarget.into();
        assert!(err.to_string().starts_with("distance query failed"));

        let err: ScanError = RegistrationError::NoCorrespondences.into();
        assert!(matches!(err, ScanError::Registration(_)));
    }
}
