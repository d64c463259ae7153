//! Subdivision parameters.

/// When to stop subdividing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Run exactly `iterations` passes.
    Fixed,

    /// Keep subdividing while the face count is at most the target, for at
    /// most `iterations` passes.
    ///
    /// The loop may overshoot: it stops on the first pass that pushes the
    /// face count above the target.
    UntilFaces(usize),
}

/// Parameters for mesh subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideParams {
    /// Stop policy.
    pub policy: StopPolicy,

    /// Number of passes for [`StopPolicy::Fixed`], or the pass cap for
    /// [`StopPolicy::UntilFaces`].
    pub iterations: u32,

    /// Maximum faces allowed in result (prevents memory issues).
    pub max_faces: usize,
}

impl Default for SubdivideParams {
    fn default() -> Self {
        Self {
            policy: StopPolicy::Fixed,
            iterations: 1,
            max_faces: 10_000_000, // 10M faces max
        }
    }
}

impl SubdivideParams {
    /// Pass cap used by [`SubdivideParams::until_faces`].
    pub const DEFAULT_MAX_PASSES: u32 = 8;

    /// Create new parameters with default values (one fixed pass).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exactly `iterations` midpoint passes.
    #[must_use]
    pub fn fixed(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Subdivide until the face count exceeds `target_faces`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_subdivide::{SubdivideParams, StopPolicy};
    ///
    /// let params = SubdivideParams::until_faces(1000).with_iterations(6);
    /// assert_eq!(params.policy, StopPolicy::UntilFaces(1000));
    /// assert_eq!(params.iterations, 6);
    /// ```
    #[must_use]
    pub fn until_faces(target_faces: usize) -> Self {
        Self {
            policy: StopPolicy::UntilFaces(target_faces),
            iterations: Self::DEFAULT_MAX_PASSES,
            ..Self::default()
        }
    }

    /// Set stop policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set number of iterations (or the pass cap in target mode).
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set maximum faces allowed.
    #[must_use]
    pub const fn with_max_faces(mut self, max_faces: usize) -> Self {
        self.max_faces = max_faces;
        self
    }

    /// Calculate face count after `iterations` passes.
    ///
    /// Each pass multiplies the face count by 4. Saturates at `usize::MAX`.
    #[must_use]
    pub const fn expected_faces(&self, current_faces: usize) -> usize {
        let mut faces = current_faces;
        let mut i = 0;
        while i < self.iterations {
            faces = faces.saturating_mul(4);
            i += 1;
        }
        faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = SubdivideParams::default();
        assert_eq!(params.policy, StopPolicy::Fixed);
        assert_eq!(params.iterations, 1);
        assert_eq!(params.max_faces, 10_000_000);
    }

    #[test]
    fn test_builder() {
        let params = SubdivideParams::new()
            .with_policy(StopPolicy::UntilFaces(500))
            .with_iterations(2)
            .with_max_faces(1_000_000);

        assert_eq!(params.policy, StopPolicy::UntilFaces(500));
        assert_eq!(params.iterations, 2);
        assert_eq!(params.max_faces, 1_000_000);
    }

    #[test]
    fn test_until_faces_default_cap() {
        let params = SubdivideParams::until_faces(100);
        assert_eq!(params.iterations, SubdivideParams::DEFAULT_MAX_PASSES);
    }

    #[test]
    fn test_expected_faces() {
        assert_eq!(SubdivideParams::fixed(0).expected_faces(12), 12);
        assert_eq!(SubdivideParams::fixed(1).expected_faces(100), 400);
        assert_eq!(SubdivideParams::fixed(2).expected_faces(100), 1600);
        assert_eq!(SubdivideParams::fixed(3).expected_faces(12), 768); // 12 * 4^3
    }

    #[test]
    fn test_expected_faces_saturates() {
        assert_eq!(SubdivideParams::fixed(64).expected_faces(12), usize::MAX);
    }
}
