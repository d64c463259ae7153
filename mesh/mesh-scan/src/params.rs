//! Parameters for scan simulation.

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// A single-vertex artifact applied to the base mesh before subdivision.
///
/// The designated vertex moves by `normal * normal_offset + (bias, bias, bias)`,
/// where `normal` is its area-weighted vertex normal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystematicError {
    /// Index of the displaced vertex. Default: 0.
    pub vertex: usize,
    /// Distance moved along the vertex normal. Default: 1.0.
    pub normal_offset: f64,
    /// Offset added to every coordinate. Default: 0.0.
    pub bias: f64,
}

impl Default for SystematicError {
    fn default() -> Self {
        Self {
            vertex: 0,
            normal_offset: 1.0,
            bias: 0.0,
        }
    }
}

impl SystematicError {
    /// Creates the default artifact (vertex 0, unit normal offset, no bias).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The artifact used by noisy mesh generation: a unit step along the
    /// normal plus a bias of twice the noise magnitude.
    #[must_use]
    pub fn for_noise(noise: f64) -> Self {
        Self {
            bias: 2.0 * noise,
            ..Self::default()
        }
    }

    /// Sets the displaced vertex.
    #[must_use]
    pub const fn with_vertex(mut self, vertex: usize) -> Self {
        self.vertex = vertex;
        self
    }

    /// Sets the offset along the normal.
    #[must_use]
    pub const fn with_normal_offset(mut self, offset: f64) -> Self {
        self.normal_offset = offset;
        self
    }

    /// Sets the per-coordinate bias.
    #[must_use]
    pub const fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }
}

/// Range of random rigid poses applied to a simulated scan.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseRange {
    /// Each translation component is uniform in `[-max_translation, max_translation]`.
    /// Default: 500.0.
    pub max_translation: f64,
    /// Largest rotation angle in radians. `PI` (the default) draws rotations
    /// uniformly over all orientations.
    pub max_rotation: f64,
}

impl Default for PoseRange {
    fn default() -> Self {
        Self {
            max_translation: 500.0,
            max_rotation: PI,
        }
    }
}

impl PoseRange {
    /// Uniform rotations and translations up to 500 per axis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Small perturbations that ICP alone can undo.
    #[must_use]
    pub const fn small(max_translation: f64, max_rotation: f64) -> Self {
        Self {
            max_translation,
            max_rotation,
        }
    }

    /// Sets the translation range.
    #[must_use]
    pub const fn with_max_translation(mut self, max_translation: f64) -> Self {
        self.max_translation = max_translation;
        self
    }

    /// Sets the rotation range.
    #[must_use]
    pub const fn with_max_rotation(mut self, max_rotation: f64) -> Self {
        self.max_rotation = max_rotation;
        self
    }

    /// Checks the ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidParameter`] for a negative or non-finite
    /// translation, or a rotation outside `[0, PI]`.
    pub fn validate(&self) -> ScanResult<()> {
        if !(self.max_translation >= 0.0 && self.max_translation.is_finite()) {
            return Err(ScanError::invalid(format!(
                "max_translation must be finite and >= 0, got {}",
                self.max_translation
            )));
        }
        if !(0.0..=PI).contains(&self.max_rotation) {
            return Err(ScanError::invalid(format!(
                "max_rotation must be in [0, PI], got {}",
                self.max_rotation
            )));
        }
        Ok(())
    }
}

/// Parameters for [`crate::simulate_scan`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanParams {
    /// Box dimensions along x, y, z. Default: `[20.0, 40.0, 10.0]`.
    pub extents: [f64; 3],
    /// Subdivide while the face count is at most this. Default: 5000.
    pub target_face_count: usize,
    /// Per-axis noise span: offsets are uniform in `[-noise/2, noise/2]`. Default: 0.5.
    pub noise: f64,
    /// Cap on subdivision passes. Default: 8.
    pub max_iterations: u32,
    /// Seed for noise and pose. Default: 0.
    pub seed: u64,
    /// Artifact applied before subdivision. Default: none.
    pub systematic_error: Option<SystematicError>,
    /// Random pose applied last. Default: none.
    pub pose: Option<PoseRange>,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            extents: [20.0, 40.0, 10.0],
            target_face_count: 5000,
            noise: 0.5,
            max_iterations: 8,
            seed: 0,
            systematic_error: None,
            pose: None,
        }
    }
}

impl ScanParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean scan: no noise, no artifact, no pose.
    #[must_use]
    pub fn noiseless() -> Self {
        Self {
            noise: 0.0,
            ..Self::default()
        }
    }

    /// Sets the box dimensions.
    #[must_use]
    pub const fn with_extents(mut self, extents: [f64; 3]) -> Self {
        self.extents = extents;
        self
    }

    /// Sets the target face count.
    #[must_use]
    pub const fn with_target_face_count(mut self, faces: usize) -> Self {
        self.target_face_count = faces;
        self
    }

    /// Sets the noise magnitude.
    #[must_use]
    pub const fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Sets the subdivision pass cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the pre-subdivision artifact.
    #[must_use]
    pub const fn with_systematic_error(mut self, error: SystematicError) -> Self {
        self.systematic_error = Some(error);
        self
    }

    /// Applies a random pose drawn from `range`.
    #[must_use]
    pub const fn with_pose(mut self, range: PoseRange) -> Self {
        self.pose = Some(range);
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidParameter`] for non-positive extents, a
    /// negative or non-finite noise, or an invalid pose range.
    pub fn validate(&self) -> ScanResult<()> {
        if self.extents.iter().any(|e| !(*e > 0.0 && e.is_finite())) {
            return Err(ScanError::invalid(format!(
                "extents must be positive and finite, got {:?}",
                self.extents
            )));
        }
        if !(self.noise >= 0.0 && self.noise.is_finite()) {
            return Err(ScanError::invalid(format!(
                "noise must be finite and >= 0, got {}",
                self.noise
            )));
        }
        if let Some(pose) = &self.pose {
            pose.validate()?;
        }
        Ok(())
    }
}
