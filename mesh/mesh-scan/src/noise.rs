//! Random perturbations: vertex noise, the systematic artifact and random poses.
//!
//! Every function takes its random generator as an argument; nothing here
//! touches a global RNG.

use std::f64::consts::{PI, TAU};

use mesh_registration::RigidTransform;
use mesh_types::IndexedMesh;
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use tracing::warn;

use crate::error::{ScanError, ScanResult};
use crate::params::{PoseRange, SystematicError};

/// Offsets every vertex independently by a uniform draw from `[-noise/2, noise/2]` per axis.
///
/// Each offset is shorter than `noise * sqrt(3) / 2`. Zero noise leaves the
/// mesh unchanged and draws nothing from `rng`.
///
/// # Errors
///
/// Returns [`ScanError::InvalidParameter`] if `noise` is negative or not finite.
///
/// # Example
///
/// ```
/// use mesh_scan::perturb_vertices;
/// use mesh_types::unit_cube;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut mesh = unit_cube();
/// perturb_vertices(&mut mesh, 0.01, &mut StdRng::seed_from_u64(1)).unwrap();
/// assert!(mesh.vertices[0].position.coords.norm() < 0.01);
/// ```
pub fn perturb_vertices<R: Rng + ?Sized>(
    mesh: &mut IndexedMesh,
    noise: f64,
    rng: &mut R,
) -> ScanResult<()> {
    if !(noise >= 0.0 && noise.is_finite()) {
        return Err(ScanError::invalid(format!(
            "noise must be finite and >= 0, got {noise}"
        )));
    }
    if noise == 0.0 {
        return Ok(());
    }

    let half = noise * 0.5;
    for v in &mut mesh.vertices {
        let offset = Vector3::new(
            rng.gen_range(-half..=half),
            rng.gen_range(-half..=half),
            rng.gen_range(-half..=half),
        );
        v.position += offset;
    }
    Ok(())
}

/// Moves the designated vertex by `normal * normal_offset + (bias, bias, bias)`.
///
/// The normal is the area-weighted vertex normal of the current mesh. A
/// vertex without a normal (no incident faces of non-zero area) only
/// receives the bias.
///
/// # Errors
///
/// Returns [`ScanError::InvalidParameter`] if the vertex index is out of range.
pub fn apply_systematic_error(mesh: &mut IndexedMesh, error: &SystematicError) -> ScanResult<()> {
    let count = mesh.vertices.len();
    if error.vertex >= count {
        return Err(ScanError::invalid(format!(
            "systematic error vertex {} out of range for {count} vertices",
            error.vertex
        )));
    }

    let normal = mesh
        .vertex_normals()
        .get(error.vertex)
        .copied()
        .flatten()
        .unwrap_or_else(|| {
            warn!(vertex = error.vertex, "systematic error vertex has no normal");
            Vector3::zeros()
        });

    let offset = normal * error.normal_offset + Vector3::repeat(error.bias);
    mesh.vertices[error.vertex].position += offset;
    Ok(())
}

/// Draws a random rigid pose from `range`.
///
/// With `max_rotation == PI` the rotation is uniform over all orientations
/// (Shoemake's method). Smaller ranges use a uniform random axis and an
/// angle uniform in `[0, max_rotation]`. Translation components are uniform
/// in `[-max_translation, max_translation]`.
///
/// # Errors
///
/// Returns [`ScanError::InvalidParameter`] if the range is invalid.
pub fn random_rigid_transform<R: Rng + ?Sized>(
    rng: &mut R,
    range: &PoseRange,
) -> ScanResult<RigidTransform> {
    range.validate()?;

    let rotation = if range.max_rotation >= PI {
        uniform_rotation(rng)
    } else if range.max_rotation > 0.0 {
        let angle = rng.gen_range(0.0..=range.max_rotation);
        UnitQuaternion::from_axis_angle(&random_axis(rng), angle)
    } else {
        UnitQuaternion::identity()
    };

    let t = range.max_translation;
    let translation = if t > 0.0 {
        Vector3::new(
            rng.gen_range(-t..=t),
            rng.gen_range(-t..=t),
            rng.gen_range(-t..=t),
        )
    } else {
        Vector3::zeros()
    };

    Ok(RigidTransform::new(rotation, translation))
}

fn uniform_rotation<R: Rng + ?Sized>(rng: &mut R) -> UnitQuaternion<f64> {
    let u1: f64 = rng.gen_range(0.0..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let u3: f64 = rng.gen_range(0.0..1.0);

    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let q = Quaternion::new(
        b * (TAU * u3).cos(),
        a * (TAU * u2).sin(),
        a * (TAU * u2).cos(),
        b * (TAU * u3).sin(),
    );
    UnitQuaternion::new_normalize(q)
}

fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> Unit<Vector3<f64>> {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let phi: f64 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Unit::new_normalize(Vector3::new(r * phi.cos(), r * phi.sin(), z))
}
