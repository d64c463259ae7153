//! Simulated 3D scans and scan-to-reference deviation.
//!
//! This crate produces synthetic scan data and measures it against a
//! reference:
//!
//! - **Simulation** - box mesh, single-vertex systematic artifact, midpoint
//!   subdivision to a target face count, bounded vertex noise, random pose
//! - **Deviation** - per-vertex distance to a reference surface, summary
//!   statistics and a two-colour deviation map
//! - **Alignment** - register a reference onto a scan, then measure
//!
//! All randomness is seeded or injected, so every result is reproducible.
//!
//! # Quick Start
//!
//! ```
//! use mesh_scan::{align_and_measure, simulate_scan, PoseRange, ScanParams};
//! use mesh_registration::RegisterParams;
//! use mesh_types::box_mesh;
//!
//! let params = ScanParams::default()
//!     .with_extents([6.0, 12.0, 2.0])
//!     .with_target_face_count(200)
//!     .with_noise(0.01)
//!     .with_pose(PoseRange::small(2.0, 0.2));
//! let scan = simulate_scan(&params).unwrap();
//!
//! let reference = box_mesh([6.0, 12.0, 2.0]);
//! let alignment = align_and_measure(&reference, &scan.mesh, &RegisterParams::fast()).unwrap();
//! println!("{}", alignment.deviation.stats);
//! assert!(alignment.deviation.stats.max < 0.05);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod deviation;
mod error;
mod noise;
mod params;
mod simulate;

pub use deviation::{
    Alignment, Deviation, DeviationStats, align_and_measure, deviation_colors, scan_deviation,
};
pub use error::{ScanError, ScanResult};
pub use noise::{apply_systematic_error, perturb_vertices, random_rigid_transform};
pub use params::{PoseRange, ScanParams, SystematicError};
pub use simulate::{SimulatedScan, generate_noisy_mesh, simulate_scan};
