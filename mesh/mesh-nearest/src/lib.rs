//! Closest-point queries against triangle mesh surfaces.
//!
//! This crate answers "where is the nearest point of this surface?" for
//! batches of query points, the inner loop of point-to-surface ICP and of
//! scan deviation analysis.
//!
//! - [`closest_point_on_triangle`] - Ericson's Voronoi-region method, safe
//!   on degenerate triangles
//! - [`Bvh`] - median-split bounding volume hierarchy with pruned nearest
//!   search
//! - [`NearestSurface`] - validated, reusable query structure for a mesh
//! - [`nearest_on_surface`] - one-shot batch query
//!
//! # Example
//!
//! ```
//! use mesh_nearest::nearest_on_surface;
//! use mesh_types::{box_mesh, Point3};
//!
//! let brick = box_mesh([6.0, 12.0, 2.0]);
//! let queries = [Point3::new(0.0, 0.0, 4.0), Point3::new(10.0, 0.0, 0.0)];
//!
//! let (_, distances) = nearest_on_surface(&brick, &queries)?;
//! assert!((distances[0] - 3.0).abs() < 1e-12);
//! assert!((distances[1] - 7.0).abs() < 1e-12);
//! # Ok::<(), mesh_nearest::NearestError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod bvh;
mod closest;
mod error;
mod query;

pub use bvh::{Bvh, BvhHit};
pub use closest::{closest_point_on_segment, closest_point_on_triangle};
pub use error::{NearestError, NearestResult};
pub use query::{NearestSurface, SurfaceHit, nearest_on_surface, nearest_on_surface_brute_force};
