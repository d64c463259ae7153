//! Midpoint mesh subdivision.
//!
//! Every pass splits each triangle into four by inserting one vertex per
//! edge midpoint. Two policies decide how many passes run:
//!
//! - **Fixed**: exactly `iterations` passes, failing up front if the result
//!   would exceed `max_faces`.
//! - **Until faces**: keep subdividing while the face count is at most a
//!   target, capped at `iterations` passes. Used to densify a coarse box
//!   into a scan-like mesh.
//!
//! Midpoint subdivision does not move existing vertices, so the shape of
//! the mesh is unchanged; only its sampling density grows.
//!
//! # Examples
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use mesh_subdivide::{subdivide_mesh, SubdivideParams};
//!
//! // Create a simple triangle mesh
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.5, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! // Two passes: 1 * 4^2 = 16 faces
//! let result = subdivide_mesh(&mesh, &SubdivideParams::fixed(2))?;
//!
//! assert_eq!(result.final_faces, 16);
//! assert_eq!(result.final_vertices, 15);
//! # Ok::<(), mesh_subdivide::SubdivideError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod params;
mod result;
mod subdivide;

pub use error::{SubdivideError, SubdivideResult};
pub use params::{StopPolicy, SubdivideParams};
pub use result::SubdivisionResult;
pub use subdivide::{subdivide, subdivide_mesh};
