//! Core mesh types for scan registration.
//!
//! This crate provides the foundational types shared by the subdivision,
//! nearest-surface and registration crates:
//!
//! - [`Vertex`] - A point in 3D space with optional normal and color
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Layer 0 Crate
//!
//! This crate has no dependencies beyond `nalgebra` (and optionally `serde`).
//! Mesh I/O and rendering live outside the workspace; everything here is
//! plain data that other collaborators can consume.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**. Face winding is
//! **counter-clockwise (CCW) when viewed from outside**, so normals point
//! outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use mesh_types::{box_mesh, MeshTopology};
//!
//! // A 6 x 12 x 2 brick centered on the origin
//! let brick = box_mesh([6.0, 12.0, 2.0]);
//!
//! assert_eq!(brick.vertex_count(), 8);
//! assert_eq!(brick.face_count(), 12);
//! assert!(brick.centroid().is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod mesh;
mod traits;
mod triangle;
mod vertex;

// Re-export core types
pub use bounds::Aabb;
pub use mesh::{IndexedMesh, box_mesh, unit_cube};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::{Vertex, VertexAttributes, VertexColor};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
