//! Nearest-surface queries against a triangle mesh.

use mesh_types::{IndexedMesh, MeshTopology, Point3, Triangle, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::bvh::Bvh;
use crate::closest::closest_point_on_triangle;
use crate::error::{NearestError, NearestResult};

/// Maximum triangles per BVH leaf.
const MAX_LEAF_SIZE: usize = 8;

/// Closest surface point for one query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Closest point on the surface.
    pub point: Point3<f64>,
    /// Unsigned distance from the query point to `point`.
    pub distance: f64,
    /// Index of the face `point` lies on.
    pub face: usize,
}

/// A triangle mesh surface prepared for closest-point queries.
///
/// Holds resolved triangles, their unit normals and a [`Bvh`]; the source
/// mesh is not referenced after construction.
///
/// # Example
///
/// ```
/// use mesh_nearest::NearestSurface;
/// use mesh_types::{unit_cube, Point3};
///
/// let surface = NearestSurface::new(&unit_cube())?;
///
/// let hit = surface.nearest(&Point3::new(0.5, 0.5, 0.5));
/// assert!((hit.distance - 0.5).abs() < 1e-12);
///
/// // Negative inside, positive outside
/// assert!(surface.signed_distance(&Point3::new(0.5, 0.5, 0.9)) < 0.0);
/// assert!(surface.signed_distance(&Point3::new(0.5, 0.5, 1.2)) > 0.0);
/// # Ok::<(), mesh_nearest::NearestError>(())
/// ```
#[derive(Debug)]
pub struct NearestSurface {
    triangles: Vec<Triangle>,
    normals: Vec<Option<Vector3<f64>>>,
    bvh: Bvh,
}

impl NearestSurface {
    /// Build a query structure over the faces of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`NearestError::EmptyTarget`] if the mesh has no faces and
    /// [`NearestError::InvalidFaceIndex`] if a face references a missing
    /// vertex.
    pub fn new(mesh: &IndexedMesh) -> NearestResult<Self> {
        let triangles = resolve_triangles(mesh)?;
        let normals = triangles.iter().map(Triangle::normal).collect();
        let bvh = Bvh::build(&triangles, MAX_LEAF_SIZE);

        debug!("Built nearest-surface index over {} faces", triangles.len());

        Ok(Self {
            triangles,
            normals,
            bvh,
        })
    }

    /// Number of faces in the surface.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Resolved triangle for a face index.
    #[must_use]
    pub fn triangle(&self, face: usize) -> Option<&Triangle> {
        self.triangles.get(face)
    }

    /// Find the closest surface point to `point`.
    #[must_use]
    pub fn nearest(&self, point: &Point3<f64>) -> SurfaceHit {
        // The surface has at least one face, so only a NaN query misses
        self.bvh.nearest(&self.triangles, point).map_or_else(
            || SurfaceHit {
                point: *point,
                distance: f64::NAN,
                face: 0,
            },
            |hit| SurfaceHit {
                point: hit.point,
                distance: hit.distance_squared.sqrt(),
                face: hit.triangle as usize,
            },
        )
    }

    /// Closest surface point for every query point, in input order.
    ///
    /// Queries run in parallel.
    #[must_use]
    pub fn nearest_many(&self, points: &[Point3<f64>]) -> Vec<SurfaceHit> {
        points.par_iter().map(|p| self.nearest(p)).collect()
    }

    /// Unsigned distance from `point` to the surface.
    #[must_use]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.nearest(point).distance
    }

    /// Signed distance from `point` to the surface.
    ///
    /// The sign comes from the normal of the closest face: positive on the
    /// side the normal points to (outside for an outward-wound closed mesh).
    /// A closest face with zero area yields a non-negative distance.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        let hit = self.nearest(point);
        match self.normals.get(hit.face).copied().flatten() {
            Some(n) if (point - hit.point).dot(&n) < 0.0 => -hit.distance,
            _ => hit.distance,
        }
    }

    /// Closest point on the surface by testing every face.
    ///
    /// Linear in the face count; used for small meshes and to cross-check
    /// the BVH.
    #[must_use]
    pub fn nearest_brute_force(&self, point: &Point3<f64>) -> SurfaceHit {
        let mut best = SurfaceHit {
            point: *point,
            distance: f64::INFINITY,
            face: 0,
        };
        let mut best_d2 = f64::INFINITY;
        for (face, tri) in self.triangles.iter().enumerate() {
            let p = closest_point_on_triangle(*point, tri.v0, tri.v1, tri.v2);
            let d2 = (point - p).norm_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = SurfaceHit {
                    point: p,
                    distance: d2.sqrt(),
                    face,
                };
            }
        }
        best
    }
}

fn resolve_triangles(mesh: &IndexedMesh) -> NearestResult<Vec<Triangle>> {
    if mesh.faces.is_empty() {
        return Err(NearestError::EmptyTarget);
    }
    if let Some((face, index)) = mesh.first_invalid_face() {
        return Err(NearestError::InvalidFaceIndex {
            face,
            index,
            vertex_count: mesh.vertices.len(),
        });
    }
    Ok(mesh.triangles().collect())
}

/// Closest surface points and distances for a batch of query points.
///
/// Returns `(closest_points, distances)`, both in the order of `points`.
///
/// # Errors
///
/// Returns an error if the mesh has no faces or a face index is out of
/// range.
///
/// # Example
///
/// ```
/// use mesh_nearest::nearest_on_surface;
/// use mesh_types::{unit_cube, Point3};
///
/// let cube = unit_cube();
/// let (closest, distances) = nearest_on_surface(&cube, &[Point3::new(0.5, 0.5, 3.0)])?;
///
/// assert!((closest[0] - Point3::new(0.5, 0.5, 1.0)).norm() < 1e-12);
/// assert!((distances[0] - 2.0).abs() < 1e-12);
/// # Ok::<(), mesh_nearest::NearestError>(())
/// ```
pub fn nearest_on_surface(
    mesh: &IndexedMesh,
    points: &[Point3<f64>],
) -> NearestResult<(Vec<Point3<f64>>, Vec<f64>)> {
    let surface = NearestSurface::new(mesh)?;
    Ok(split_hits(surface.nearest_many(points)))
}

/// Same as [`nearest_on_surface`], testing every face for every point.
///
/// # Errors
///
/// Returns an error if the mesh has no faces or a face index is out of
/// range.
pub fn nearest_on_surface_brute_force(
    mesh: &IndexedMesh,
    points: &[Point3<f64>],
) -> NearestResult<(Vec<Point3<f64>>, Vec<f64>)> {
    let surface = NearestSurface::new(mesh)?;
    let hits = points
        .par_iter()
        .map(|p| surface.nearest_brute_force(p))
        .collect();
    Ok(split_hits(hits))
}

fn split_hits(hits: Vec<SurfaceHit>) -> (Vec<Point3<f64>>, Vec<f64>) {
    hits.into_iter().map(|h| (h.point, h.distance)).unzip()
}
