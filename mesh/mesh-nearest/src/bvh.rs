//! Bounding Volume Hierarchy for nearest-triangle queries.
//!
//! Nodes are split at the median triangle along the longest axis of their
//! bounds. Queries descend nearest-box-first and prune any subtree whose box
//! is farther than the best hit found so far.

use mesh_types::{Aabb, Point3, Triangle};
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::closest::closest_point_on_triangle;

/// Subtrees with at least this many triangles are built with `rayon::join`.
const PARALLEL_THRESHOLD: usize = 4096;

/// BVH node containing either leaf triangles or child nodes.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Bounding box of all triangles in this leaf.
        bbox: Aabb,
        /// Triangle indices stored in this leaf.
        triangles: SmallVec<[u32; 8]>,
    },
    /// Internal node with two children.
    Internal {
        /// Bounding box of all triangles in this subtree.
        bbox: Aabb,
        /// Left child node.
        left: Box<Self>,
        /// Right child node.
        right: Box<Self>,
    },
}

impl BvhNode {
    /// Get the bounding box of this node.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Closest point found by a BVH query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit {
    /// Index of the triangle the point lies on.
    pub triangle: u32,
    /// Closest point on that triangle.
    pub point: Point3<f64>,
    /// Squared distance from the query point.
    pub distance_squared: f64,
}

/// Bounding Volume Hierarchy over a triangle soup.
///
/// Triangle indices refer to the slice passed to [`Bvh::build`]; the same
/// slice must be passed to [`Bvh::nearest`].
#[derive(Debug)]
pub struct Bvh {
    /// Root node of the BVH (None when built from no triangles).
    root: Option<BvhNode>,
    /// Total number of triangles in the BVH.
    triangle_count: usize,
}

impl Bvh {
    /// Build a BVH over `triangles`, using `rayon` for large inputs.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_nearest::Bvh;
    /// use mesh_types::{Point3, Triangle};
    ///
    /// let tris = [Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// )];
    ///
    /// let bvh = Bvh::build(&tris, 8);
    /// assert_eq!(bvh.triangle_count(), 1);
    ///
    /// let hit = bvh.nearest(&tris, &Point3::new(0.5, 0.5, 2.0)).unwrap();
    /// assert!((hit.distance_squared - 4.0).abs() < 1e-12);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: face indices come from u32-indexed meshes
    pub fn build(triangles: &[Triangle], max_leaf_size: usize) -> Self {
        if triangles.is_empty() {
            return Self {
                root: None,
                triangle_count: 0,
            };
        }

        let boxes: Vec<(u32, Aabb, Point3<f64>)> = triangles
            .par_iter()
            .enumerate()
            .map(|(i, tri)| {
                let bbox = tri.bounds();
                (i as u32, bbox, bbox.center())
            })
            .collect();

        let indices: Vec<usize> = (0..boxes.len()).collect();
        let root = Self::build_recursive(&boxes, indices, max_leaf_size.max(1));

        Self {
            root: Some(root),
            triangle_count: triangles.len(),
        }
    }

    fn build_recursive(
        boxes: &[(u32, Aabb, Point3<f64>)],
        indices: Vec<usize>,
        max_leaf_size: usize,
    ) -> BvhNode {
        let mut bbox = Aabb::empty();
        for &i in &indices {
            bbox = bbox.union(&boxes[i].1);
        }

        if indices.len() <= max_leaf_size {
            return BvhNode::Leaf {
                bbox,
                triangles: indices.iter().map(|&i| boxes[i].0).collect(),
            };
        }

        // Median split along the longest axis of the centroid bounds
        let centroid_bounds = Aabb::from_points(indices.iter().map(|&i| &boxes[i].2));
        let axis = centroid_bounds.longest_axis();
        let mut sorted = indices;
        sorted.sort_unstable_by(|&a, &b| boxes[a].2[axis].total_cmp(&boxes[b].2[axis]));

        let right_indices = sorted.split_off(sorted.len() / 2);
        let left_indices = sorted;

        let (left, right) = if left_indices.len() + right_indices.len() >= PARALLEL_THRESHOLD {
            rayon::join(
                || Self::build_recursive(boxes, left_indices, max_leaf_size),
                || Self::build_recursive(boxes, right_indices, max_leaf_size),
            )
        } else {
            (
                Self::build_recursive(boxes, left_indices, max_leaf_size),
                Self::build_recursive(boxes, right_indices, max_leaf_size),
            )
        };

        BvhNode::Internal {
            bbox,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Get the number of triangles in the BVH.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Check if the BVH is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get the root node.
    #[must_use]
    pub const fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Find the closest point on any triangle to `point`.
    ///
    /// Returns `None` for an empty BVH. Among equally close triangles the
    /// one visited first wins.
    #[must_use]
    pub fn nearest(&self, triangles: &[Triangle], point: &Point3<f64>) -> Option<BvhHit> {
        let root = self.root.as_ref()?;
        let mut best: Option<BvhHit> = None;
        let mut best_d2 = f64::INFINITY;

        let mut stack: Vec<(&BvhNode, f64)> = Vec::with_capacity(64);
        stack.push((root, root.bbox().distance_squared_to(point)));

        while let Some((node, box_d2)) = stack.pop() {
            if box_d2 > best_d2 {
                continue;
            }
            match node {
                BvhNode::Leaf {
                    triangles: leaf, ..
                } => {
                    for &ti in leaf {
                        let Some(tri) = triangles.get(ti as usize) else {
                            continue;
                        };
                        let p = closest_point_on_triangle(*point, tri.v0, tri.v1, tri.v2);
                        let d2 = (point - p).norm_squared();
                        if d2 < best_d2 {
                            best_d2 = d2;
                            best = Some(BvhHit {
                                triangle: ti,
                                point: p,
                                distance_squared: d2,
                            });
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let dl = left.bbox().distance_squared_to(point);
                    let dr = right.bbox().distance_squared_to(point);
                    // Push the farther child first so the nearer one is popped next
                    if dl <= dr {
                        stack.push((right.as_ref(), dr));
                        stack.push((left.as_ref(), dl));
                    } else {
                        stack.push((left.as_ref(), dl));
                        stack.push((right.as_ref(), dr));
                    }
                }
            }
        }

        best
    }
}
