//! Triangles with resolved vertex positions.

use nalgebra::{Point3, Vector3};

use crate::Aabb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Three vertex positions, counter-clockwise seen from the front.
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// assert!((tri.area() - 0.5).abs() < 1e-12);
/// assert_eq!(tri.normal().map(|n| n.z), Some(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First corner.
    pub v0: Point3<f64>,
    /// Second corner.
    pub v1: Point3<f64>,
    /// Third corner.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Triangle with corners `v0`, `v1`, `v2`.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// `(v1 - v0) x (v2 - v0)`: front-facing, with length twice the area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit normal, or `None` when the corners are (nearly) collinear.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len = n.norm();
        (len > f64::EPSILON).then(|| n / len)
    }

    /// Surface area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.normal_unnormalized().norm()
    }

    /// Bounding box of the corners.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.v0, self.v1).union(&Aabb::new(self.v2, self.v2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        )
    }

    #[test]
    fn test_area_of_right_triangle() {
        assert!((right_triangle().area() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_winding_sets_normal_direction() {
        let tri = right_triangle();
        let flipped = Triangle::new(tri.v0, tri.v2, tri.v1);
        assert_eq!(tri.normal(), Some(Vector3::z()));
        assert_eq!(flipped.normal(), Some(-Vector3::z()));
    }

    #[test]
    fn test_degenerate_triangles_have_no_normal() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(Triangle::new(p, p, p).normal().is_none());

        let collinear = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(collinear.normal().is_none());
        assert!(collinear.area().abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_cover_corners() {
        let tri = Triangle::new(
            Point3::new(-1.0, 0.0, 2.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(0.0, -2.0, 1.0),
        );
        let b = tri.bounds();
        assert_eq!(b.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Point3::new(3.0, 1.0, 2.0));
    }
}
