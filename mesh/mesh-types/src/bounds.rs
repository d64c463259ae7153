//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by its minimum and maximum corners.
///
/// The empty box has `min = +inf` and `max = -inf`, so the union with any
/// other box is that box. BVH nodes use [`Aabb::distance_squared_to`] as a
/// lower bound on the distance to anything they contain.
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
/// assert_eq!(aabb.distance_squared_to(&Point3::new(12.0, 5.0, 5.0)), 4.0);
/// assert_eq!(aabb.distance_squared_to(&Point3::new(5.0, 5.0, 5.0)), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Box spanned by two opposite corners, in any order.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// The box containing nothing.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point; empty for no points.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        points.fold(Self::empty(), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        })
    }

    /// True if the box contains no point.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Edge lengths along X, Y and Z.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Midpoint of the two corners.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the main diagonal, 0 for the empty box.
    #[inline]
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.size().norm() }
    }

    /// Axis (0 = X, 1 = Y, 2 = Z) with the largest extent. Ties pick the lower axis.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Squared distance from `point` to the box, 0 inside it.
    ///
    /// Infinite for the empty box, so empty BVH nodes are never visited.
    #[must_use]
    pub fn distance_squared_to(&self, point: &Point3<f64>) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let below = self.min - *point;
        let above = *point - self.max;
        below.sup(&above).sup(&Vector3::zeros()).norm_squared()
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_spans_input() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 5.0, 3.0),
            Point3::new(-2.0, 8.0, 1.0),
        ];
        let aabb = Aabb::from_points(points.iter());
        assert_eq!(aabb.min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(10.0, 8.0, 3.0));
        assert!(Aabb::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_new_orders_corners() {
        let aabb = Aabb::new(Point3::new(1.0, 0.0, 1.0), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_distance_inside_is_zero() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.distance_squared_to(&Point3::new(0.5, 0.5, 0.5)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_to_face_edge_and_corner_regions() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!((aabb.distance_squared_to(&Point3::new(0.5, 0.5, 3.0)) - 4.0).abs() < 1e-12);
        assert!((aabb.distance_squared_to(&Point3::new(-1.0, 0.5, 2.0)) - 2.0).abs() < 1e-12);
        assert!((aabb.distance_squared_to(&Point3::new(2.0, 2.0, 2.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_box() {
        let empty = Aabb::empty();
        assert!(empty.is_empty());
        assert!(empty.distance_squared_to(&Point3::origin()).is_infinite());
        assert!(empty.diagonal().abs() < f64::EPSILON);
    }

    #[test]
    fn test_longest_axis() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(6.0, 12.0, 2.0));
        assert_eq!(aabb.longest_axis(), 1);
        let cube = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(cube.longest_axis(), 0);
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(a.union(&Aabb::empty()), a);

        let b = Aabb::new(Point3::new(-1.0, 2.0, 0.0), Point3::new(0.0, 3.0, 0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(u.max, Point3::new(1.0, 3.0, 1.0));
        assert_eq!(u.center(), Point3::new(0.0, 1.5, 0.5));
    }
}
