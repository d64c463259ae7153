//! Closest-point primitives.

use nalgebra::Point3;

/// Compute the closest point on a line segment to a query point.
///
/// A zero-length segment returns `a`.
#[must_use]
pub fn closest_point_on_segment(point: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::MIN_POSITIVE {
        return a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Compute the closest point on a triangle to a query point.
///
/// This implements the Voronoi-region algorithm from "Real-Time Collision
/// Detection" by Christer Ericson.
///
/// Degenerate triangles (collinear or coincident vertices) are handled by
/// taking the closest point over the three edges treated as segments, so
/// the result is always finite for finite input.
///
/// # Example
///
/// ```
/// use mesh_nearest::closest_point_on_triangle;
/// use nalgebra::Point3;
///
/// let a = Point3::new(0.0, 0.0, 0.0);
/// let b = Point3::new(1.0, 0.0, 0.0);
/// let c = Point3::new(0.0, 1.0, 0.0);
///
/// // Above the interior: project onto the plane
/// let p = closest_point_on_triangle(Point3::new(0.25, 0.25, 3.0), a, b, c);
/// assert!((p - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
///
/// // Past the corner: snap to the vertex
/// let p = closest_point_on_triangle(Point3::new(-1.0, -1.0, 0.0), a, b, c);
/// assert_eq!(p, a);
/// ```
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    let ab = v1 - v0;
    let ac = v2 - v0;

    // Sine of the corner angle below ~1e-8: every denominator below could vanish
    let cross_sq = ab.cross(&ac).norm_squared();
    if cross_sq <= 1e-16 * ab.norm_squared() * ac.norm_squared() {
        return closest_on_edges(point, v0, v1, v2);
    }

    let ap = point - v0;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);

    // Vertex region outside A
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = point - v1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);

    // Vertex region outside B
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    // Edge region of AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return v0 + ab * v;
    }

    let cp = point - v2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);

    // Vertex region outside C
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    // Edge region of AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return v0 + ac * w;
    }

    // Edge region of BC
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return v1 + (v2 - v1) * w;
    }

    // Face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;

    v0 + ab * v + ac * w
}

fn closest_on_edges(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    [(v0, v1), (v1, v2), (v2, v0)]
        .into_iter()
        .map(|(a, b)| closest_point_on_segment(point, a, b))
        .min_by(|p, q| {
            (point - p)
                .norm_squared()
                .total_cmp(&(point - q).norm_squared())
        })
        .unwrap_or(v0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn test_interior_projection() {
        let [a, b, c] = tri();
        let p = closest_point_on_triangle(Point3::new(0.5, 0.5, -4.0), a, b, c);
        assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_regions() {
        let [a, b, c] = tri();
        assert_eq!(closest_point_on_triangle(Point3::new(-1.0, -1.0, 1.0), a, b, c), a);
        assert_eq!(closest_point_on_triangle(Point3::new(5.0, -1.0, 0.0), a, b, c), b);
        assert_eq!(closest_point_on_triangle(Point3::new(-1.0, 5.0, 0.0), a, b, c), c);
    }

    #[test]
    fn test_edge_regions() {
        let [a, b, c] = tri();
        let p = closest_point_on_triangle(Point3::new(1.0, -3.0, 0.0), a, b, c);
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);

        let p = closest_point_on_triangle(Point3::new(-3.0, 1.0, 0.0), a, b, c);
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        // Hypotenuse
        let p = closest_point_on_triangle(Point3::new(2.0, 2.0, 0.0), a, b, c);
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_collinear_triangle_is_finite() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(3.0, 0.0, 0.0);
        let p = closest_point_on_triangle(Point3::new(2.0, 1.0, 0.0), a, b, c);
        assert_relative_eq!(p, Point3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_triangle_returns_vertex() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let p = closest_point_on_triangle(Point3::new(0.0, 0.0, 0.0), a, a, a);
        assert_eq!(p, a);
    }

    #[test]
    fn test_segment_clamps_and_handles_zero_length() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        assert_eq!(closest_point_on_segment(Point3::new(-1.0, 1.0, 0.0), a, b), a);
        assert_eq!(closest_point_on_segment(Point3::new(9.0, 1.0, 0.0), a, b), b);
        assert_eq!(closest_point_on_segment(Point3::new(9.0, 1.0, 0.0), a, a), a);
    }
}
