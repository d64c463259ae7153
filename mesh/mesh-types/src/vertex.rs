//! Mesh vertices and their per-vertex data.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour painted onto scan vertices by deviation maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 for every colour built by this crate.
    pub a: u8,
}

impl VertexColor {
    /// Opaque colour from its red, green and blue channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Per-channel linear blend from `self` (`t = 0`) to `other` (`t = 1`).
    ///
    /// `t` is clamped to `[0, 1]`; NaN counts as 0. Channels are truncated,
    /// so a blend only reaches `other` exactly at `t = 1`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::VertexColor;
    ///
    /// let mid = VertexColor::GREEN.lerp(VertexColor::RED, 0.5);
    /// assert_eq!((mid.r, mid.g, mid.b), (127, 127, 0));
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Blending two u8 channels with t in [0, 1] stays in [0, 255]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| f64::from(a).mul_add(1.0 - t, f64::from(b) * t) as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Colour of a vertex lying on the reference surface.
    pub const GREEN: Self = Self::new(0, 255, 0);

    /// Colour of the vertex farthest from the reference surface.
    pub const RED: Self = Self::new(255, 0, 0);
}

/// Optional per-vertex data.
///
/// Normals are rotated along with the mesh by rigid transforms; colours are
/// written by deviation maps.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexAttributes {
    /// Unit normal, if known.
    pub normal: Option<Vector3<f64>>,

    /// Display colour, if painted.
    pub color: Option<VertexColor>,
}

impl VertexAttributes {
    /// No normal and no colour.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            normal: None,
            color: None,
        }
    }
}

/// A mesh vertex: a position plus optional attributes.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let a = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let b: Vertex = [1.0, 2.0, 3.0].into();
/// assert_eq!(a.position, b.position);
/// assert!(a.normal().is_none());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in model space.
    pub position: Point3<f64>,

    /// Normal and colour.
    pub attributes: VertexAttributes,
}

impl Vertex {
    /// Vertex at `position` with no attributes.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes::empty(),
        }
    }

    /// Vertex at `(x, y, z)` with no attributes.
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Vertex at `position` carrying `normal`.
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes {
                normal: Some(normal),
                color: None,
            },
        }
    }

    /// The stored normal, if any.
    #[inline]
    #[must_use]
    pub const fn normal(&self) -> Option<Vector3<f64>> {
        self.attributes.normal
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_constructors_agree() {
        let a = Vertex::from_coords(1.0, -2.0, 3.5);
        let b: Vertex = [1.0, -2.0, 3.5].into();
        assert_eq!(a.position, b.position);
        assert!(a.attributes.normal.is_none());
        assert!(a.attributes.color.is_none());
    }

    #[test]
    fn test_with_normal_stores_normal() {
        let v = Vertex::with_normal(Point3::origin(), Vector3::z());
        assert_eq!(v.normal(), Some(Vector3::z()));
        assert!(v.attributes.color.is_none());
    }

    #[test]
    fn test_lerp_hits_endpoints() {
        assert_eq!(VertexColor::GREEN.lerp(VertexColor::RED, 0.0), VertexColor::GREEN);
        assert_eq!(VertexColor::GREEN.lerp(VertexColor::RED, 1.0), VertexColor::RED);
    }

    #[test]
    fn test_lerp_clamps_out_of_range_t() {
        assert_eq!(VertexColor::GREEN.lerp(VertexColor::RED, 7.0), VertexColor::RED);
        assert_eq!(VertexColor::GREEN.lerp(VertexColor::RED, -1.0), VertexColor::GREEN);
        assert_eq!(
            VertexColor::GREEN.lerp(VertexColor::RED, f64::NAN),
            VertexColor::GREEN
        );
    }

    #[test]
    fn test_lerp_keeps_alpha_opaque() {
        let c = VertexColor::GREEN.lerp(VertexColor::RED, 0.3);
        assert_eq!(c.a, 255);
        assert_eq!(c.b, 0);
    }
}
