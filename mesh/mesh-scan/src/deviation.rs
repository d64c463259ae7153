//! Deviation between a scan and a reference surface.
//!
//! Distances are measured from every scan vertex to the closest point on
//! the reference triangles, summarised as [`DeviationStats`] and mapped to
//! per-vertex colours for inspection.

use std::fmt;

use mesh_nearest::NearestSurface;
use mesh_registration::{RegisterParams, Registration, register, transform_mesh};
use mesh_types::{IndexedMesh, Point3, VertexColor};
use tracing::info;

use crate::error::{ScanError, ScanResult};

/// Summary statistics of a set of distances.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviationStats {
    /// Number of distances.
    pub count: usize,
    /// Largest distance.
    pub max: f64,
    /// Mean distance.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl DeviationStats {
    /// Computes statistics over `distances`. An empty slice gives all zeros.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_scan::DeviationStats;
    ///
    /// let stats = DeviationStats::from_distances(&[1.0, 3.0]);
    /// assert_eq!(stats.count, 2);
    /// assert_eq!(stats.max, 3.0);
    /// assert_eq!(stats.mean, 2.0);
    /// assert_eq!(stats.std_dev, 1.0);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_distances(distances: &[f64]) -> Self {
        if distances.is_empty() {
            return Self::default();
        }
        let n = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / n;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        let max = distances.iter().copied().fold(0.0, f64::max);

        Self {
            count: distances.len(),
            max,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

impl fmt::Display for DeviationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points: max {:.6}, mean {:.6}, std dev {:.6}",
            self.count, self.max, self.mean, self.std_dev
        )
    }
}

/// Maps distances to colours, blending linearly from `near` at zero to
/// `far` at the largest distance.
///
/// When every distance is zero (or the slice holds no positive finite
/// distance) every vertex gets `near`.
#[must_use]
pub fn deviation_colors(distances: &[f64], near: VertexColor, far: VertexColor) -> Vec<VertexColor> {
    let max = distances
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);
    if max <= 0.0 {
        return vec![near; distances.len()];
    }
    distances
        .iter()
        .map(|d| near.lerp(far, d / max))
        .collect()
}

/// Per-vertex deviation of a scan from a reference surface.
#[derive(Debug, Clone)]
pub struct Deviation {
    /// Distance from each scan vertex to the reference surface.
    pub distances: Vec<f64>,
    /// Closest reference point for each scan vertex.
    pub closest: Vec<Point3<f64>>,
    /// Summary of `distances`.
    pub stats: DeviationStats,
}

impl Deviation {
    /// Green-to-red colours for the scan vertices.
    #[must_use]
    pub fn colors(&self) -> Vec<VertexColor> {
        deviation_colors(&self.distances, VertexColor::GREEN, VertexColor::RED)
    }

    /// Writes [`Deviation::colors`] into the vertex colours of `scan`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::VertexCountMismatch`] if `scan` is not the mesh
    /// the deviation was measured on.
    pub fn paint(&self, scan: &mut IndexedMesh) -> ScanResult<()> {
        if scan.vertices.len() != self.distances.len() {
            return Err(ScanError::VertexCountMismatch {
                expected: self.distances.len(),
                actual: scan.vertices.len(),
            });
        }
        for (vertex, color) in scan.vertices.iter_mut().zip(self.colors()) {
            vertex.attributes.color = Some(color);
        }
        Ok(())
    }
}

/// Measures the distance from every vertex of `scan` to the surface of `reference`.
///
/// # Errors
///
/// Returns [`ScanError::Nearest`] if the reference has no faces or invalid
/// face indices.
pub fn scan_deviation(reference: &IndexedMesh, scan: &IndexedMesh) -> ScanResult<Deviation> {
    let surface = NearestSurface::new(reference)?;
    let hits = surface.nearest_many(&scan.positions());

    let distances: Vec<f64> = hits.iter().map(|h| h.distance).collect();
    let closest = hits.iter().map(|h| h.point).collect();
    let stats = DeviationStats::from_distances(&distances);

    Ok(Deviation {
        distances,
        closest,
        stats,
    })
}

/// Reference registered onto a scan, with the remaining deviation.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Registration of the reference onto the scan.
    pub registration: Registration,
    /// The reference moved by `registration.transform`.
    pub aligned_reference: IndexedMesh,
    /// Deviation of the scan vertices from the aligned reference.
    pub deviation: Deviation,
}

/// Registers `reference` onto `scan` and measures the scan's deviation from it.
///
/// # Errors
///
/// Returns [`ScanError::Registration`] or [`ScanError::Nearest`] from the
/// underlying steps.
pub fn align_and_measure(
    reference: &IndexedMesh,
    scan: &IndexedMesh,
    params: &RegisterParams,
) -> ScanResult<Alignment> {
    let registration = register(reference, scan, params)?;
    let aligned_reference = transform_mesh(reference, &registration.transform);
    let deviation = scan_deviation(&aligned_reference, scan)?;

    info!(
        cost = registration.cost,
        converged = registration.converged,
        max = deviation.stats.max,
        mean = deviation.stats.mean,
        "aligned reference to scan"
    );

    Ok(Alignment {
        registration,
        aligned_reference,
        deviation,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{PoseRange, ScanParams, simulate_scan};
    use approx::assert_relative_eq;
    use mesh_types::{box_mesh, unit_cube};

    #[test]
    fn test_stats() {
        let stats = DeviationStats::from_distances(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.max, 3.0);
        assert_relative_eq!(stats.mean, 1.5);
        assert_relative_eq!(stats.std_dev, 1.25f64.sqrt());
        assert!(stats.to_string().starts_with("4 points"));
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(DeviationStats::from_distances(&[]), DeviationStats::default());
    }

    #[test]
    fn test_colors_blend_by_fraction_of_max() {
        let colors = deviation_colors(&[0.0, 1.0, 2.0], VertexColor::GREEN, VertexColor::RED);
        assert_eq!(colors[0], VertexColor::GREEN);
        assert_eq!(colors[1], VertexColor::new(127, 127, 0));
        assert_eq!(colors[2], VertexColor::RED);
    }

    #[test]
    fn test_all_zero_distances_are_near() {
        let colors = deviation_colors(&[0.0, 0.0], VertexColor::GREEN, VertexColor::RED);
        assert_eq!(colors, vec![VertexColor::GREEN; 2]);
        assert!(deviation_colors(&[], VertexColor::GREEN, VertexColor::RED).is_empty());
    }

    #[test]
    fn test_scan_of_itself_has_no_deviation() {
        let mesh = box_mesh([2.0, 3.0, 4.0]);
        let deviation = scan_deviation(&mesh, &mesh).unwrap();
        assert_eq!(deviation.distances.len(), mesh.vertices.len());
        assert!(deviation.stats.max < 1e-12);
        assert_eq!(deviation.colors().len(), mesh.vertices.len());
    }

    #[test]
    fn test_centroid_distance_to_unit_cube() {
        let cube = unit_cube();
        let mut probe = IndexedMesh::new();
        probe.vertices.push(mesh_types::Vertex::from_coords(0.5, 0.5, 0.5));
        let deviation = scan_deviation(&cube, &probe).unwrap();
        assert_relative_eq!(deviation.distances[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_paint() {
        let reference = box_mesh([2.0, 2.0, 2.0]);
        let mut scan = reference.clone();
        scan.vertices[0].position += mesh_types::Vector3::new(-0.5, 0.0, 0.0);

        let deviation = scan_deviation(&reference, &scan).unwrap();
        deviation.paint(&mut scan).unwrap();
        assert_eq!(scan.vertices[0].attributes.color, Some(VertexColor::RED));
        assert_eq!(scan.vertices[1].attributes.color, Some(VertexColor::GREEN));

        let mut wrong = unit_cube();
        wrong.vertices.pop();
        assert!(matches!(
            deviation.paint(&mut wrong),
            Err(ScanError::VertexCountMismatch { .. })
        ));
    }

    #[test]
    fn test_align_and_measure_recovers_pose() {
        let params = ScanParams::noiseless()
            .with_extents([6.0, 12.0, 2.0])
            .with_target_face_count(200)
            .with_pose(PoseRange::small(3.0, 0.3))
            .with_seed(8);
        let scan = simulate_scan(&params).unwrap();
        let reference = box_mesh([6.0, 12.0, 2.0]);

        let alignment = align_and_measure(&reference, &scan.mesh, &RegisterParams::default()).unwrap();

        assert!(alignment.registration.cost < 1e-8);
        assert!(alignment.deviation.stats.max < 1e-3);
        assert_eq!(alignment.aligned_reference.faces, reference.faces);
    }

    #[test]
    fn test_empty_reference() {
        let scan = box_mesh([1.0, 1.0, 1.0]);
        assert!(matches!(
            scan_deviation(&IndexedMesh::new(), &scan),
            Err(ScanError::Nearest(_))
        ));
    }
}
