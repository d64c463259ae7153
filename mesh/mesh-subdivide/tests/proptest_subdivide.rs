//! Property-based tests for midpoint subdivision.
//!
//! Run with: cargo test -p mesh-subdivide -- proptest

use mesh_subdivide::{SubdivideParams, subdivide, subdivide_mesh};
use mesh_types::{IndexedMesh, MeshTopology, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_vertex() -> impl Strategy<Value = Vertex> {
    prop::array::uniform3(-100.0..100.0f64).prop_map(Vertex::from)
}

/// A mesh with 3..=`max_vertices` vertices and 1..=`max_faces` faces whose
/// indices are all in range.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = IndexedMesh> {
    (3..=max_vertices).prop_flat_map(move |num_vertices| {
        let vertices = prop::collection::vec(arb_vertex(), num_vertices);
        #[allow(clippy::cast_possible_truncation)]
        let face = prop::array::uniform3(0..num_vertices as u32);
        let faces = prop::collection::vec(face, 1..=max_faces);
        (vertices, faces).prop_map(|(v, f)| IndexedMesh::from_parts(v, f))
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_face_count_quadruples(mesh in arb_mesh(20, 30)) {
        let fine = subdivide(&mesh).unwrap();
        prop_assert_eq!(fine.face_count(), 4 * mesh.face_count());
        prop_assert!(fine.vertex_count() > mesh.vertex_count());
    }

    #[test]
    fn proptest_vertex_growth_bounded_by_edges(mesh in arb_mesh(20, 30)) {
        let fine = subdivide(&mesh).unwrap();
        let added = fine.vertex_count() - mesh.vertex_count();
        prop_assert!(added >= 1);
        prop_assert!(added <= 3 * mesh.face_count());
    }

    #[test]
    fn proptest_original_vertices_untouched(mesh in arb_mesh(20, 30)) {
        let fine = subdivide(&mesh).unwrap();
        for (a, b) in mesh.vertices.iter().zip(&fine.vertices) {
            prop_assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn proptest_indices_stay_valid(mesh in arb_mesh(20, 30), passes in 0u32..3) {
        let result = subdivide_mesh(&mesh, &SubdivideParams::fixed(passes)).unwrap();
        prop_assert!(result.mesh.first_invalid_face().is_none());
        prop_assert_eq!(result.final_faces, mesh.face_count() * 4usize.pow(passes));
    }

    #[test]
    fn proptest_until_faces_lands_above_target(mesh in arb_mesh(10, 10), target in 1usize..2000) {
        let result = subdivide_mesh(&mesh, &SubdivideParams::until_faces(target)).unwrap();
        prop_assert!(result.final_faces > target);
        // The previous pass was still at or below the target
        if result.iterations > 0 {
            prop_assert!(result.final_faces / 4 <= target);
        }
    }

    #[test]
    fn proptest_surface_area_preserved(mesh in arb_mesh(12, 12)) {
        let fine = subdivide(&mesh).unwrap();
        let before = mesh.surface_area();
        let after = fine.surface_area();
        prop_assert!((before - after).abs() <= 1e-6 * before.max(1.0));
    }
}
