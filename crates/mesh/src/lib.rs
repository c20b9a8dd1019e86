//! Mesh generation for the wobble viewer.
//!
//! Builds the subdivided icosahedron the same way the scene authoring tools
//! do: a triangle soup with spherical UVs, welded into an indexed mesh, then
//! given per-vertex tangents so the displacement shader can find neighbours.
//!
//! # Invariants
//! - Every vertex of an icosphere lies on the sphere of the requested radius.
//! - Tangents are unit length and orthogonal to their normal; `w` is ±1.

mod icosphere;
mod indexed;
mod tangents;

pub use icosphere::{TriangleSoup, icosahedron};
pub use indexed::{IndexedMesh, MERGE_TOLERANCE, Vertex, merge_vertices};
pub use tangents::compute_tangents;

/// Build the indexed, tangent-carrying icosphere used by the scene.
pub fn build_icosphere(radius: f32, detail: u32) -> IndexedMesh {
    let _span = tracing::info_span!("build_icosphere", radius, detail).entered();
    let soup = icosahedron(radius, detail);
    let mut mesh = merge_vertices(&soup, MERGE_TOLERANCE);
    compute_tangents(&mut mesh);
    tracing::debug!(
        "icosphere: {} soup vertices welded to {}, {} triangles",
        soup.len(),
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    mesh
}

pub fn crate_info() -> &'static str {
    "wobble-mesh v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_welded_and_tangent_ready() {
        let mesh = build_icosphere(2.5, 3);
        assert_eq!(mesh.triangle_count(), 20 * 16);
        assert!(mesh.vertices.len() < mesh.indices.len());
        for v in &mesh.vertices {
            assert!((v.tangent.truncate().length() - 1.0).abs() < 1e-4);
        }
    }
}
