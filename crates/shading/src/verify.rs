use serde::Serialize;
use wobble_mesh::IndexedMesh;

use crate::material::{DepthStage, SurfaceStage, VertexStage};
use crate::uniforms::{NEIGHBOUR_SHIFT, WobbleUniforms};

/// Largest neighbour step, as a fraction of the shortest edge, that still
/// samples the surface locally.
const MAX_SHIFT_FRACTION: f32 = 0.5;

/// Outcome of running both vertex stages over a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassReport {
    pub vertices: usize,
    /// Largest distance between the surface and shadow-depth positions.
    pub max_position_delta: f32,
    /// Range of the normalised wobble handed to the fragment stage.
    pub min_wobble: f32,
    pub max_wobble: f32,
}

impl PassReport {
    pub fn agrees(&self, tolerance: f32) -> bool {
        self.max_position_delta <= tolerance
    }
}

/// Evaluate the surface and depth stages at every vertex of `mesh`.
pub fn verify_passes(mesh: &IndexedMesh, uniforms: &WobbleUniforms) -> PassReport {
    let _span = tracing::info_span!("verify_passes", vertices = mesh.vertices.len()).entered();
    let mut report = PassReport {
        vertices: mesh.vertices.len(),
        max_position_delta: 0.0,
        min_wobble: f32::INFINITY,
        max_wobble: f32::NEG_INFINITY,
    };
    for vertex in &mesh.vertices {
        let surface = SurfaceStage.vertex(vertex, uniforms);
        let depth = DepthStage.vertex(vertex, uniforms);
        report.max_position_delta = report
            .max_position_delta
            .max(surface.position.distance(depth.position));
        report.min_wobble = report.min_wobble.min(surface.wobble);
        report.max_wobble = report.max_wobble.max(surface.wobble);
    }
    if mesh.vertices.is_empty() {
        report.min_wobble = 0.0;
        report.max_wobble = 0.0;
    }
    tracing::debug!(
        "{} vertices, max delta {}, wobble {}..{}",
        report.vertices,
        report.max_position_delta,
        report.min_wobble,
        report.max_wobble
    );
    report
}

/// Whether [`NEIGHBOUR_SHIFT`] is small enough for a mesh whose shortest
/// edge is `min_edge`.
pub fn neighbour_shift_ok(min_edge: f32) -> bool {
    NEIGHBOUR_SHIFT < min_edge * MAX_SHIFT_FRACTION
}

#[cfg(test)]
mod tests {
    use super::*;
    use wobble_mesh::build_icosphere;

    #[test]
    fn stages_agree_on_the_scene_mesh() {
        let mesh = build_icosphere(2.5, 8);
        let report = verify_passes(&mesh, &WobbleUniforms::default().at_time(7.5));
        assert_eq!(report.vertices, mesh.vertices.len());
        assert_eq!(report.max_position_delta, 0.0);
        assert!(report.agrees(0.0));
        assert!(report.min_wobble < 0.0 && report.max_wobble > 0.0);
        assert!(report.min_wobble >= -1.5 && report.max_wobble <= 1.5);
    }

    #[test]
    fn flat_uniforms_leave_the_mesh_alone() {
        let mesh = build_icosphere(2.5, 4);
        let u = WobbleUniforms::flat().at_time(3.0);
        for vertex in &mesh.vertices {
            assert_eq!(SurfaceStage.vertex(vertex, &u).position, vertex.position);
        }
        let report = verify_passes(&mesh, &u);
        assert_eq!(report.min_wobble, 0.0);
        assert_eq!(report.max_wobble, 0.0);
    }

    #[test]
    fn empty_mesh_reports_zero_range() {
        let report = verify_passes(&IndexedMesh::default(), &WobbleUniforms::default());
        assert_eq!(report.vertices, 0);
        assert_eq!(report.min_wobble, 0.0);
    }

    #[test]
    fn shift_check_tracks_mesh_density() {
        let scene = build_icosphere(2.5, 50);
        let edge = scene.min_edge_length().unwrap();
        assert!(neighbour_shift_ok(edge), "edge {edge}");
        assert!(!neighbour_shift_ok(0.015));
    }
}
