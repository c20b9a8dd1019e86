use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

use crate::icosphere::TriangleSoup;

/// Attribute tolerance used when welding the icosphere soup.
pub const MERGE_TOLERANCE: f32 = 1e-4;

/// A welded mesh vertex with everything the wobble stages read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// xyz = tangent direction, w = handedness (±1). Zero until
    /// [`compute_tangents`](crate::compute_tangents) runs.
    pub tangent: Vec4,
}

impl Vertex {
    /// The vertex an icosphere of `radius` would have in `direction`, with
    /// the tangent pointing along increasing `u`.
    pub fn on_sphere(direction: Vec3, radius: f32) -> Self {
        let normal = direction.normalize_or(Vec3::Y);
        let tangent = Vec3::Y
            .cross(normal)
            .try_normalize()
            .unwrap_or_else(|| normal.any_orthonormal_vector());
        Self {
            position: normal * radius,
            normal,
            uv: Vec2::ZERO,
            tangent: tangent.extend(1.0),
        }
    }
}

/// Indexed triangle mesh with u32 indices.
#[derive(Debug, Clone, Default)]
pub struct IndexedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Length of the shortest triangle edge, or `None` for an empty mesh.
    pub fn min_edge_length(&self) -> Option<f32> {
        self.triangles()
            .flat_map(|[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(i, j)| {
                let p = self.vertices[i as usize].position;
                let q = self.vertices[j as usize].position;
                p.distance(q)
            })
            .reduce(f32::min)
    }

    /// Number of distinct positions, ignoring UV and normal splits.
    pub fn distinct_positions(&self, tolerance: f32) -> usize {
        let shift = 1.0 / tolerance;
        let mut seen = std::collections::HashSet::new();
        for v in &self.vertices {
            seen.insert(quantize(v.position.to_array(), shift));
        }
        seen.len()
    }
}

fn quantize<const N: usize>(values: [f32; N], shift: f32) -> [i64; N] {
    values.map(|v| (v * shift).round() as i64)
}

/// Weld vertices whose position, normal and UV agree within `tolerance`.
///
/// The first occurrence of each attribute tuple is kept; later duplicates
/// reuse its index. Vertices on UV seams stay split because their UVs differ.
pub fn merge_vertices(soup: &TriangleSoup, tolerance: f32) -> IndexedMesh {
    let shift = 1.0 / tolerance;
    let mut lookup: HashMap<[i64; 8], u32> = HashMap::with_capacity(soup.len() / 4);
    let mut mesh = IndexedMesh {
        vertices: Vec::with_capacity(soup.len() / 4),
        indices: Vec::with_capacity(soup.len()),
    };

    for ((&position, &normal), &uv) in soup.positions.iter().zip(&soup.normals).zip(&soup.uvs) {
        let key = quantize(
            [
                position.x, position.y, position.z, normal.x, normal.y, normal.z, uv.x, uv.y,
            ],
            shift,
        );
        let index = *lookup.entry(key).or_insert_with(|| {
            mesh.vertices.push(Vertex {
                position,
                normal,
                uv,
                tangent: Vec4::ZERO,
            });
            (mesh.vertices.len() - 1) as u32
        });
        mesh.indices.push(index);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icosahedron;

    #[test]
    fn merge_preserves_triangles() {
        let soup = icosahedron(1.0, 3);
        let mesh = merge_vertices(&soup, MERGE_TOLERANCE);
        assert_eq!(mesh.indices.len(), soup.len());
        for (i, &index) in mesh.indices.iter().enumerate() {
            let v = mesh.vertices[index as usize];
            assert!(v.position.distance(soup.positions[i]) < 1e-3);
        }
    }

    #[test]
    fn merge_welds_shared_corners() {
        for detail in [0, 2, 7] {
            let soup = icosahedron(2.5, detail);
            let mesh = merge_vertices(&soup, MERGE_TOLERANCE);
            // An icosphere has 10 * (detail + 1)^2 + 2 distinct points. Points
            // shared by two base faces are computed along different paths, so
            // a rare one can round into a neighbouring bucket.
            let expected = 10 * (detail as usize + 1).pow(2) + 2;
            let distinct = mesh.distinct_positions(MERGE_TOLERANCE);
            assert!(distinct >= expected, "{distinct} < {expected}");
            assert!(distinct <= expected + expected / 50 + 1, "{distinct} >> {expected}");
            // Seam splits add some vertices, but far fewer than the soup has.
            assert!(mesh.vertices.len() >= expected);
            assert!(mesh.vertices.len() < soup.len() / 2);
        }
    }

    #[test]
    fn min_edge_shrinks_with_detail() {
        let coarse = merge_vertices(&icosahedron(2.5, 2), MERGE_TOLERANCE);
        let fine = merge_vertices(&icosahedron(2.5, 20), MERGE_TOLERANCE);
        let coarse_edge = coarse.min_edge_length().unwrap();
        let fine_edge = fine.min_edge_length().unwrap();
        assert!(fine_edge < coarse_edge);
        assert!(fine_edge > 0.0);
    }

    #[test]
    fn on_sphere_frame_is_orthonormal() {
        for direction in [Vec3::new(1.0, 2.0, 3.0), Vec3::Y, Vec3::NEG_Y, Vec3::ZERO] {
            let v = Vertex::on_sphere(direction, 2.5);
            assert!((v.position.length() - 2.5).abs() < 1e-5);
            let t = v.tangent.truncate();
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!(t.dot(v.normal).abs() < 1e-5);
        }
    }

    #[test]
    fn on_sphere_tangent_follows_mesh_tangents() {
        let mut mesh = merge_vertices(&icosahedron(2.5, 6), MERGE_TOLERANCE);
        crate::compute_tangents(&mut mesh);
        for v in mesh.vertices.iter().filter(|v| v.normal.y.abs() < 0.7) {
            let single = Vertex::on_sphere(v.normal, 2.5);
            assert!(single.tangent.truncate().dot(v.tangent.truncate()) > 0.8);
        }
    }

    #[test]
    fn empty_mesh_has_no_edges() {
        assert!(IndexedMesh::default().min_edge_length().is_none());
    }
}
