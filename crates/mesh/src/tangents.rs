use glam::{Vec3, Vec4};

use crate::indexed::IndexedMesh;

/// Per-vertex tangents from UV derivatives.
///
/// Each triangle contributes its s/t directions to its three corners; the
/// accumulated s direction is then orthogonalised against the vertex normal.
/// `w` stores the handedness of the (normal, tangent, t) frame.
pub fn compute_tangents(mesh: &mut IndexedMesh) {
    let mut tan_s = vec![Vec3::ZERO; mesh.vertices.len()];
    let mut tan_t = vec![Vec3::ZERO; mesh.vertices.len()];
    let mut skipped = 0usize;

    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (va, vb, vc) = (&mesh.vertices[a], &mesh.vertices[b], &mesh.vertices[c]);

        let e1 = vb.position - va.position;
        let e2 = vc.position - va.position;
        let d1 = vb.uv - va.uv;
        let d2 = vc.uv - va.uv;

        let r = 1.0 / (d1.x * d2.y - d2.x * d1.y);
        if !r.is_finite() {
            skipped += 1;
            continue;
        }

        let sdir = (e1 * d2.y - e2 * d1.y) * r;
        let tdir = (e2 * d1.x - e1 * d2.x) * r;
        for i in [a, b, c] {
            tan_s[i] += sdir;
            tan_t[i] += tdir;
        }
    }

    let mut fallback = 0usize;
    for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
        let n = vertex.normal;
        let s = tan_s[i];
        let mut t = (s - n * n.dot(s)).normalize_or_zero();
        if t == Vec3::ZERO {
            t = n.any_orthonormal_vector();
            fallback += 1;
        }
        let w = if n.cross(s).dot(tan_t[i]) < 0.0 { -1.0 } else { 1.0 };
        vertex.tangent = Vec4::new(t.x, t.y, t.z, w);
    }

    if skipped > 0 || fallback > 0 {
        tracing::debug!(
            "tangents: {skipped} triangles with degenerate UVs, {fallback} vertices used a fallback"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MERGE_TOLERANCE, icosahedron, merge_vertices};

    fn tangent_mesh(detail: u32) -> IndexedMesh {
        let mut mesh = merge_vertices(&icosahedron(2.5, detail), MERGE_TOLERANCE);
        compute_tangents(&mut mesh);
        mesh
    }

    #[test]
    fn tangents_are_unit_and_orthogonal() {
        let mesh = tangent_mesh(8);
        for v in &mesh.vertices {
            let t = v.tangent.truncate();
            assert!((t.length() - 1.0).abs() < 1e-4, "tangent {t:?}");
            assert!(t.dot(v.normal).abs() < 1e-4, "tangent {t:?} vs normal {:?}", v.normal);
            assert!(v.tangent.w == 1.0 || v.tangent.w == -1.0);
        }
    }

    #[test]
    fn bitangent_completes_a_frame() {
        let mesh = tangent_mesh(4);
        for v in &mesh.vertices {
            let bitangent = v.normal.cross(v.tangent.truncate());
            assert!((bitangent.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn tangents_follow_increasing_u() {
        // Away from the poles, u = atan2(z, -x) grows along the tangent.
        let mesh = tangent_mesh(6);
        for v in &mesh.vertices {
            if v.normal.y.abs() > 0.8 {
                continue;
            }
            let p = v.position;
            let step = p + v.tangent.truncate() * 1e-2;
            let du = step.z.atan2(-step.x) - p.z.atan2(-p.x);
            let du = (du + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
                - std::f32::consts::PI;
            assert!(du > 0.0, "tangent at {p:?} points against u");
        }
    }

    #[test]
    fn degenerate_uvs_fall_back_to_orthonormal() {
        let mut mesh = tangent_mesh(0);
        for v in &mut mesh.vertices {
            v.uv = glam::Vec2::ZERO;
        }
        compute_tangents(&mut mesh);
        for v in &mesh.vertices {
            let t = v.tangent.truncate();
            assert!((t.length() - 1.0).abs() < 1e-4);
            assert!(t.dot(v.normal).abs() < 1e-4);
        }
    }
}
