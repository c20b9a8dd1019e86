use glam::Vec3;
use wobble_mesh::Vertex;
use wobble_noise::simplex4;

use crate::uniforms::{NEIGHBOUR_SHIFT, WobbleUniforms};

/// Result of displacing one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displaced {
    pub position: Vec3,
    /// Normal rebuilt from the displaced tangent/bitangent neighbours.
    pub normal: Vec3,
    /// Signed distance moved along the base normal.
    pub wobble: f32,
}

/// Offset added to every axis of `position` before the main noise lookup.
///
/// Warping the domain of one noise field with another breaks up the regular
/// "stacked waves" look that summing octaves gives.
pub fn warp_offset(position: Vec3, uniforms: &WobbleUniforms) -> f32 {
    let sample = (position * uniforms.warp_position_frequency)
        .extend(uniforms.time * uniforms.warp_time_frequency);
    simplex4(sample) * uniforms.warp_strength
}

/// Scalar displacement along the normal at `position`.
pub fn wobble_at(position: Vec3, uniforms: &WobbleUniforms) -> f32 {
    let warped = position + Vec3::splat(warp_offset(position, uniforms));
    let sample =
        (warped * uniforms.position_frequency).extend(uniforms.time * uniforms.time_frequency);
    simplex4(sample) * uniforms.strength
}

/// Displace a vertex along its normal and rebuild the normal.
///
/// Analytic normals are wrong once the surface moves, so two neighbours a
/// fixed [`NEIGHBOUR_SHIFT`] away along the tangent and bitangent are displaced
/// too and the normal is taken from the two edges they form.
pub fn displace(vertex: &Vertex, uniforms: &WobbleUniforms) -> Displaced {
    let normal = vertex.normal;
    let tangent = vertex.tangent.truncate();
    let bitangent = normal.cross(tangent);

    let wobble = wobble_at(vertex.position, uniforms);
    let position = vertex.position + normal * wobble;

    let mut neighbour_a = vertex.position + tangent * NEIGHBOUR_SHIFT;
    let mut neighbour_b = vertex.position + bitangent * NEIGHBOUR_SHIFT;
    neighbour_a += normal * wobble_at(neighbour_a, uniforms);
    neighbour_b += normal * wobble_at(neighbour_b, uniforms);

    let to_a = (neighbour_a - position).normalize_or_zero();
    let to_b = (neighbour_b - position).normalize_or_zero();
    let rebuilt = to_a.cross(to_b).normalize_or_zero();

    Displaced {
        position,
        normal: if rebuilt == Vec3::ZERO { normal } else { rebuilt },
        wobble,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn sphere_vertex(direction: Vec3, radius: f32) -> Vertex {
        let normal = direction.normalize();
        let tangent = normal.any_orthonormal_vector();
        Vertex {
            position: normal * radius,
            normal,
            uv: glam::Vec2::ZERO,
            tangent: Vec4::new(tangent.x, tangent.y, tangent.z, 1.0),
        }
    }

    fn sample_directions() -> Vec<Vec3> {
        (0..64)
            .map(|i| {
                let f = i as f32;
                Vec3::new((f * 1.3).sin(), (f * 0.7).cos(), (f * 2.1).sin() + 0.1)
            })
            .collect()
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let u = WobbleUniforms::default().at_time(3.7);
        for dir in sample_directions() {
            let v = sphere_vertex(dir, 2.5);
            let first = displace(&v, &u);
            let second = displace(&v, &u);
            assert_eq!(first, second);
            assert_eq!(first.wobble.to_bits(), second.wobble.to_bits());
        }
    }

    #[test]
    fn moves_along_the_base_normal() {
        let u = WobbleUniforms::default().at_time(1.0);
        for dir in sample_directions() {
            let v = sphere_vertex(dir, 2.5);
            let d = displace(&v, &u);
            let offset = d.position - v.position;
            assert!((offset - v.normal * d.wobble).length() < 1e-5);
            assert!(d.wobble.abs() <= u.strength * 1.5);
        }
    }

    #[test]
    fn zero_strength_removes_displacement_exactly() {
        let u = WobbleUniforms {
            strength: 0.0,
            ..WobbleUniforms::default()
        }
        .at_time(12.0);
        for dir in sample_directions() {
            let v = sphere_vertex(dir, 2.5);
            assert_eq!(wobble_at(v.position, &u), 0.0);
            assert_eq!(displace(&v, &u).position, v.position);
        }
    }

    #[test]
    fn zero_warp_strength_removes_warp_exactly() {
        let warped = WobbleUniforms {
            warp_strength: 0.0,
            ..WobbleUniforms::default()
        }
        .at_time(5.0);
        for dir in sample_directions() {
            let p = dir.normalize() * 2.5;
            assert_eq!(warp_offset(p, &warped), 0.0);
            // Without warp the main lookup sees the raw position.
            let direct = simplex4(
                (p * warped.position_frequency).extend(warped.time * warped.time_frequency),
            ) * warped.strength;
            assert_eq!(wobble_at(p, &warped), direct);
        }
    }

    #[test]
    fn flat_uniforms_keep_normals() {
        let u = WobbleUniforms::flat().at_time(2.0);
        for dir in sample_directions() {
            let v = sphere_vertex(dir, 2.5);
            let d = displace(&v, &u);
            // Neighbours sit on the tangent plane, so the rebuilt normal is the base one.
            assert!(d.normal.dot(v.normal) > 0.9999);
        }
    }

    #[test]
    fn rebuilt_normal_faces_outward() {
        let u = WobbleUniforms::default().at_time(0.5);
        for dir in sample_directions() {
            let v = sphere_vertex(dir, 2.5);
            let d = displace(&v, &u);
            assert!((d.normal.length() - 1.0).abs() < 1e-4);
            assert!(d.normal.dot(v.normal) > 0.0);
        }
    }

    #[test]
    fn displacement_is_continuous() {
        // Each noise lookup is Lipschitz with a constant well under 50; the
        // warp feeds one lookup into the other.
        let u = WobbleUniforms::default().at_time(4.2);
        let k = 50.0;
        let bound = u.strength * k * u.position_frequency
            * (1.0 + 3.0_f32.sqrt() * u.warp_strength * k * u.warp_position_frequency);
        let step = 1e-4;
        for dir in sample_directions() {
            let p1 = dir.normalize() * 2.5;
            for offset in [Vec3::X, Vec3::Y, Vec3::Z] {
                let p2 = p1 + offset * step;
                let delta = (wobble_at(p1, &u) - wobble_at(p2, &u)).abs();
                assert!(delta <= bound * step, "delta {delta} at {p1:?}");
                // And in practice far tighter than the worst case.
                assert!(delta < 0.01, "delta {delta} at {p1:?}");
            }
        }
    }

    #[test]
    fn animates_over_time() {
        let v = sphere_vertex(Vec3::new(0.3, 0.8, -0.5), 2.5);
        let early = displace(&v, &WobbleUniforms::default().at_time(0.0));
        let late = displace(&v, &WobbleUniforms::default().at_time(10.0));
        assert_ne!(early.wobble, late.wobble);
    }
}
