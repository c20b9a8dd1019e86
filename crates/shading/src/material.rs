use glam::Vec3;
use serde::{Deserialize, Serialize};
use wobble_mesh::Vertex;

use crate::displace::displace;
use crate::settings::WobbleColors;
use crate::uniforms::WobbleUniforms;

/// A vertex program over the wobble uniform set.
///
/// Both scene materials implement this; they differ only in what they hand
/// to the next stage, never in how the vertex moves.
pub trait VertexStage {
    type Output;

    fn label(&self) -> &'static str;

    fn vertex(&self, vertex: &Vertex, uniforms: &WobbleUniforms) -> Self::Output;
}

/// What the visible material passes to its fragment stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOutput {
    pub position: Vec3,
    pub normal: Vec3,
    /// Wobble divided by `uStrength`, roughly in `[-1, 1]`.
    pub wobble: f32,
}

/// What the shadow-depth material needs: the position only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOutput {
    pub position: Vec3,
}

/// Vertex stage of the visible, lit material.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceStage;

/// Vertex stage of the material used when rendering from the light.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthStage;

impl VertexStage for SurfaceStage {
    type Output = SurfaceOutput;

    fn label(&self) -> &'static str {
        "surface"
    }

    fn vertex(&self, vertex: &Vertex, uniforms: &WobbleUniforms) -> SurfaceOutput {
        let d = displace(vertex, uniforms);
        SurfaceOutput {
            position: d.position,
            normal: d.normal,
            wobble: normalized_wobble(d.wobble, uniforms),
        }
    }
}

impl VertexStage for DepthStage {
    type Output = DepthOutput;

    fn label(&self) -> &'static str {
        "shadow-depth"
    }

    fn vertex(&self, vertex: &Vertex, uniforms: &WobbleUniforms) -> DepthOutput {
        DepthOutput {
            position: displace(vertex, uniforms).position,
        }
    }
}

/// Wobble rescaled so the color ramp does not depend on `uStrength`.
///
/// With zero strength there is no wobble to normalise and the ramp sits at
/// its midpoint.
pub fn normalized_wobble(wobble: f32, uniforms: &WobbleUniforms) -> f32 {
    if uniforms.strength == 0.0 {
        0.0
    } else {
        wobble / uniforms.strength
    }
}

/// Blend factor between color A and color B: `smoothstep(-1, 1, wobble)`.
pub fn color_mix(wobble: f32) -> f32 {
    let t = ((wobble + 1.0) / 2.0).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear diffuse color of a fragment with the given normalised wobble.
pub fn surface_color(colors: &WobbleColors, wobble: f32) -> Vec3 {
    colors
        .color_a
        .to_linear()
        .lerp(colors.color_b.to_linear(), color_mix(wobble))
}

/// Physical material parameters of the visible surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceMaterial {
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub ior: f32,
    pub thickness: f32,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            metalness: 0.0,
            roughness: 0.5,
            transmission: 0.0,
            ior: 1.5,
            thickness: 1.5,
        }
    }
}

impl SurfaceMaterial {
    /// Panel controls as (label, value, min, max).
    pub fn controls_mut(&mut self) -> [(&'static str, &mut f32, f32, f32); 5] {
        [
            ("metalness", &mut self.metalness, 0.0, 1.0),
            ("roughness", &mut self.roughness, 0.0, 1.0),
            ("transmission", &mut self.transmission, 0.0, 1.0),
            ("ior", &mut self.ior, 0.0, 10.0),
            ("thickness", &mut self.thickness, 0.0, 10.0),
        ]
    }
}
