//! wgpu renderer for the wobble viewer.
//!
//! Draws the displaced icosphere over an equirectangular environment, lit by
//! one directional light with a PCF shadow map. The camera orbits the origin.
//!
//! # Invariants
//! - The shadow pass and the surface pass displace vertices with the same
//!   WGSL chunk and the same uniform buffer.
//! - The renderer never mutates scene settings; it only reads them per frame.

mod camera;
mod environment;
mod gpu;
mod shaders;
mod shadow;
mod viewport;

pub use camera::OrbitCamera;
pub use environment::EnvironmentTexture;
pub use gpu::{GpuUniforms, WobbleRenderer};
pub use shadow::{SHADOW_FORMAT, ShadowMap};
pub use viewport::Viewport;

pub fn crate_info() -> &'static str {
    "wobble-render-wgpu v0.1.0"
}
