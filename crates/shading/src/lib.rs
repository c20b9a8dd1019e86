//! Wobble shading: the displacement both materials share, evaluated on the CPU.
//!
//! The renderer runs the same algorithm in WGSL; this crate is the reference
//! used by the CLI, by tests and by anything that needs the displaced surface
//! without a GPU.
//!
//! # Invariants
//! - The surface stage and the shadow-depth stage read one [`WobbleUniforms`]
//!   and call the same [`displace`], so a cast shadow always matches the
//!   visible silhouette.
//! - A strength of 0 removes its contribution exactly, not approximately.

mod clock;
mod displace;
mod material;
mod settings;
mod tonemap;
mod uniforms;
mod verify;

pub use clock::FrameClock;
pub use displace::{Displaced, displace, warp_offset, wobble_at};
pub use material::{
    DepthOutput, DepthStage, SurfaceMaterial, SurfaceOutput, SurfaceStage, VertexStage, color_mix,
    normalized_wobble, surface_color,
};
pub use settings::{
    LightSettings, PresetError, RendererSettings, SceneSettings, ShadowSettings, WobbleColors,
};
pub use tonemap::aces_filmic;
pub use uniforms::{NEIGHBOUR_SHIFT, UNIFORM_RANGE, WobbleUniforms};
pub use verify::{PassReport, neighbour_shift_ok, verify_passes};

pub fn crate_info() -> &'static str {
    "wobble-shading v0.1.0"
}
