//! Environment maps for the wobble viewer.
//!
//! The scene is lit and backed by a single equirectangular image. This crate
//! decodes it, caps its size, builds the mip chain the renderer samples for
//! rough reflections and provides a procedural sky when no image is given.
//!
//! # Layout
//! `u` wraps around the vertical axis starting at -X, `v` runs from the zenith
//! (0) to the nadir (1). See [`equirect_uv`].

mod environment;

pub use environment::{
    AssetError, DEFAULT_MAX_SIZE, EnvironmentMap, equirect_uv, mip_level_count,
};

pub fn crate_info() -> &'static str {
    "wobble-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_info_names_the_crate() {
        assert!(crate_info().starts_with("wobble-assets"));
    }
}
