//! Noise fields for the wobble displacement.
//!
//! The CPU functions here follow the WGSL noise in the renderer step for step,
//! so offline evaluation and the GPU agree up to float rounding.
//!
//! # Invariants
//! - Noise is a pure function of its input: no tables, no seeds, no state.
//! - Output is continuous in every coordinate and stays close to `[-1, 1]`.

mod simplex;

pub use simplex::simplex4;

pub fn crate_info() -> &'static str {
    "wobble-noise v0.1.0"
}
