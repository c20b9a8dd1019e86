//! Shared types for the wobble workspace.

mod color;

pub use color::{ColorParseError, Rgb};

pub fn crate_info() -> &'static str {
    "wobble-common v0.1.0"
}
