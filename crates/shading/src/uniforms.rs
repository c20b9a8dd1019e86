use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Distance to the tangent/bitangent neighbours used to rebuild normals.
pub const NEIGHBOUR_SHIFT: f32 = 0.01;

/// Range the tweak panel offers for every wobble uniform.
pub const UNIFORM_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// The wobble uniform set, shared by the surface and shadow-depth stages.
///
/// `time` is driven by the frame clock and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WobbleUniforms {
    #[serde(skip)]
    pub time: f32,
    pub position_frequency: f32,
    pub time_frequency: f32,
    pub strength: f32,
    pub warp_position_frequency: f32,
    pub warp_time_frequency: f32,
    pub warp_strength: f32,
}

impl Default for WobbleUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            position_frequency: 0.5,
            time_frequency: 0.4,
            strength: 0.3,
            warp_position_frequency: 0.38,
            warp_time_frequency: 0.12,
            warp_strength: 1.7,
        }
    }
}

impl WobbleUniforms {
    /// A uniform set that leaves the mesh untouched.
    pub fn flat() -> Self {
        Self {
            strength: 0.0,
            warp_strength: 0.0,
            ..Self::default()
        }
    }

    pub fn at_time(self, time: f32) -> Self {
        Self { time, ..self }
    }

    /// The tweakable values with their shader names, in panel order.
    pub fn controls_mut(&mut self) -> [(&'static str, &mut f32); 6] {
        [
            ("uPositionFrequency", &mut self.position_frequency),
            ("uTimeFrequency", &mut self.time_frequency),
            ("uStrength", &mut self.strength),
            ("uWarpPositionFrequency", &mut self.warp_position_frequency),
            ("uWarpTimeFrequency", &mut self.warp_time_frequency),
            ("uWarpStrength", &mut self.warp_strength),
        ]
    }

    /// Read-only view of [`controls_mut`](Self::controls_mut).
    pub fn controls(&self) -> [(&'static str, f32); 6] {
        [
            ("uPositionFrequency", self.position_frequency),
            ("uTimeFrequency", self.time_frequency),
            ("uStrength", self.strength),
            ("uWarpPositionFrequency", self.warp_position_frequency),
            ("uWarpTimeFrequency", self.warp_time_frequency),
            ("uWarpStrength", self.warp_strength),
        ]
    }
}
