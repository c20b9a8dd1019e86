use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wobble_common::Rgb;

use crate::material::SurfaceMaterial;
use crate::uniforms::WobbleUniforms;

/// Errors from loading or saving a scene preset.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("failed to read preset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write preset {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid preset value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The two ends of the wobble color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WobbleColors {
    pub color_a: Rgb,
    pub color_b: Rgb,
}

impl Default for WobbleColors {
    fn default() -> Self {
        Self {
            color_a: Rgb::new(0x00, 0x00, 0xff),
            color_b: Rgb::new(0xff, 0x00, 0x00),
        }
    }
}

/// Shadow map resolution and the light's orthographic shadow camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub map_size: u32,
    /// Half-width of the square orthographic frustum.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    /// World-space offset along the normal applied before the depth lookup.
    pub normal_bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 1024,
            extent: 5.0,
            near: 0.5,
            far: 15.0,
            normal_bias: 0.05,
        }
    }
}

/// The single shadow-casting directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub color: Rgb,
    pub intensity: f32,
    /// Light position; it shines towards the origin.
    pub position: Vec3,
    pub shadow: ShadowSettings,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            intensity: 3.0,
            position: Vec3::new(0.25, 2.0, -2.25),
            shadow: ShadowSettings::default(),
        }
    }
}

impl LightSettings {
    /// Unit vector from the scene towards the light.
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }

    /// Linear light color premultiplied by intensity.
    pub fn radiance(&self) -> Vec3 {
        self.color.to_linear() * self.intensity
    }

    /// World to light clip space for the shadow pass.
    pub fn shadow_view_proj(&self) -> Mat4 {
        let up = if self.direction().abs_diff_eq(Vec3::Y, 1e-3)
            || self.direction().abs_diff_eq(Vec3::NEG_Y, 1e-3)
        {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, up);
        let e = self.shadow.extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, self.shadow.near, self.shadow.far);
        proj * view
    }
}

/// Output-stage settings of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub exposure: f32,
    pub max_pixel_ratio: f32,
    pub msaa_samples: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            max_pixel_ratio: 2.0,
            msaa_samples: 4,
        }
    }
}

/// Everything the tweak panel edits, loadable from a YAML preset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub wobble: WobbleUniforms,
    pub colors: WobbleColors,
    pub material: SurfaceMaterial,
    pub light: LightSettings,
    pub renderer: RendererSettings,
}

fn check(ok: bool, field: &'static str, reason: impl FnOnce() -> String) -> Result<(), PresetError> {
    if ok {
        Ok(())
    } else {
        Err(PresetError::Invalid {
            field,
            reason: reason(),
        })
    }
}

fn check_range(value: f32, min: f32, max: f32, field: &'static str) -> Result<(), PresetError> {
    check(value.is_finite() && (min..=max).contains(&value), field, || {
        format!("{value} is outside {min}..={max}")
    })
}

impl SceneSettings {
    /// Reject values the renderer cannot use.
    pub fn validate(&self) -> Result<(), PresetError> {
        for (name, value) in self.wobble.controls() {
            check(value.is_finite() && value >= 0.0, "wobble", || {
                format!("{name} must be a finite, non-negative number, got {value}")
            })?;
        }
        let mut material = self.material;
        for (name, value, min, max) in material.controls_mut() {
            let value = *value;
            check(value.is_finite() && (min..=max).contains(&value), "material", || {
                format!("{name} = {value} is outside {min}..={max}")
            })?;
        }
        check_range(self.light.intensity, 0.0, 100.0, "light.intensity")?;
        check(self.light.position.is_finite(), "light.position", || {
            format!("{} is not finite", self.light.position)
        })?;
        check(self.light.position.length() > 1e-3, "light.position", || {
            "light cannot sit at the origin".to_string()
        })?;
        let size = self.light.shadow.map_size;
        check(
            size.is_power_of_two() && (256..=8192).contains(&size),
            "light.shadow.map_size",
            || format!("{size} must be a power of two in 256..=8192"),
        )?;
        check_range(self.light.shadow.extent, 0.1, 1000.0, "light.shadow.extent")?;
        check(
            self.light.shadow.near > 0.0 && self.light.shadow.near < self.light.shadow.far,
            "light.shadow.near",
            || "near must be positive and below far".to_string(),
        )?;
        check_range(self.light.shadow.normal_bias, 0.0, 1.0, "light.shadow.normal_bias")?;
        check_range(self.renderer.exposure, 0.01, 100.0, "renderer.exposure")?;
        check_range(self.renderer.max_pixel_ratio, 1.0, 8.0, "renderer.max_pixel_ratio")?;
        let samples = self.renderer.msaa_samples;
        check(matches!(samples, 1 | 4), "renderer.msaa_samples", || {
            format!("{samples} must be 1 or 4")
        })?;
        Ok(())
    }

    pub fn from_yaml(text: &str) -> Result<Self, PresetError> {
        let settings: Self = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String, PresetError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load and validate a preset. Missing fields keep their defaults.
    pub fn load_preset(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PresetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&text)?;
        tracing::info!("loaded preset {}", path.display());
        Ok(settings)
    }

    pub fn save_preset(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        let text = self.to_yaml()?;
        std::fs::write(path, text).map_err(|source| PresetError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("saved preset {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SceneSettings::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = SceneSettings::from_yaml(
            "wobble:\n  strength: 0.8\ncolors:\n  color_b: \"#00ff00\"\n",
        )
        .unwrap();
        assert_eq!(settings.wobble.strength, 0.8);
        assert_eq!(settings.wobble.warp_strength, 1.7);
        assert_eq!(settings.colors.color_a, Rgb::new(0, 0, 255));
        assert_eq!(settings.colors.color_b, Rgb::new(0, 255, 0));
        assert_eq!(settings.light, LightSettings::default());
    }

    #[test]
    fn time_is_not_persisted() {
        let mut settings = SceneSettings::default();
        settings.wobble.time = 42.0;
        let yaml = settings.to_yaml().unwrap();
        assert!(!yaml.contains("time:"));
        assert!(yaml.contains("time_frequency"));
        let back = SceneSettings::from_yaml(&yaml).unwrap();
        assert_eq!(back.wobble.time, 0.0);
    }

    #[test]
    fn rejects_negative_strength() {
        let err = SceneSettings::from_yaml("wobble:\n  strength: -1.0\n").unwrap_err();
        assert!(matches!(err, PresetError::Invalid { field: "wobble", .. }));
    }

    #[test]
    fn rejects_bad_material_and_shadow_values() {
        let err = SceneSettings::from_yaml("material:\n  roughness: 3.0\n").unwrap_err();
        assert!(matches!(err, PresetError::Invalid { field: "material", .. }));
        let err = SceneSettings::from_yaml("light:\n  shadow:\n    map_size: 1000\n").unwrap_err();
        assert!(matches!(
            err,
            PresetError::Invalid {
                field: "light.shadow.map_size",
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_color() {
        let err = SceneSettings::from_yaml("colors:\n  color_a: \"blue\"\n").unwrap_err();
        assert!(matches!(err, PresetError::Yaml(_)));
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut settings = SceneSettings::default();
        settings.wobble.position_frequency = 1.1;
        settings.material.transmission = 0.6;
        settings.save_preset(tmp.path()).unwrap();

        let loaded = SceneSettings::load_preset(tmp.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_preset_reports_path() {
        let err = SceneSettings::load_preset("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn shadow_camera_sees_the_mesh() {
        let light = LightSettings::default();
        let vp = light.shadow_view_proj();
        // The mesh centre lands inside the light's clip volume.
        let clip = vp.project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
        // Points nearer the light have smaller depth.
        let near = vp.project_point3(light.direction() * 1.0);
        assert!(near.z < clip.z);
    }

    #[test]
    fn light_direction_points_at_light() {
        let light = LightSettings::default();
        assert!((light.direction().length() - 1.0).abs() < 1e-6);
        assert!(light.direction().dot(light.position) > 0.0);
        assert!((light.radiance() - Vec3::splat(3.0)).length() < 1e-5);
    }
}
