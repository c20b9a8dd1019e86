use glam::{Vec2, Vec3};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::f32::consts::{PI, TAU};
use std::path::{Path, PathBuf};

/// The viewer resizes every environment to at most this size.
pub const DEFAULT_MAX_SIZE: (u32, u32) = (1024, 512);

/// Errors from loading an environment map.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("image {} has no pixels", path.display())]
    Empty { path: PathBuf },
}

/// Number of levels in a full mip chain down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Equirectangular texture coordinates for a world direction.
pub fn equirect_uv(direction: Vec3) -> Vec2 {
    let d = direction.normalize_or(Vec3::Z);
    let u = d.z.atan2(d.x) / TAU + 0.5;
    let v = 0.5 - d.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// An RGBA8 sRGB equirectangular image with its full mip chain.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    /// Level 0 first; each level halves both sides, never below 1.
    pub mips: Vec<RgbaImage>,
}

impl EnvironmentMap {
    /// Decode `path` and shrink it to fit within `max_size`.
    pub fn load(path: impl AsRef<Path>, max_size: (u32, u32)) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("load_environment", path = %path.display()).entered();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::Empty {
                path: path.to_path_buf(),
            });
        }

        let width = image.width().min(max_size.0.max(1));
        let height = image.height().min(max_size.1.max(1));
        let base = if (width, height) == image.dimensions() {
            image
        } else {
            tracing::debug!(
                "resizing environment {}x{} -> {width}x{height}",
                image.width(),
                image.height()
            );
            imageops::resize(&image, width, height, FilterType::Triangle)
        };
        let map = Self::from_image(base);
        tracing::info!(
            "environment {} loaded: {}x{}, {} mips",
            path.display(),
            map.width(),
            map.height(),
            map.mips.len()
        );
        Ok(map)
    }

    /// Load `path` if given, falling back to [`procedural`](Self::procedural)
    /// with a warning when it is missing or broken.
    pub fn load_or_procedural(path: Option<&Path>, max_size: (u32, u32)) -> Self {
        match path {
            Some(path) => Self::load(path, max_size).unwrap_or_else(|err| {
                tracing::warn!("{err}; using the procedural sky");
                Self::procedural()
            }),
            None => Self::procedural(),
        }
    }

    /// Wrap a level-0 image and build its mip chain.
    pub fn from_image(base: RgbaImage) -> Self {
        let levels = mip_level_count(base.width(), base.height());
        let mut mips = Vec::with_capacity(levels as usize);
        mips.push(base);
        for level in 1..levels {
            let prev = &mips[level as usize - 1];
            let w = (mips[0].width() >> level).max(1);
            let h = (mips[0].height() >> level).max(1);
            let next = imageops::resize(prev, w, h, FilterType::Triangle);
            mips.push(next);
        }
        Self { mips }
    }

    /// A studio-like gradient: bright zenith, warm horizon, dark floor.
    pub fn procedural() -> Self {
        const WIDTH: u32 = 256;
        const HEIGHT: u32 = 128;
        let zenith = Vec3::new(0.55, 0.68, 0.95);
        let horizon = Vec3::new(0.98, 0.93, 0.85);
        let ground = Vec3::new(0.12, 0.11, 0.10);

        let base = RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
            let v = (y as f32 + 0.5) / HEIGHT as f32;
            let u = (x as f32 + 0.5) / WIDTH as f32;
            let elevation = 0.5 - v;
            let sky = if elevation >= 0.0 {
                horizon.lerp(zenith, (elevation * 2.0).powf(0.6))
            } else {
                horizon.lerp(ground, (-elevation * 8.0).min(1.0))
            };
            // A soft key light so reflections have something to catch.
            let sun = (-((u - 0.3).powi(2) + (v - 0.3).powi(2)) * 400.0).exp();
            let color = (sky + Vec3::splat(sun)).min(Vec3::ONE);
            let [r, g, b] = (color * 255.0).round().to_array().map(|c| c as u8);
            Rgba([r, g, b, 255])
        });
        Self::from_image(base)
    }

    pub fn width(&self) -> u32 {
        self.mips.first().map_or(0, |m| m.width())
    }

    pub fn height(&self) -> u32 {
        self.mips.first().map_or(0, |m| m.height())
    }

    /// Nearest-texel sRGB color of level 0 in direction `direction`, as
    /// `[0, 1]` floats.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let Some(base) = self.mips.first() else {
            return Vec3::ZERO;
        };
        let uv = equirect_uv(direction);
        let x = ((uv.x.rem_euclid(1.0) * base.width() as f32) as u32).min(base.width() - 1);
        let y = ((uv.y.clamp(0.0, 1.0) * base.height() as f32) as u32).min(base.height() - 1);
        let Rgba([r, g, b, _]) = *base.get_pixel(x, y);
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Level-major RGBA8 bytes of the whole chain, as uploaded to the GPU.
    pub fn level_major_bytes(&self) -> Vec<u8> {
        let total = self.mips.iter().map(|m| m.as_raw().len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for mip in &self.mips {
            bytes.extend_from_slice(mip.as_raw());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(256, 128), 9);
        assert_eq!(mip_level_count(300, 7), 9);
    }

    #[test]
    fn uv_axes() {
        let up = equirect_uv(Vec3::Y);
        assert!(up.y.abs() < 1e-6);
        let down = equirect_uv(Vec3::NEG_Y);
        assert!((down.y - 1.0).abs() < 1e-6);
        let horizon = equirect_uv(Vec3::X);
        assert!((horizon - Vec2::new(0.5, 0.5)).length() < 1e-6);
        let behind = equirect_uv(Vec3::Z);
        assert!((behind.x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn procedural_chain_halves_to_one() {
        let map = EnvironmentMap::procedural();
        assert_eq!((map.width(), map.height()), (256, 128));
        assert_eq!(map.mips.len(), 9);
        for (level, mip) in map.mips.iter().enumerate() {
            assert_eq!(mip.width(), (256 >> level).max(1));
            assert_eq!(mip.height(), (128 >> level).max(1));
        }
        let bytes = map.level_major_bytes();
        let expected: usize = map.mips.iter().map(|m| (m.width() * m.height() * 4) as usize).sum();
        assert_eq!(bytes.len(), expected);
    }

    #[test]
    fn procedural_sky_is_brighter_above() {
        let map = EnvironmentMap::procedural();
        let sky = map.sample(Vec3::new(0.2, 0.9, 0.1));
        let floor = map.sample(Vec3::new(0.2, -0.9, 0.1));
        assert!(sky.element_sum() > floor.element_sum());
    }

    #[test]
    fn load_resizes_to_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.png");
        RgbaImage::from_pixel(64, 32, Rgba([10, 200, 30, 255]))
            .save(&path)
            .unwrap();

        let map = EnvironmentMap::load(&path, (16, 8)).unwrap();
        assert_eq!((map.width(), map.height()), (16, 8));
        assert_eq!(map.mips.len(), 5);
        let c = map.sample(Vec3::X);
        assert!((c - Vec3::new(10.0, 200.0, 30.0) / 255.0).length() < 0.02);

        let untouched = EnvironmentMap::load(&path, DEFAULT_MAX_SIZE).unwrap();
        assert_eq!((untouched.width(), untouched.height()), (64, 32));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EnvironmentMap::load("/no/such/env.hdr", DEFAULT_MAX_SIZE).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("/no/such/env.hdr"));
    }

    #[test]
    fn garbage_falls_back_to_procedural() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            EnvironmentMap::load(&path, DEFAULT_MAX_SIZE),
            Err(AssetError::Image(_))
        ));
        let map = EnvironmentMap::load_or_procedural(Some(&path), DEFAULT_MAX_SIZE);
        assert_eq!(map.width(), 256);
    }
}
