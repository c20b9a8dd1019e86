use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors from parsing a `#rrggbb` color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

/// An 8-bit sRGB color, authored as `#rrggbb`.
///
/// Panels and presets work in sRGB; shaders receive [`Rgb::to_linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Self = Self([0xff, 0xff, 0xff]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Linear-light RGB in `[0, 1]`, using the sRGB transfer function.
    pub fn to_linear(self) -> Vec3 {
        let [r, g, b] = self.0;
        Vec3::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex() {
        let blue: Rgb = "#0000ff".parse().unwrap();
        assert_eq!(blue, Rgb::new(0, 0, 255));
        let mixed: Rgb = "#240BDA".parse().unwrap();
        assert_eq!(mixed, Rgb::new(0x24, 0x0b, 0xda));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(
            "0000ff".parse::<Rgb>(),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            "#00ff".parse::<Rgb>(),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            "#00ffzz".parse::<Rgb>(),
            Err(ColorParseError::BadDigit(_))
        ));
    }

    #[test]
    fn hex_display_is_lowercase() {
        assert_eq!(Rgb::new(255, 0, 16).to_string(), "#ff0010");
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Rgb::new(0, 0, 0).to_linear(), Vec3::ZERO);
        assert!((Rgb::WHITE.to_linear() - Vec3::ONE).length() < 1e-6);
        // Mid-grey in sRGB is much darker in linear light.
        let mid = Rgb::new(128, 128, 128).to_linear();
        assert!((mid.x - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgb::new(0, 0, 255)).unwrap();
        assert_eq!(json, "\"#0000ff\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(0, 0, 255));
        assert!(serde_json::from_str::<Rgb>("\"blue\"").is_err());
    }
}
