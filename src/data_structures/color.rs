//! sRGB colours as they are authored in the scene.
//!
//! Colours are written either as a numeric hex literal (`0xff0000`) or as a
//! CSS-style string (`"#ff00ff"`). The surface is sRGB, so shaders work with
//! linear values and [`Color::to_linear`] is applied before upload.

use std::str::FromStr;

use anyhow::{Context, bail};

/// An opaque sRGB colour with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(&self) -> u32 {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (to_u8(self.r) << 16) | (to_u8(self.g) << 8) | to_u8(self.b)
    }

    /// Converts the sRGB channels to linear space.
    pub fn to_linear(&self) -> [f32; 3] {
        let f = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [f(self.r), f(self.g), f(self.b)]
    }

    /// Linear rgb scaled by `intensity`, used for light colours.
    pub fn to_linear_scaled(&self, intensity: f32) -> [f32; 3] {
        self.to_linear().map(|c| c * intensity)
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    /// Parses `#rrggbb` and the `#rgb` shorthand.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.trim().strip_prefix('#') {
            Some(digits) => digits,
            None => bail!("colour {:?} must start with '#'", s),
        };
        let expanded: String = match digits.len() {
            6 => digits.to_string(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            n => bail!("colour {:?} has {} hex digits, expected 3 or 6", s, n),
        };
        let hex = u32::from_str_radix(&expanded, 16)
            .with_context(|| format!("colour {:?} is not valid hex", s))?;
        Ok(Self::from_hex(hex))
    }
}

impl TryFrom<&str> for Color {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_forms_agree() {
        let numeric = Color::from_hex(0xff00ff);
        let parsed: Color = "#ff00ff".parse().unwrap();
        assert_eq!(numeric, parsed);
        assert_eq!(parsed.to_hex(), 0xff00ff);
    }

    #[test]
    fn shorthand_expands_each_digit() {
        let short: Color = "#0fa".parse().unwrap();
        assert_eq!(short.to_hex(), 0x00ffaa);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("ff00ff".parse::<Color>().is_err());
        assert!("#ff00f".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn linear_conversion_keeps_the_endpoints() {
        assert_eq!(Color::from_hex(0x000000).to_linear(), [0.0, 0.0, 0.0]);
        let white = Color::WHITE.to_linear();
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
        // mid grey is darker in linear space
        let grey = Color::from_hex(0xbbbbbb).to_linear();
        assert!(grey[0] < 0xbb as f32 / 255.0);
    }
}
