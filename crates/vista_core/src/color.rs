//! Linear RGBA color

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// RGBA color with components in `0.0..=1.0`.
///
/// Serialized as a `#rrggbbaa` string.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    // Channels below are exact multiples of 1/255 so they survive hex round trips
    pub const RED: Self = Self::rgb(0.901_960_8, 0.2, 0.2);
    pub const GREEN: Self = Self::rgb(0.2, 0.8, 0.301_960_8);
    pub const BLUE: Self = Self::rgb(0.2, 0.4, 0.901_960_8);
    pub const DARK_GREY: Self = Self::rgb(0.101_960_786, 0.101_960_786, 0.101_960_786);

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels, e.g. `Color::from_rgb8(0x1e, 0x1e, 0x1e)`
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Same color with alpha multiplied by `opacity`
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim().trim_start_matches('#');
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(CoreError::InvalidColor(hex.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CoreError::InvalidColor(hex.to_string()))
        };

        let mut color = Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?);
        if digits.len() == 8 {
            color.a = channel(6)? as f32 / 255.0;
        }
        Ok(color)
    }

    /// Format as `#rrggbbaa`
    pub fn to_hex(self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

impl TryFrom<String> for Color {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl FromStr for Color {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_is_clamped() {
        let c = Color::WHITE.with_opacity(2.0);
        assert_eq!(c.a, 1.0);
        let c = Color::rgba(1.0, 1.0, 1.0, 0.5).with_opacity(0.5);
        assert!((c.a - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_from_rgb8() {
        let c = Color::from_rgb8(255, 0, 51);
        assert_eq!(c.to_array(), [1.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_hex_parsing() {
        let c: Color = "#ff0033".parse().unwrap();
        assert_eq!(c.to_array(), [1.0, 0.0, 0.2, 1.0]);

        let c = Color::from_hex("00000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);

        assert_eq!(Color::from_hex("#1a1a1a").unwrap().to_hex(), "#1a1a1aff");
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(
            Color::from_hex("#12345"),
            Err(CoreError::InvalidColor("#12345".into()))
        );
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_constants_survive_hex_round_trip() {
        for color in [Color::RED, Color::GREEN, Color::BLUE, Color::DARK_GREY, Color::TRANSPARENT] {
            assert_eq!(Color::from_hex(&color.to_hex()).unwrap(), color);
        }
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Color::from_rgb8(0x1a, 0x1a, 0x1a)).unwrap();
        assert_eq!(json, "\"#1a1a1aff\"");

        let back: Color = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(back, Color::rgb(1.0, 0.0, 0.0));

        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
