//! RGB color type and luminance helpers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseColorError;

/// Rec. 601 luma weights, used for thresholding and tone adjustment.
pub const REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// Rec. 709 luma weights, used to order extracted palettes.
pub const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Rec. 601 luminance of an RGB triple, in `[0, 255]`.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    REC601[0] * r + REC601[1] * g + REC601[2] * b
}

/// An opaque RGB color with 8-bit channels.
///
/// Serializes as a `#rrggbb` string so palettes read naturally in config
/// files.
///
/// # Example
///
/// ```
/// use dither_engine::Color;
///
/// let red: Color = "#f00".parse().unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// assert_eq!(red.to_string(), "#ff0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Pure black.
    pub const BLACK: Color = Color::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Create a color from 8-bit channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array.
    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as floats.
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Rec. 601 luminance.
    #[inline]
    pub fn luminance(self) -> f32 {
        luminance(self.r as f32, self.g as f32, self.b as f32)
    }

    /// Rec. 709 relative luminance, the sort key for extracted palettes.
    #[inline]
    pub fn relative_luminance(self) -> f32 {
        REC709[0] * self.r as f32 + REC709[1] * self.g as f32 + REC709[2] * self.b as f32
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (case-insensitive,
    /// surrounding whitespace trimmed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(ParseColorError::InvalidLength);
        }
        if !matches!(s.len(), 3 | 6) {
            return Err(ParseColorError::InvalidLength);
        }
        // from_str_radix would accept a leading '+'
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError::InvalidDigit);
        }

        match s.len() {
            3 => {
                // 0xF -> 0xFF
                let r = u8::from_str_radix(&s[0..1], 16)? * 17;
                let g = u8::from_str_radix(&s[1..2], 16)? * 17;
                let b = u8::from_str_radix(&s[2..3], 16)? * 17;
                Ok(Self::new(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16)?;
                let g = u8::from_str_radix(&s[2..4], 16)?;
                let b = u8::from_str_radix(&s[4..6], 16)?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl From<[u8; 3]> for Color {
    fn from(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing_6digit() {
        let c: Color = "#1a2B3c".parse().unwrap();
        assert_eq!(c, Color::new(0x1a, 0x2b, 0x3c));

        let c: Color = "  ffffff ".parse().unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_hex_parsing_shorthand() {
        let c: Color = "#0f8".parse().unwrap();
        assert_eq!(c, Color::new(0, 255, 136));
    }

    #[test]
    fn test_hex_parsing_errors() {
        assert_eq!(
            "#12345".parse::<Color>(),
            Err(ParseColorError::InvalidLength)
        );
        assert_eq!(
            "#gg0000".parse::<Color>(),
            Err(ParseColorError::InvalidDigit)
        );
        assert_eq!("#ÿÿ".parse::<Color>(), Err(ParseColorError::InvalidLength));
    }

    #[test]
    fn test_hex_parsing_rejects_signs() {
        assert_eq!("#+f+f+f".parse::<Color>(), Err(ParseColorError::InvalidDigit));
        assert_eq!("#+ff".parse::<Color>(), Err(ParseColorError::InvalidDigit));
        assert_eq!("-0f".parse::<Color>(), Err(ParseColorError::InvalidDigit));
        assert_eq!(
            "#0f0f0f".parse::<Color>(),
            Ok(Color::new(15, 15, 15))
        );
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        assert_eq!(Color::new(255, 0, 171).to_string(), "#ff00ab");
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Color::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str("\"#abc\"").unwrap();
        assert_eq!(back, Color::new(0xaa, 0xbb, 0xcc));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_luminance_weights() {
        assert!((Color::WHITE.luminance() - 255.0).abs() < 1e-3);
        assert!((Color::WHITE.relative_luminance() - 255.0).abs() < 1e-3);
        assert_eq!(Color::BLACK.luminance(), 0.0);
        // Green dominates both weightings
        assert!(Color::new(0, 255, 0).luminance() > Color::new(255, 0, 0).luminance());
    }
}
