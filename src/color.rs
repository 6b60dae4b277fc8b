//! Deterministic per-user colors
//!
//! A sender name hashes to a hue; saturation and lightness are fixed so
//! every name stays legible. Two clients showing the same name agree on
//! its color without coordinating.

use serde::{Serialize, Serializer};

/// Fixed saturation, percent
pub const SATURATION: u8 = 70;

/// Fixed lightness, percent
pub const LIGHTNESS: u8 = 45;

/// Color in hue/saturation/lightness space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Hue in degrees, `0..360`
    pub hue: u16,
    /// Saturation, percent
    pub saturation: u8,
    /// Lightness, percent
    pub lightness: u8,
}

impl Color {
    /// Convert to 8-bit RGB for terminals that take truecolor escapes
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = f64::from(self.hue % 360);
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = h / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

        (channel(r), channel(g), channel(b))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hash a sender name into its display color
///
/// Rolling `hash * 31 + unit` over UTF-16 code units with signed 32-bit
/// wraparound, hue = `|hash| mod 360`.
pub fn color_for(sender: &str) -> Color {
    let hash = sender
        .encode_utf16()
        .fold(0i32, |acc, unit| i32::from(unit).wrapping_add(acc.wrapping_mul(31)));

    Color {
        hue: (hash.unsigned_abs() % 360) as u16,
        saturation: SATURATION,
        lightness: LIGHTNESS,
    }
}
