use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Saturation used for generated colors, in percent
pub const GENERATED_SATURATION: u8 = 70;
/// Lightness used for generated colors, in percent
pub const GENERATED_LIGHTNESS: u8 = 50;

/// Color of the segment a fresh snake starts with (`#4CAF50`)
pub const INITIAL_SNAKE_COLOR: Color = Color::Rgb {
    r: 0x4C,
    g: 0xAF,
    b: 0x50,
};

/// Color of a snake segment or a piece of food
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Rgb { r: u8, g: u8, b: u8 },
    /// Hue in degrees, saturation and lightness in percent
    Hsl {
        hue: u16,
        saturation: u8,
        lightness: u8,
    },
}

impl Color {
    /// A random bright color: random hue with fixed saturation and lightness
    pub fn random_bright<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Color::Hsl {
            hue: rng.gen_range(0..360),
            saturation: GENERATED_SATURATION,
            lightness: GENERATED_LIGHTNESS,
        }
    }

    /// Convert to 8-bit RGB components
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        match *self {
            Color::Rgb { r, g, b } => (r, g, b),
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => hsl_to_rgb(hue, saturation, lightness),
        }
    }
}

fn hsl_to_rgb(hue: u16, saturation: u8, lightness: u8) -> (u8, u8, u8) {
    let h = f64::from(hue % 360);
    let s = f64::from(saturation.min(100)) / 100.0;
    let l = f64::from(lightness.min(100)) / 100.0;

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let sector = h / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = l - chroma / 2.0;

    let (r, g, b) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({}, {}%, {}%)", hue, saturation, lightness),
        }
    }
}
