use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color code: {0:?}")]
    InvalidHex(String),
}

/// 8-bit RGB with a unit-range alpha, the way the canvas colours are stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

// Five task swatches followed by the light and dark backgrounds
pub const PALETTE: [&str; 7] = [
    "#FF595EFF",
    "#FFCA3AFF",
    "#8AC926FF",
    "#1982C4FF",
    "#6A4C93FF",
    "#F2EFEAFF",
    "#1E1C21FF",
];
pub const SWATCH_COUNT: usize = 5;
pub const LIGHT_BACKGROUND: usize = 5;
pub const DARK_BACKGROUND: usize = 6;

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        let a = if expanded.len() == 8 { channel(6)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: a as f32 / 255.0,
        })
    }

    /// Always `#RRGGBBAA`, upper case.
    pub fn to_hex(&self) -> String {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, alpha)
    }

    pub fn palette(index: usize) -> Color {
        // palette literals are well-formed; fall back to white for an out-of-range index
        PALETTE
            .get(index)
            .and_then(|hex| Color::from_hex(hex).ok())
            .unwrap_or(Color::WHITE)
    }

    pub fn swatches() -> impl Iterator<Item = Color> {
        (0..SWATCH_COUNT).map(Color::palette)
    }

    pub fn random_swatch<R: rand::Rng + ?Sized>(rng: &mut R) -> Color {
        Color::palette(rng.gen_range(0..SWATCH_COUNT))
    }

    pub fn brighter(&self, delta: i16) -> Self {
        let shift = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
        Self { r: shift(self.r), g: shift(self.g), b: shift(self.b), a: self.a }
    }

    pub fn reduce_saturation(&self, factor: f32) -> Self {
        let (r, g, b) = (self.r as f32, self.g as f32, self.b as f32);
        let gray = 0.3 * r + 0.59 * g + 0.11 * b;
        let mix = |c: f32| (c * (1.0 - factor) + gray * factor).round().clamp(0.0, 255.0) as u8;
        Self { r: mix(r), g: mix(g), b: mix(b), a: self.a }
    }

    /// Colour used for completed tasks: half alpha, mostly desaturated.
    pub fn disabled(&self) -> Self {
        let faded = Self { a: (self.a * 0.5).max(0.0), ..*self };
        faded.reduce_saturation(0.7)
    }

    pub fn to_hsl(&self) -> Hsl {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl { h: h / 6.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl, a: f32) -> Self {
        let Hsl { h, s, l } = hsl;
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Self { r: v, g: v, b: v, a };
        }
        fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 0.5 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            g: to_u8(hue_to_rgb(p, q, h)),
            b: to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
            a,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl From<Color> for egui::Color32 {
    fn from(c: Color) -> Self {
        let alpha = (c.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha)
    }
}
