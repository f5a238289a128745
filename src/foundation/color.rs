use crate::foundation::core::Rgba8Premul;
use crate::foundation::math::{lerp, unit_to_u8};
use serde::{Deserialize, Serialize};

/// Straight-alpha color with normalized `0..1` channels.
///
/// Serialized as a hex string (`#rrggbb` or `#rrggbbaa`), which is how layer and particle
/// colors are stored in session snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 1.0)
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            a,
        )
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (case-insensitive, `#` optional).
    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(format!("invalid hex color \"{s}\""));
        }

        fn hex_byte(pair: &str) -> Result<u8, String> {
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
        }

        let (r, g, b, a) = match s.len() {
            3 => {
                let r = hex_byte(&s[0..1].repeat(2))?;
                let g = hex_byte(&s[1..2].repeat(2))?;
                let b = hex_byte(&s[2..3].repeat(2))?;
                (r, g, b, 255)
            }
            6 => (
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                255,
            ),
            8 => (
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            ),
            _ => return Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
        };
        Ok(Self::rgba8(r, g, b, f64::from(a) / 255.0))
    }

    /// Parse with a fallback for user-entered values.
    pub fn parse_or(s: &str, fallback: Color) -> Self {
        Self::parse_hex(s).unwrap_or(fallback)
    }

    /// HSL(A) with hue in degrees and saturation/lightness in `0..1`.
    pub fn hsla(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 || !h.is_finite() {
            return Self::rgba(l, l, l, a);
        }

        fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 1.0 / 2.0 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }

        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;
        Self::rgba(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
            a,
        )
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn mul_alpha(self, k: f64) -> Self {
        Self {
            a: (self.a * k).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn lerp(self, other: Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::rgba(
            lerp(self.r, other.r, t),
            lerp(self.g, other.g, t),
            lerp(self.b, other.b, t),
            lerp(self.a, other.a, t),
        )
    }

    pub fn to_rgba8_straight(self) -> [u8; 4] {
        [
            unit_to_u8(self.r),
            unit_to_u8(self.g),
            unit_to_u8(self.b),
            unit_to_u8(self.a),
        ]
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let a = self.a.clamp(0.0, 1.0);
        Rgba8Premul {
            r: unit_to_u8(self.r.clamp(0.0, 1.0) * a),
            g: unit_to_u8(self.g.clamp(0.0, 1.0) * a),
            b: unit_to_u8(self.b.clamp(0.0, 1.0) * a),
            a: unit_to_u8(a),
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8_straight();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Color::parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Color::rgba(r, g, b, a)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
