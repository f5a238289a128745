use crate::foundation::error::{VjError, VjResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Absolute 0-based index of a rendered or captured frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> VjResult<Self> {
        if den == 0 {
            return Err(VjError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(VjError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_duration_ms(self) -> f64 {
        self.frame_duration_secs() * 1000.0
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Full HD, the default output size.
    pub const FHD: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    pub fn new(width: u32, height: u32) -> VjResult<Self> {
        if width == 0 || height == 0 {
            return Err(VjError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn w(self) -> f64 {
        f64::from(self.width)
    }

    pub fn h(self) -> f64 {
        f64::from(self.height)
    }

    pub fn center(self) -> Point {
        Point::new(self.w() / 2.0, self.h() / 2.0)
    }
}

/// Parse a resolution label such as `"1920x1080 (FHD)"`.
///
/// Only the leading `WxH` token is read. Labels that do not start with two positive integers
/// separated by `x` fall back to [`Canvas::FHD`].
pub fn parse_resolution(label: &str) -> Canvas {
    let token = label.split_whitespace().next().unwrap_or("");
    let mut parts = token.split(['x', 'X']);
    let w = parts.next().and_then(|s| s.parse::<u32>().ok());
    let h = parts.next().and_then(|s| s.parse::<u32>().ok());
    match (w, h, parts.next()) {
        (Some(w), Some(h), None) if w > 0 && h > 0 => Canvas {
            width: w,
            height: h,
        },
        _ => Canvas::FHD,
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Opaque black, the frame clear color.
    pub fn black() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
