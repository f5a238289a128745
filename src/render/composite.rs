//! Premultiplied RGBA8 pixel kernels used between raster passes.

use crate::foundation::error::{VjError, VjResult};
use crate::foundation::math::mul_div255_u8;
use crate::model::layers::BlendMode;

fn check_pair(dst: &[u8], src: &[u8], what: &str) -> VjResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VjError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

pub fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> VjResult<()> {
    check_pair(dst, src, "premul_over_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            d[c] = s[c].saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

fn premul_over_in_place_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    if op == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            d[c] = sc.saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
}

/// Source-over with a blend function and a global opacity.
pub fn composite_over(dst: &mut [u8], src: &[u8], opacity: f32, blend: BlendMode) -> VjResult<()> {
    check_pair(dst, src, "composite_over")?;

    // Dispatch once per layer; each arm monomorphizes its own kernel.
    match blend {
        BlendMode::Normal => premul_over_in_place_opacity(dst, src, opacity),
        BlendMode::Multiply => blend_kernel(dst, src, opacity, sep(|s, d| s * d)),
        BlendMode::Screen => blend_kernel(dst, src, opacity, sep(|s, d| s + d - s * d)),
        BlendMode::Overlay => blend_kernel(dst, src, opacity, sep(|s, d| hard_light(d, s))),
        BlendMode::Darken => blend_kernel(dst, src, opacity, sep(f32::min)),
        BlendMode::Lighten => blend_kernel(dst, src, opacity, sep(f32::max)),
        BlendMode::ColorDodge => blend_kernel(
            dst,
            src,
            opacity,
            sep(|s, d| {
                if d <= 0.0 {
                    0.0
                } else if s >= 1.0 {
                    1.0
                } else {
                    (d / (1.0 - s)).min(1.0)
                }
            }),
        ),
        BlendMode::ColorBurn => blend_kernel(
            dst,
            src,
            opacity,
            sep(|s, d| {
                if d >= 1.0 {
                    1.0
                } else if s <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - d) / s).min(1.0)
                }
            }),
        ),
        BlendMode::HardLight => blend_kernel(dst, src, opacity, sep(hard_light)),
        BlendMode::SoftLight => blend_kernel(
            dst,
            src,
            opacity,
            sep(|s, d| {
                if s <= 0.5 {
                    d - (1.0 - 2.0 * s) * d * (1.0 - d)
                } else {
                    let g = if d <= 0.25 {
                        ((16.0 * d - 12.0) * d + 4.0) * d
                    } else {
                        d.sqrt()
                    };
                    d + (2.0 * s - 1.0) * (g - d)
                }
            }),
        ),
        BlendMode::Difference => blend_kernel(dst, src, opacity, sep(|s, d| (d - s).abs())),
        BlendMode::Exclusion => blend_kernel(dst, src, opacity, sep(|s, d| d + s - 2.0 * d * s)),
        BlendMode::Hue => blend_kernel(dst, src, opacity, |s, d| {
            set_lum(set_sat(s, sat(d)), lum(d))
        }),
        BlendMode::Saturation => blend_kernel(dst, src, opacity, |s, d| {
            set_lum(set_sat(d, sat(s)), lum(d))
        }),
        BlendMode::Color => blend_kernel(dst, src, opacity, |s, d| set_lum(s, lum(d))),
        BlendMode::Luminosity => blend_kernel(dst, src, opacity, |s, d| set_lum(d, lum(s))),
    }
    Ok(())
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn sep(f: impl Fn(f32, f32) -> f32) -> impl Fn([f32; 3], [f32; 3]) -> [f32; 3] {
    move |s, d| [f(s[0], d[0]), f(s[1], d[1]), f(s[2], d[2])]
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [lo, mid, hi] = idx;
    let mut out = [0.0f32; 3];
    if c[hi] > c[lo] {
        out[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        out[hi] = s;
    }
    out
}

#[inline(always)]
fn blend_kernel<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn([f32; 3], [f32; 3]) -> [f32; 3],
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = f32::from(s[3]) / 255.0 * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        let sp = [0, 1, 2].map(|c| f32::from(s[c]) / 255.0 * opacity);
        let dp = [0, 1, 2].map(|c| f32::from(d[c]) / 255.0);
        let sc = sp.map(|v| (v / sa).clamp(0.0, 1.0));
        let dc = if da > 0.0 {
            dp.map(|v| (v / da).clamp(0.0, 1.0))
        } else {
            [0.0; 3]
        };
        let b = blend_fn(sc, dc).map(|v| v.clamp(0.0, 1.0));

        for c in 0..3 {
            let out = sp[c] * (1.0 - da) + dp[c] * (1.0 - sa) + b[c] * sa * da;
            d[c] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        d[3] = ((sa + da * (1.0 - sa)).clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}

/// Scale every pixel of `src` by the matching entry of a per-pixel alpha plane.
pub fn mask_alpha_in_place(src: &mut [u8], alpha: &[u8]) -> VjResult<()> {
    if src.len() != alpha.len() * 4 {
        return Err(VjError::render("mask plane size mismatch"));
    }
    for (px, &w) in src.chunks_exact_mut(4).zip(alpha) {
        if w == 255 {
            continue;
        }
        let w16 = u16::from(w);
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w16);
        }
    }
    Ok(())
}

/// Alpha channel of an RGBA8 buffer as a plane.
pub fn alpha_plane(src: &[u8]) -> Vec<u8> {
    src.chunks_exact(4).map(|px| px[3]).collect()
}

/// Replace color with `tint` (premultiplied) while keeping the coverage of `src`.
pub fn tint_coverage(src: &[u8], tint: [u8; 4]) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    for (d, s) in out.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        for c in 0..4 {
            d[c] = mul_div255_u8(u16::from(tint[c]), a);
        }
    }
    out
}

/// Shift pixels by whole-pixel offsets; uncovered area becomes transparent.
pub fn translate_pixels(src: &[u8], width: u32, height: u32, dx: i32, dy: i32) -> Vec<u8> {
    let (w, h) = (width as i32, height as i32);
    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let si = ((sy * w + sx) as usize) * 4;
            let di = ((y * w + x) as usize) * 4;
            out[di..di + 4].copy_from_slice(&src[si..si + 4]);
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Morph {
    Dilate,
    Erode,
}

/// Square-window min/max filter over an alpha plane, done as two 1D passes.
pub fn morph_alpha(plane: &[u8], width: u32, height: u32, radius: u32, op: Morph) -> Vec<u8> {
    if radius == 0 {
        return plane.to_vec();
    }
    let (w, h, r) = (width as usize, height as usize, radius as usize);
    let pick = |a: u8, b: u8| match op {
        Morph::Dilate => a.max(b),
        Morph::Erode => a.min(b),
    };
    let init = match op {
        Morph::Dilate => 0u8,
        Morph::Erode => 255u8,
    };

    let mut tmp = vec![0u8; plane.len()];
    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            tmp[y * w + x] = plane[y * w + lo..=y * w + hi].iter().fold(init, |m, &v| pick(m, v));
        }
    }
    let mut out = vec![0u8; plane.len()];
    for y in 0..h {
        let lo = y.saturating_sub(r);
        let hi = (y + r).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (lo..=hi).fold(init, |m, yy| pick(m, tmp[yy * w + x]));
        }
    }
    out
}

/// Band of width ~`2 * radius` around the edge of the coverage in `plane`.
pub fn outline_plane(plane: &[u8], width: u32, height: u32, radius: u32) -> Vec<u8> {
    let grown = morph_alpha(plane, width, height, radius, Morph::Dilate);
    let shrunk = morph_alpha(plane, width, height, radius, Morph::Erode);
    grown
        .iter()
        .zip(&shrunk)
        .map(|(&g, &s)| g.saturating_sub(s))
        .collect()
}

/// Paint an opaque black rectangle, clipped to the buffer.
pub fn knockout_rect(dst: &mut [u8], width: u32, height: u32, rect: kurbo::Rect) {
    let x0 = rect.x0.max(0.0).floor() as u32;
    let y0 = rect.y0.max(0.0).floor() as u32;
    let x1 = (rect.x1.ceil().max(0.0) as u32).min(width);
    let y1 = (rect.y1.ceil().max(0.0) as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let i = ((y as usize) * (width as usize) + (x as usize)) * 4;
            dst[i..i + 4].copy_from_slice(&[0, 0, 0, 255]);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
