use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{VjError, VjResult};
use crate::media::raster::RasterImage;

const MAX_DIM: u32 = 16_384;

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> VjResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    RasterImage::new(width, height, rgba8_premul)
}

/// Parse and rasterize SVG bytes at their intrinsic size.
///
/// `resvg` already produces premultiplied pixels.
pub fn rasterize_svg(bytes: &[u8]) -> VjResult<RasterImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    fn to_px(v: f32) -> VjResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(VjError::media("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(VjError::media(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| VjError::media("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    RasterImage::new(width, height, pixmap.data().to_vec())
}

/// Read an image file, dispatching on extension (`.svg` vs. raster formats).
pub fn load_image_file(path: &Path) -> VjResult<RasterImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image file '{}'", path.display()))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        rasterize_svg(&bytes)
    } else {
        decode_image(&bytes)
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;
