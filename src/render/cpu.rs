use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::compile::plan::{DrawOp, FramePlan, GradientStop, Layer, Paint, Shadow};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas, Rect};
use crate::foundation::error::{VjError, VjResult};
use crate::fx::text::{FontFace, ShapedText};
use crate::media::raster::RasterImage;
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::blur::{blur_params, blur_rgba8_premul};
use crate::render::composite::{
    alpha_plane, composite_over, knockout_rect, mask_alpha_in_place, outline_plane,
    premul_over_in_place, tint_coverage, translate_pixels,
};

const LINEAR_TEXTURE_LEN: u32 = 256;
const RADIAL_TEXTURE_SIZE: u32 = 64;
const MAX_GRADIENTS: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    radial: bool,
    stops: Vec<(u16, [u8; 4])>,
}

impl GradientKey {
    fn new(radial: bool, stops: &[GradientStop]) -> Self {
        Self {
            radial,
            stops: stops
                .iter()
                .map(|s| {
                    let off = (s.offset.clamp(0.0, 1.0) * 65535.0).round() as u16;
                    (off, s.color.to_rgba8_straight())
                })
                .collect(),
        }
    }
}

/// CPU rasterizer for [`FramePlan`]s.
///
/// Each layer is rasterized into its own premultiplied buffer by `vello_cpu`, then clipped,
/// shadowed and blended onto the frame with the kernels in [`crate::render::composite`].
#[derive(Default)]
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    images: HashMap<u64, vello_cpu::Image>,
    images_used: HashSet<u64>,
    fonts: HashMap<u64, vello_cpu::peniko::FontData>,
    gradients: HashMap<GradientKey, vello_cpu::Image>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of image textures kept from the last frame.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> VjResult<R>,
    ) -> VjResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx);
        self.ctx = Some(ctx);
        out
    }

    /// Run `draw` on a cleared context and read the result back as premultiplied bytes.
    fn raster_pass(
        &mut self,
        width: u16,
        height: u16,
        draw: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> VjResult<()>,
    ) -> VjResult<Vec<u8>> {
        self.with_ctx_mut(width, height, |this, ctx| {
            draw(this, ctx)?;
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap.data_as_u8_slice().to_vec())
        })
    }

    fn image_paint(&mut self, image: &RasterImage) -> VjResult<vello_cpu::Image> {
        self.images_used.insert(image.id);
        if let Some(p) = self.images.get(&image.id) {
            return Ok(p.clone());
        }
        let paint = image_from_premul(&image.rgba8_premul, image.width, image.height)?;
        self.images.insert(image.id, paint.clone());
        Ok(paint)
    }

    fn font_for(&mut self, face: &FontFace) -> vello_cpu::peniko::FontData {
        self.fonts
            .entry(face.id)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.data.as_ref().clone()),
                    face.index,
                )
            })
            .clone()
    }

    fn gradient_texture(&mut self, stops: &[GradientStop], radial: bool) -> VjResult<vello_cpu::Image> {
        let key = GradientKey::new(radial, stops);
        if let Some(img) = self.gradients.get(&key) {
            return Ok(img.clone());
        }
        let (w, h) = if radial {
            (RADIAL_TEXTURE_SIZE, RADIAL_TEXTURE_SIZE)
        } else {
            (LINEAR_TEXTURE_LEN, 1)
        };
        let mut bytes = Vec::with_capacity((w * h * 4) as usize);
        let half = f64::from(RADIAL_TEXTURE_SIZE) / 2.0;
        for y in 0..h {
            for x in 0..w {
                let t = if radial {
                    let dx = f64::from(x) + 0.5 - half;
                    let dy = f64::from(y) + 0.5 - half;
                    (dx * dx + dy * dy).sqrt() / half
                } else {
                    (f64::from(x) + 0.5) / f64::from(w)
                };
                let px = Paint::sample_stops(stops, t.min(1.0)).to_rgba8_premul();
                bytes.extend_from_slice(&px.to_array());
            }
        }
        let img = image_from_premul(&bytes, w, h)?;
        if self.gradients.len() >= MAX_GRADIENTS {
            self.gradients.clear();
        }
        self.gradients.insert(key, img.clone());
        Ok(img)
    }

    fn apply_paint(&mut self, ctx: &mut vello_cpu::RenderContext, paint: &Paint) -> VjResult<()> {
        match paint {
            Paint::Solid(c) => {
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(solid(*c));
            }
            Paint::Linear { start, end, stops } => {
                let d = *end - *start;
                let len = d.hypot();
                if len <= f64::EPSILON || stops.is_empty() {
                    let last = stops.last().map(|s| s.color).unwrap_or(Color::TRANSPARENT);
                    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                    ctx.set_paint(solid(last));
                    return Ok(());
                }
                let tex = self.gradient_texture(stops, false)?;
                let map = Affine::translate(start.to_vec2())
                    * Affine::rotate(d.y.atan2(d.x))
                    * Affine::scale_non_uniform(len / f64::from(LINEAR_TEXTURE_LEN), 1.0);
                ctx.set_paint_transform(affine_to_cpu(map));
                ctx.set_paint(tex);
            }
            Paint::Radial {
                center,
                radius,
                stops,
            } => {
                let tex = self.gradient_texture(stops, true)?;
                let r = radius.max(f64::EPSILON);
                let map = Affine::translate((center.x - r, center.y - r))
                    * Affine::scale(2.0 * r / f64::from(RADIAL_TEXTURE_SIZE));
                ctx.set_paint_transform(affine_to_cpu(map));
                ctx.set_paint(tex);
            }
        }
        Ok(())
    }

    fn fill_glyphs(&mut self, ctx: &mut vello_cpu::RenderContext, text: &ShapedText, face: &FontFace) {
        let font = self.font_for(face);
        let glyphs = text.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        });
        ctx.glyph_run(&font)
            .font_size(text.font_size)
            .fill_glyphs(glyphs);
    }

    fn draw_op(&mut self, ctx: &mut vello_cpu::RenderContext, op: &DrawOp) -> VjResult<()> {
        match op {
            DrawOp::Fill {
                path,
                transform,
                paint,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                self.apply_paint(ctx, paint)?;
                ctx.fill_path(&bezpath_to_cpu(path));
            }
            DrawOp::Image { image, transform } => {
                if image.is_empty() {
                    return Ok(());
                }
                let paint = self.image_paint(image)?;
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(image.width),
                    f64::from(image.height),
                ));
            }
            DrawOp::Text {
                text,
                transform,
                paint,
                ..
            } => {
                let Some(face) = &text.font else {
                    return Ok(());
                };
                ctx.set_transform(affine_to_cpu(*transform));
                self.apply_paint(ctx, paint)?;
                self.fill_glyphs(ctx, text, face);
            }
        }
        Ok(())
    }

    /// Text stroke approximated as the band between dilated and eroded glyph coverage.
    fn outlined_text(
        &mut self,
        width: u16,
        height: u16,
        text: &Arc<ShapedText>,
        transform: Affine,
        paint: &Paint,
        stroke: f64,
    ) -> VjResult<Option<Vec<u8>>> {
        let Some(face) = text.font.clone() else {
            return Ok(None);
        };
        let coverage = self.raster_pass(width, height, |this, ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(solid(Color::WHITE));
            this.fill_glyphs(ctx, text, &face);
            Ok(())
        })?;

        let scale = transform.determinant().abs().sqrt();
        let radius = (stroke * scale / 2.0).round().max(1.0) as u32;
        let ring = outline_plane(
            &alpha_plane(&coverage),
            u32::from(width),
            u32::from(height),
            radius,
        );

        let pad = stroke + f64::from(text.font_size) * 0.5;
        let bounds = Rect::new(0.0, 0.0, text.width, text.height).inflate(pad, pad);
        let mut fill = self.raster_pass(width, height, |this, ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            this.apply_paint(ctx, paint)?;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                bounds.x0, bounds.y0, bounds.x1, bounds.y1,
            ));
            Ok(())
        })?;
        mask_alpha_in_place(&mut fill, &ring)?;
        Ok(Some(fill))
    }

    fn raster_layer(&mut self, width: u16, height: u16, ops: &[DrawOp]) -> VjResult<Vec<u8>> {
        let mut out = vec![0u8; (width as usize) * (height as usize) * 4];
        let mut batch: Vec<&DrawOp> = Vec::new();
        for op in ops {
            match op {
                DrawOp::Text {
                    text,
                    transform,
                    paint,
                    outline: Some(stroke),
                } => {
                    self.flush_batch(width, height, &batch, &mut out)?;
                    batch.clear();
                    if let Some(ring) =
                        self.outlined_text(width, height, text, *transform, paint, *stroke)?
                    {
                        premul_over_in_place(&mut out, &ring)?;
                    }
                }
                _ => batch.push(op),
            }
        }
        self.flush_batch(width, height, &batch, &mut out)?;
        Ok(out)
    }

    fn flush_batch(
        &mut self,
        width: u16,
        height: u16,
        batch: &[&DrawOp],
        out: &mut [u8],
    ) -> VjResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let pass = self.raster_pass(width, height, |this, ctx| {
            for op in batch {
                this.draw_op(ctx, op)?;
            }
            Ok(())
        })?;
        premul_over_in_place(out, &pass)
    }

    fn clip_plane(&mut self, width: u16, height: u16, clip: &BezPath) -> VjResult<Vec<u8>> {
        let pass = self.raster_pass(width, height, |_, ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(solid(Color::WHITE));
            ctx.fill_path(&bezpath_to_cpu(clip));
            Ok(())
        })?;
        Ok(alpha_plane(&pass))
    }

    fn composite_layer(
        &mut self,
        dst: &mut [u8],
        width: u16,
        height: u16,
        layer: &Layer,
    ) -> VjResult<()> {
        let attrs = &layer.attrs;
        if let Some(rect) = attrs.knockout {
            knockout_rect(dst, u32::from(width), u32::from(height), rect);
        }
        if layer.ops.is_empty() || attrs.opacity <= 0.0 {
            return Ok(());
        }

        let mut src = self.raster_layer(width, height, &layer.ops)?;
        if let Some(clip) = &attrs.clip {
            let plane = self.clip_plane(width, height, clip)?;
            mask_alpha_in_place(&mut src, &plane)?;
        }
        if let Some(shadow) = &attrs.shadow {
            let cast = shadow_pixels(&src, u32::from(width), u32::from(height), shadow)?;
            composite_over(dst, &cast, attrs.opacity, attrs.blend)?;
        }
        composite_over(dst, &src, attrs.opacity, attrs.blend)
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(level = "debug", skip_all, fields(layers = plan.layers.len()))]
    fn render_plan(&mut self, plan: &FramePlan) -> VjResult<FrameRGBA> {
        let (width, height) = canvas_u16(plan.canvas)?;
        let mut frame = vec![0u8; (width as usize) * (height as usize) * 4];
        self.images_used.clear();
        for layer in &plan.layers {
            self.composite_layer(&mut frame, width, height, layer)?;
        }
        let used = std::mem::take(&mut self.images_used);
        self.images.retain(|id, _| used.contains(id));
        self.images_used = used;

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: frame,
            premultiplied: true,
        })
    }
}

fn canvas_u16(canvas: Canvas) -> VjResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| VjError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| VjError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn shadow_pixels(src: &[u8], width: u32, height: u32, shadow: &Shadow) -> VjResult<Vec<u8>> {
    let base = match shadow.color {
        Some(c) => tint_coverage(src, c.to_rgba8_premul().to_array()),
        None => src.to_vec(),
    };
    let (radius, sigma) = blur_params(shadow.blur);
    let blurred = blur_rgba8_premul(&base, width, height, radius, sigma)?;
    let (dx, dy) = (shadow.offset.x.round(), shadow.offset.y.round());
    if dx == 0.0 && dy == 0.0 {
        return Ok(blurred);
    }
    Ok(translate_pixels(&blurred, width, height, dx as i32, dy as i32))
}

fn solid(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8_straight();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_from_premul(bytes: &[u8], width: u32, height: u32) -> VjResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| VjError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| VjError::render("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(VjError::render("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
