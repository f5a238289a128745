use std::sync::Arc;

use kurbo::Shape;

use crate::animation::ease::Ease;
use crate::audio::analyzer::bass_level;
use crate::compile::plan::{DrawOp, FramePlan, HitRegion, Layer, Paint, stroke_to_fill};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas, Rect};
use crate::fx::particles::ParticleSim;
use crate::fx::styles::{StyleCtx, animation_transform, render_styled_text};
use crate::fx::text::TextEngine;
use crate::fx::visualizer::render_visualizer;
use crate::media::rack::FrameSource;
use crate::media::raster::RasterImage;
use crate::model::layers::{CropShape, OverlayLayer, Selection};
use crate::model::state::{BackgroundDeck, MixerState};

const SELECTION_COLOR: &str = "#fbbf24";
const LABEL_FAMILY: &str = "monospace";
const LABEL_SIZE: f64 = 10.0;

/// Everything one frame reads besides media.
pub struct FrameInput<'a> {
    pub state: &'a MixerState,
    /// Byte magnitudes from the analyzer; may be empty.
    pub spectrum: &'a [u8],
    /// Frame time in milliseconds, drives animated styles and rainbow hues.
    pub time_ms: f64,
    pub canvas: Canvas,
    /// Particle advance in reference ticks; zero while stopped.
    pub particle_dt: f64,
}

/// Builds a [`FramePlan`] from a state snapshot in fixed stage order.
pub struct Compositor {
    text: TextEngine,
    particles: ParticleSim,
    rng: fastrand::Rng,
    ease: Ease,
}

impl Compositor {
    pub fn new(text: TextEngine, seed: u64) -> Self {
        Self {
            text,
            particles: ParticleSim::new(seed),
            rng: fastrand::Rng::with_seed(seed.wrapping_add(1)),
            ease: Ease::InOutSine,
        }
    }

    pub fn particles(&self) -> &ParticleSim {
        &self.particles
    }

    #[tracing::instrument(level = "trace", skip_all, fields(t = input.time_ms))]
    pub fn compose(&mut self, input: &FrameInput<'_>, frames: &mut dyn FrameSource) -> FramePlan {
        let state = input.state;
        let canvas = input.canvas;
        let mut plan = FramePlan::new(canvas);

        plan.push(Layer::new(vec![DrawOp::solid(
            Rect::new(0.0, 0.0, canvas.w(), canvas.h()).to_path(0.1),
            Affine::IDENTITY,
            Color::BLACK,
        )]));

        self.background(&state.background, canvas, frames, &mut plan);

        for layer in state.overlays.iter().filter(|l| l.visible) {
            overlay(layer, canvas, frames, &mut plan);
        }

        self.particles.sync(&state.particles, canvas);
        self.particles.step(&state.particles, input.particle_dt);
        if let Some(layer) = self
            .particles
            .draw(&state.particles, bass_level(input.spectrum))
        {
            plan.push(layer);
        }

        if state.visualizer.enabled {
            let vis = render_visualizer(&state.visualizer, input.spectrum, canvas, input.time_ms);
            plan.extend(vis.layers);
            plan.hits.push(HitRegion {
                target: Selection::Visualizer,
                rect: vis.bounds,
            });
        }

        self.texts(state, input, &mut plan);
        watermark(state, canvas, frames, &mut plan);

        if !state.capturing && !state.selection.is_none() {
            self.selection_box(&state.selection, &mut plan);
        }
        plan
    }

    fn background(
        &mut self,
        bg: &BackgroundDeck,
        canvas: Canvas,
        frames: &mut dyn FrameSource,
        plan: &mut FramePlan,
    ) {
        if bg.playlist.current_item().is_none() {
            return;
        }
        if let Some(img) = frames.background_frame(bg.active) {
            plan.push(Layer::new(vec![fitted(bg, &img, canvas)]));
        }
        let Some(progress) = bg.transition.progress() else {
            return;
        };
        if !bg.seamless || bg.playlist.next_item().is_none() {
            return;
        }
        if let Some(img) = frames.background_frame(bg.standby()) {
            plan.push(Layer::new(vec![fitted(bg, &img, canvas)]).with_opacity(self.ease.apply(progress)));
        }
    }

    fn texts(&mut self, state: &MixerState, input: &FrameInput<'_>, plan: &mut FramePlan) {
        let (cw, ch) = (input.canvas.w(), input.canvas.h());
        for layer in state.texts.iter().filter(|l| l.visible && !l.content.is_empty()) {
            let x = layer.x / 100.0 * cw;
            let y = layer.y / 100.0 * ch;
            let measured = self.text.shape(&layer.content, &layer.font_family, layer.size);
            let w = measured.width;
            let h = layer.size;
            plan.hits.push(HitRegion {
                target: Selection::Text(layer.id.clone()),
                rect: Rect::new(x - w / 2.0, y - h / 2.0, x + w / 2.0, y + h / 2.0),
            });

            let base = animation_transform(layer, (x, y).into(), input.time_ms, &mut self.rng);
            let mut ctx = StyleCtx {
                engine: &mut self.text,
                rng: &mut self.rng,
                time_ms: input.time_ms,
            };
            plan.extend(render_styled_text(layer, base, &mut ctx));
        }
    }

    fn selection_box(&mut self, selection: &Selection, plan: &mut FramePlan) {
        let Some(rect) = plan.hit_for(selection).map(|h| h.rect) else {
            return;
        };
        let color = Color::parse_or(SELECTION_COLOR, Color::WHITE);
        let outline = rect.inflate(5.0, 5.0).to_path(0.1);
        let dashed = stroke_to_fill(&outline, 2.0, Some([5.0, 5.0]));

        let label = self.text.shape(selection.label(), LABEL_FAMILY, LABEL_SIZE);
        let ascent = label
            .glyphs
            .first()
            .map(|g| f64::from(g.y))
            .unwrap_or(LABEL_SIZE * 0.8);
        let label_at = Affine::translate((rect.x0, rect.y0 - 10.0 - ascent));

        plan.push(Layer::new(vec![
            DrawOp::solid(dashed, Affine::IDENTITY, color),
            DrawOp::Text {
                text: label,
                transform: label_at,
                paint: Paint::Solid(color),
                outline: None,
            },
        ]));
    }
}

/// Background image placed with fit mode plus the user pan/zoom around canvas center.
fn fitted(bg: &BackgroundDeck, img: &Arc<RasterImage>, canvas: Canvas) -> DrawOp {
    let (iw, ih) = (f64::from(img.width), f64::from(img.height));
    let fit = bg.fit.scale(iw, ih, canvas.w(), canvas.h());
    let transform = Affine::translate((canvas.w() / 2.0 + bg.offset_x, canvas.h() / 2.0 + bg.offset_y))
        * Affine::scale(bg.scale)
        * Affine::translate((-iw * fit / 2.0, -ih * fit / 2.0))
        * Affine::scale(fit);
    DrawOp::Image {
        image: Arc::clone(img),
        transform,
    }
}

/// Crop mask in the overlay's centered local space, sized from the shorter side.
pub fn crop_path(shape: CropShape, iw: f64, ih: f64) -> Option<BezPath> {
    let s = iw.min(ih);
    let rect = |hw: f64, hh: f64| Some(Rect::new(-hw, -hh, hw, hh).to_path(0.1));
    match shape {
        CropShape::Original => None,
        CropShape::Square => rect(s / 2.0, s / 2.0),
        CropShape::Circle => Some(kurbo::Circle::new((0.0, 0.0), s / 2.0).to_path(0.1)),
        CropShape::Portrait3x4 => rect(s * 0.375, s / 2.0),
        CropShape::Landscape4x3 => rect(s / 2.0, s * 0.375),
        CropShape::Portrait9x16 => rect(s * 0.28, s / 2.0),
        CropShape::Landscape16x9 => rect(s / 2.0, s * 0.28),
    }
}

fn overlay(layer: &OverlayLayer, canvas: Canvas, frames: &mut dyn FrameSource, plan: &mut FramePlan) {
    let Some(img) = frames.overlay_frame(layer) else {
        return;
    };
    let (iw, ih) = (f64::from(img.width), f64::from(img.height));
    if iw <= 0.0 || ih <= 0.0 {
        return;
    }
    let x = canvas.w() / 2.0 + layer.x;
    let y = canvas.h() / 2.0 + layer.y;
    let local = Affine::translate((x, y)) * Affine::scale(layer.scale);

    let mut out = Layer::new(vec![DrawOp::Image {
        image: img,
        transform: local * Affine::translate((-iw / 2.0, -ih / 2.0)),
    }])
    .with_blend(layer.blend)
    .with_opacity(layer.opacity / 100.0);
    if let Some(clip) = crop_path(layer.crop, iw, ih) {
        out = out.with_clip(local * clip);
    }
    plan.push(out);

    let (sw, sh) = (iw * layer.scale, ih * layer.scale);
    plan.hits.push(HitRegion {
        target: Selection::Overlay(layer.id.clone()),
        rect: Rect::new(x - sw / 2.0, y - sh / 2.0, x + sw / 2.0, y + sh / 2.0),
    });
}

fn watermark(state: &MixerState, canvas: Canvas, frames: &mut dyn FrameSource, plan: &mut FramePlan) {
    let wm = &state.watermark;
    let Some(source) = wm.source.as_deref() else {
        return;
    };
    let Some(img) = frames.still(source) else {
        return;
    };
    let (iw, ih) = (f64::from(img.width), f64::from(img.height));
    if iw <= 0.0 || ih <= 0.0 {
        return;
    }
    let lx = wm.x / 100.0 * canvas.w();
    let ly = wm.y / 100.0 * canvas.h();
    let base = canvas.w() * 0.2 * wm.size;
    let ratio = iw / ih;
    let lw = base * ratio.min(1.0);
    let lh = base / ratio.max(1.0);

    plan.push(
        Layer::new(vec![DrawOp::Image {
            image: img,
            transform: Affine::translate((lx - lw / 2.0, ly - lh / 2.0))
                * Affine::scale_non_uniform(lw / iw, lh / ih),
        }])
        .with_opacity(wm.opacity),
    );
    plan.hits.push(HitRegion {
        target: Selection::Watermark,
        rect: Rect::new(lx - lw / 2.0, ly - lh / 2.0, lx + lw / 2.0, ly + lh / 2.0),
    });
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compositor.rs"]
mod tests;
