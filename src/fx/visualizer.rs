use std::f64::consts::TAU;

use kurbo::Shape;

use crate::compile::plan::{DrawOp, Layer, Shadow, stroke_to_fill};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas, Rect};
use crate::model::layers::{VisualizerConfig, VisualizerKind};

pub const BAR_COUNT: usize = 40;
pub const RAY_COUNT: usize = 60;
/// Bins below this are dropped by the shimmer rendering.
pub const SHIMMER_FLOOR: u8 = 50;
/// Bins above this get a highlight dot.
pub const SHIMMER_PEAK: u8 = 200;

const SILENCE: [u8; 64] = [0; 64];

/// Geometry for one visualizer frame plus its aggregate bounds.
#[derive(Clone, Debug)]
pub struct VisualizerFrame {
    pub layers: Vec<Layer>,
    pub bounds: Rect,
}

fn base_color() -> Color {
    Color::rgb8(0x10, 0xb9, 0x81)
}

/// Sample `bins[i * step]`, treating out-of-range as silence.
fn sample(bins: &[u8], i: usize, step: usize) -> f64 {
    f64::from(bins.get(i * step).copied().unwrap_or(0))
}

/// Build the visualizer for `spectrum` (byte magnitudes, low bins first).
pub fn render_visualizer(
    cfg: &VisualizerConfig,
    spectrum: &[u8],
    canvas: Canvas,
    time_ms: f64,
) -> VisualizerFrame {
    let bins = if spectrum.is_empty() { &SILENCE[..] } else { spectrum };
    let (cw, ch) = (canvas.w(), canvas.h());
    let cx = cfg.x / 100.0 * cw;
    let cy = cfg.y / 100.0 * ch;
    let gain = cfg.gain / 50.0;
    let scale = cfg.scale / 50.0;
    let opacity = cfg.opacity / 100.0;
    let bar_w = cw / BAR_COUNT as f64;
    let step = bins.len() / BAR_COUNT;
    let fixed = base_color();

    let (layers, bounds) = match cfg.kind {
        VisualizerKind::Bars => {
            let total_w = BAR_COUNT as f64 * bar_w;
            let max_h = ch * 0.5 * gain * scale;
            let left = cx - total_w / 2.0;
            let mut ops = Vec::with_capacity(BAR_COUNT * 2);
            for i in 0..BAR_COUNT {
                let h = sample(bins, i, step) / 255.0 * max_h;
                let x = left + i as f64 * bar_w;
                let w = (bar_w - 2.0).max(0.0);
                let color = if cfg.rainbow {
                    Color::hsla(i as f64 * 8.0 + time_ms * 0.1, 0.7, 0.5, 1.0)
                } else {
                    fixed
                };
                ops.push(DrawOp::solid(
                    Rect::new(x, cy - h, x + w, cy).to_path(0.1),
                    Affine::IDENTITY,
                    color,
                ));
                ops.push(DrawOp::solid(
                    Rect::new(x, cy, x + w, cy + h * 0.4).to_path(0.1),
                    Affine::IDENTITY,
                    color.mul_alpha(0.3),
                ));
            }
            (
                vec![Layer::new(ops)],
                Rect::new(left, cy - max_h, left + total_w, cy),
            )
        }
        VisualizerKind::Circle => {
            let radius = cfg.scale * 2.0;
            let max_ext = 150.0 * gain;
            let reach = radius + max_ext;
            let step = bins.len() / RAY_COUNT;
            let mut ops = Vec::with_capacity(RAY_COUNT);
            for i in 0..RAY_COUNT {
                let angle = i as f64 / RAY_COUNT as f64 * TAU;
                let h = sample(bins, i, step) / 255.0 * max_ext;
                let (sin, cos) = angle.sin_cos();
                let mut ray = BezPath::new();
                ray.move_to((cx + cos * radius, cy + sin * radius));
                ray.line_to((cx + cos * (radius + h), cy + sin * (radius + h)));
                let color = if cfg.rainbow {
                    Color::hsla(i as f64 * 6.0 + time_ms * 0.2, 0.7, 0.5, 1.0)
                } else {
                    fixed
                };
                ops.push(DrawOp::solid(
                    stroke_to_fill(&ray, 4.0, None),
                    Affine::IDENTITY,
                    color,
                ));
            }
            (
                vec![Layer::new(ops)],
                Rect::new(cx - reach, cy - reach, cx + reach, cy + reach),
            )
        }
        VisualizerKind::Wave => {
            let slice = cw / bins.len() as f64;
            let top = cy - ch / 4.0;
            let mut line = BezPath::new();
            for (i, &v) in bins.iter().enumerate() {
                let y = f64::from(v) / 128.0 * ch / 4.0 * gain + top;
                let x = i as f64 * slice;
                if i == 0 {
                    line.move_to((x, y));
                } else {
                    line.line_to((x, y));
                }
            }
            let color = if cfg.rainbow {
                Color::hsla(time_ms * 0.1, 0.7, 0.5, 1.0)
            } else {
                fixed
            };
            (
                vec![Layer::new(vec![DrawOp::solid(
                    stroke_to_fill(&line, 2.0, None),
                    Affine::IDENTITY,
                    color,
                )])],
                Rect::new(0.0, top, cw, cy + ch / 4.0),
            )
        }
        VisualizerKind::Shimmer => {
            let pitch = bar_w * 1.5;
            let total_w = BAR_COUNT as f64 * pitch;
            let left = cx - total_w / 2.0;
            let mut pills = Vec::new();
            let mut dots = Vec::new();
            for i in 0..BAR_COUNT {
                let value = bins.get(i * step).copied().unwrap_or(0);
                if value < SHIMMER_FLOOR {
                    continue;
                }
                let norm = f64::from(value) / 255.0;
                let h = norm * ch * 0.8 * gain * scale;
                let x = left + i as f64 * pitch;
                let hue = if cfg.rainbow {
                    (i as f64 * 10.0 + time_ms * 0.2) % 360.0
                } else {
                    180.0
                };
                let pill = kurbo::RoundedRect::new(x, cy - h, x + bar_w, cy, bar_w / 2.0);
                pills.push(DrawOp::solid(
                    pill.to_path(0.1),
                    Affine::IDENTITY,
                    Color::hsla(hue, 0.8, 0.7, norm),
                ));
                if value > SHIMMER_PEAK {
                    dots.push(DrawOp::solid(
                        kurbo::Circle::new((x + bar_w / 2.0, cy - h - 5.0), 2.0).to_path(0.1),
                        Affine::IDENTITY,
                        Color::WHITE,
                    ));
                }
            }
            (
                vec![
                    Layer::new(pills).with_shadow(Shadow::glow(15.0)),
                    Layer::new(dots),
                ],
                Rect::new(left, cy - ch * 0.8 * gain, left + total_w, cy),
            )
        }
    };

    VisualizerFrame {
        layers: layers
            .into_iter()
            .map(|l| l.with_opacity(opacity))
            .collect(),
        bounds,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/visualizer.rs"]
mod tests;
