use std::f64::consts::PI;
use std::sync::Arc;

use kurbo::Shape;

use crate::compile::plan::{DrawOp, GradientStop, Layer, Paint, Shadow};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2};
use crate::fx::text::{ShapedText, TextEngine};
use crate::model::layers::{BlendMode, TextAnimation, TextLayer, TextStyleKind};

/// Upper bound on repeated copies (long shadow, echo, melt drips) per layer.
const MAX_COPIES: usize = 512;

/// Per-call inputs shared by every style.
pub struct StyleCtx<'a> {
    pub engine: &'a mut TextEngine,
    pub rng: &'a mut fastrand::Rng,
    pub time_ms: f64,
}

/// Local-to-canvas transform for a text layer's animation. Local `(0, 0)` is the text
/// center.
pub fn animation_transform(
    layer: &TextLayer,
    center: Point,
    time_ms: f64,
    rng: &mut fastrand::Rng,
) -> Affine {
    let speed = layer.animation_speed;
    match layer.animation {
        TextAnimation::None => Affine::translate(center.to_vec2()),
        TextAnimation::Pulse => {
            let s = 1.0 + (time_ms * 0.005 * speed).sin() * 0.1;
            Affine::translate(center.to_vec2()) * Affine::scale(s)
        }
        TextAnimation::Slide => {
            let dx = (time_ms * 0.002 * speed).sin() * 100.0;
            Affine::translate((center.x + dx, center.y))
        }
        TextAnimation::Wiggle => {
            let dx = (rng.f64() - 0.5) * 5.0 * speed;
            let dy = (rng.f64() - 0.5) * 5.0 * speed;
            Affine::translate((center.x + dx, center.y + dy))
        }
    }
}

/// Text op centered on local `offset`.
fn text_at(
    text: &Arc<ShapedText>,
    base: Affine,
    offset: Vec2,
    paint: Paint,
    outline: Option<f64>,
) -> DrawOp {
    let corner = Vec2::new(offset.x - text.width / 2.0, offset.y - text.height / 2.0);
    DrawOp::Text {
        text: Arc::clone(text),
        transform: base * Affine::translate(corner),
        paint,
        outline,
    }
}

/// Vertical gradient in the text box's local space spanning `-half..half` around the center.
fn vertical_gradient(text: &ShapedText, half: f64, stops: Vec<GradientStop>) -> Paint {
    let mid = text.height / 2.0;
    Paint::Linear {
        start: Point::new(0.0, mid - half),
        end: Point::new(0.0, mid + half),
        stops,
    }
}

fn copies(v: f64) -> usize {
    if v.is_finite() && v > 0.0 {
        (v.floor() as usize).min(MAX_COPIES)
    } else {
        0
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn clip_rect(base: Affine, rect: Rect) -> BezPath {
    base * rect.to_path(0.1)
}

/// Render one text layer with its style.
///
/// `base` maps the layer's local space (origin at the text center) to canvas pixels.
/// Every returned layer carries the text layer's opacity.
pub fn render_styled_text(layer: &TextLayer, base: Affine, ctx: &mut StyleCtx<'_>) -> Vec<Layer> {
    let text = ctx.engine.shape(&layer.content, &layer.font_family, layer.size);
    let primary = layer.color;
    let secondary = layer.style.color;
    let amount = finite(layer.style.amount);
    let offset = finite(layer.style.offset);
    let size = finite(layer.size).max(0.0);
    let opacity = layer.opacity / 100.0;
    let fill = |paint: Paint| text_at(&text, base, Vec2::ZERO, paint, None);

    let layers = match layer.style.kind {
        TextStyleKind::None => vec![Layer::new(vec![fill(Paint::Solid(primary))])],
        TextStyleKind::ShadowSoft => {
            let d = (offset - 50.0) * 0.4;
            vec![
                Layer::new(vec![fill(Paint::Solid(primary))]).with_shadow(Shadow::tinted(
                    secondary,
                    amount * 0.5,
                    Vec2::new(d, d),
                )),
            ]
        }
        TextStyleKind::ShadowHard => {
            let d = amount * 0.2;
            vec![
                Layer::new(vec![fill(Paint::Solid(primary))]).with_shadow(Shadow::tinted(
                    secondary,
                    0.0,
                    Vec2::new(d, d),
                )),
            ]
        }
        TextStyleKind::LongShadow => {
            let step = Vec2::new((offset - 50.0) * 0.05, (offset - 50.0).abs() * 0.05 + 0.5);
            let mut ops: Vec<DrawOp> = (1..=copies(amount))
                .rev()
                .map(|i| text_at(&text, base, step * i as f64, Paint::Solid(secondary), None))
                .collect();
            ops.push(fill(Paint::Solid(primary)));
            vec![Layer::new(ops)]
        }
        TextStyleKind::Lift => vec![
            Layer::new(vec![fill(Paint::Solid(primary))]).with_shadow(Shadow::tinted(
                Color::BLACK,
                amount * 0.3,
                Vec2::new(0.0, offset * 0.5),
            )),
        ],
        TextStyleKind::Hollow => vec![Layer::new(vec![text_at(
            &text,
            base,
            Vec2::ZERO,
            Paint::Solid(primary),
            Some((amount * 0.1).max(1.0)),
        )])],
        TextStyleKind::Splice => {
            let shift = amount * 0.2;
            vec![
                Layer::new(vec![text_at(
                    &text,
                    base,
                    Vec2::new(-shift, 0.0),
                    Paint::Solid(primary),
                    None,
                )])
                .with_clip(clip_rect(base, Rect::new(-1000.0, -1000.0, 1000.0, 0.0))),
                Layer::new(vec![text_at(
                    &text,
                    base,
                    Vec2::new(shift, 0.0),
                    Paint::Solid(secondary),
                    None,
                )])
                .with_clip(clip_rect(base, Rect::new(-1000.0, 0.0, 1000.0, 1000.0))),
            ]
        }
        TextStyleKind::Glitch => glitch(&text, base, primary, amount * 0.1, ctx.rng),
        TextStyleKind::Neon => {
            let glow = amount * 0.5;
            let inner = primary.lerp(Color::WHITE, offset / 100.0);
            let stroke = |blur: f64| {
                Layer::new(vec![text_at(
                    &text,
                    base,
                    Vec2::ZERO,
                    Paint::Solid(primary),
                    Some(1.0),
                )])
                .with_shadow(Shadow::tinted(secondary, blur, Vec2::ZERO))
            };
            vec![
                stroke(glow),
                stroke(glow * 2.0),
                Layer::new(vec![fill(Paint::Solid(inner))]).with_shadow(Shadow::tinted(
                    secondary,
                    glow * 3.0,
                    Vec2::ZERO,
                )),
            ]
        }
        TextStyleKind::Echo => {
            let count = copies(amount / 10.0 + 1.0);
            let dist = offset * 0.5;
            let mut ops: Vec<DrawOp> = (1..=count)
                .rev()
                .map(|i| {
                    text_at(
                        &text,
                        base,
                        Vec2::new(i as f64 * dist, 0.0),
                        Paint::Solid(secondary.mul_alpha(1.0 / i as f64)),
                        None,
                    )
                })
                .collect();
            ops.push(fill(Paint::Solid(primary)));
            vec![Layer::new(ops)]
        }
        TextStyleKind::Background => {
            let pad = amount * 0.5;
            let (w, h) = (text.width, size);
            let rect = Rect::new(-w / 2.0 - pad, -h / 2.0 - pad, w / 2.0 + pad, h / 2.0 + pad);
            vec![Layer::new(vec![
                DrawOp::solid(rect.abs().to_path(0.1), base, secondary),
                fill(Paint::Solid(primary)),
            ])]
        }
        TextStyleKind::Curve => curve(layer, base, amount, offset, primary, ctx.engine),
        TextStyleKind::Duotone => {
            let split = (amount / 100.0).clamp(0.0, 1.0);
            let paint = vertical_gradient(
                &text,
                size / 2.0,
                vec![
                    GradientStop::new(0.0, primary),
                    GradientStop::new(split, primary.lerp(secondary, 0.5)),
                    GradientStop::new(1.0, secondary),
                ],
            );
            vec![Layer::new(vec![fill(paint)])]
        }
        TextStyleKind::Melt => {
            let mut ops = vec![fill(Paint::Solid(primary))];
            ops.extend(melt_drips(&text, base, amount, size, ctx.time_ms, primary));
            vec![Layer::new(ops)]
        }
        TextStyleKind::Glossy => {
            let k = (amount / 50.0).max(0.0);
            let white = |a: f64| Color::WHITE.with_alpha(a).mul_alpha(k);
            let shine = vertical_gradient(
                &text,
                size,
                vec![
                    GradientStop::new(0.0, white(0.8)),
                    GradientStop::new(0.49, white(0.1)),
                    GradientStop::new(0.5, Color::BLACK.with_alpha(0.2).mul_alpha(k)),
                    GradientStop::new(1.0, Color::TRANSPARENT),
                ],
            );
            vec![Layer::new(vec![
                fill(Paint::Solid(primary)),
                fill(shine),
                text_at(&text, base, Vec2::ZERO, Paint::Solid(Color::WHITE), Some(1.0)),
            ])]
        }
    };

    layers
        .into_iter()
        .map(|l| {
            let o = f64::from(l.attrs.opacity) * opacity;
            l.with_opacity(o)
        })
        .collect()
}

fn glitch(
    text: &Arc<ShapedText>,
    base: Affine,
    primary: Color,
    shake: f64,
    rng: &mut fastrand::Rng,
) -> Vec<Layer> {
    let mut jitter = || Vec2::new((rng.f64() - 0.5) * shake, (rng.f64() - 0.5) * shake);
    let red = jitter();
    let blue = -jitter();
    let mut out = vec![
        Layer::new(vec![text_at(text, base, red, Paint::Solid(Color::rgb8(255, 0, 0)), None)])
            .with_blend(BlendMode::Screen),
        Layer::new(vec![text_at(text, base, blue, Paint::Solid(Color::rgb8(0, 0, 255)), None)])
            .with_blend(BlendMode::Screen),
        Layer::new(vec![text_at(text, base, Vec2::ZERO, Paint::Solid(primary), None)]),
    ];

    if rng.f64() > 0.8 {
        let h = 5.0 + rng.f64() * 20.0;
        let slice_y = -50.0 + rng.f64() * 100.0;
        let shift = (rng.f64() - 0.5) * 50.0;
        let slice = Rect::new(-500.0, slice_y, 500.0, slice_y + h);
        out.push(
            Layer::new(vec![text_at(
                text,
                base,
                Vec2::new(shift, 0.0),
                Paint::Solid(primary),
                None,
            )])
            .with_clip(clip_rect(base, slice))
            .with_knockout(base.transform_rect_bbox(slice)),
        );
    }
    out
}

fn curve(
    layer: &TextLayer,
    base: Affine,
    amount: f64,
    offset: f64,
    primary: Color,
    engine: &mut TextEngine,
) -> Vec<Layer> {
    let radius = 100.0 + amount * 5.0;
    let spacing = offset * 0.05;
    let chars: Vec<char> = layer.content.chars().collect();
    let total_arc = chars.len() as f64 * 0.1;
    let step = 0.1 + spacing * 0.01;

    let mut ops = Vec::with_capacity(chars.len());
    let mut buf = [0u8; 4];
    for (i, ch) in chars.iter().enumerate() {
        let glyph = engine.shape(ch.encode_utf8(&mut buf), &layer.font_family, layer.size);
        let angle = -total_arc / 2.0 + i as f64 * step;
        let around = base
            * Affine::translate((0.0, radius))
            * Affine::rotate(angle)
            * Affine::translate((0.0, -radius));
        ops.push(text_at(&glyph, around, Vec2::ZERO, Paint::Solid(primary), None));
    }
    vec![Layer::new(ops)]
}

fn melt_drips(
    text: &ShapedText,
    base: Affine,
    amount: f64,
    size: f64,
    time_ms: f64,
    color: Color,
) -> Vec<DrawOp> {
    let count = copies(amount / 5.0);
    let span = size * text.content.chars().count() as f64 * 0.3;
    let neck = (2.0 + amount * 0.05).max(0.0);
    let blob = (4.0 + amount * 0.05).max(0.0);

    (0..count)
        .map(|i| {
            let i = i as f64;
            let dx = (i * 132.1 + time_ms * 0.001).sin() * span;
            let len = (i * 54.3 + time_ms * 0.002).sin().abs() * size * 1.5;
            let mut path = kurbo::Arc::new((dx, 10.0), (neck, neck), 0.0, PI, 0.0).to_path(0.1);
            path.close_path();
            path.extend(Rect::new(dx - neck, 10.0, dx + neck, 10.0 + len).to_path(0.1));
            path.extend(kurbo::Circle::new((dx, 10.0 + len), blob).to_path(0.1));
            DrawOp::solid(path, base, color)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/fx/styles.rs"]
mod tests;
