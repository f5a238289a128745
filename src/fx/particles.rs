use std::f64::consts::PI;

use kurbo::Shape;

use crate::compile::plan::{DrawOp, GradientStop, Layer, Paint, Shadow, stroke_to_fill};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect};
use crate::model::layers::{ParticleConfig, ParticleKind};

/// Steps are tuned for a 60 Hz tick.
pub const REFERENCE_TICK_MS: f64 = 1000.0 / 60.0;

/// Recycle margin outside the canvas, in pixels.
const MARGIN: f64 = 50.0;

const PARTY_COLORS: [&str; 6] = [
    "#ef4444", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#ec4899",
];
const AUTUMN_COLORS: [&str; 5] = ["#d97706", "#b45309", "#78350f", "#f59e0b", "#dc2626"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Depth in `0.2..1.0`; scales size, speed and wind.
    pub z: f64,
    pub speed: f64,
    pub size: f64,
    pub vx: f64,
    pub angle: f64,
    pub rotation_speed: f64,
    /// Fixed per-particle color (party, autumn); otherwise the configured color applies.
    pub color: Option<Color>,
}

impl Particle {
    fn spawn(kind: ParticleKind, w: f64, h: f64, rng: &mut fastrand::Rng) -> Self {
        let z = rng.f64() * 0.8 + 0.2;
        let pick = |palette: &[&str], rng: &mut fastrand::Rng| {
            Color::parse_or(palette[rng.usize(..palette.len())], Color::WHITE)
        };
        let color = match kind {
            ParticleKind::Party => Some(pick(&PARTY_COLORS, rng)),
            ParticleKind::Autumn => Some(pick(&AUTUMN_COLORS, rng)),
            _ => None,
        };
        Self {
            x: rng.f64() * w,
            y: rng.f64() * h,
            z,
            speed: (rng.f64() * 5.0 + 5.0) * z,
            size: (rng.f64() * 5.0 + 2.0) * z,
            vx: (rng.f64() * 2.0 - 1.0) * z,
            angle: rng.f64() * PI * 2.0,
            rotation_speed: (rng.f64() - 0.5) * 0.1,
            color,
        }
    }

    fn advance(&mut self, kind: ParticleKind, cfg: &ParticleConfig, dt: f64) {
        let sm = cfg.speed * dt;
        let wind = cfg.wind * self.z;
        self.angle += self.rotation_speed * sm;

        match kind {
            ParticleKind::Rain => {
                self.y += self.speed * 4.0 * sm;
                self.x += (self.vx + wind * 2.0) * sm;
            }
            ParticleKind::Snow => {
                self.y += self.speed * 0.5 * sm;
                self.x += ((self.y * 0.05).sin() + wind * 0.5) * sm;
            }
            ParticleKind::Mist => {
                self.x += (self.vx + wind) * 0.5 * sm;
                self.y += self.vx * 0.2 * sm;
            }
            ParticleKind::Sakura | ParticleKind::Autumn | ParticleKind::Party => {
                self.y += self.speed * 0.5 * sm;
                self.x += ((self.y * 0.02 + self.angle).sin() + wind) * sm;
            }
            ParticleKind::Bubble => {
                self.y -= self.speed * sm;
                self.x += ((self.y * 0.1).sin() + wind) * 0.5 * sm;
            }
            _ => {
                self.y -= self.speed * 0.5 * sm;
                self.x += (self.vx + wind) * sm;
            }
        }
    }

    fn is_out(&self, w: f64, h: f64, wind: f64) -> bool {
        !self.x.is_finite()
            || !self.y.is_finite()
            || self.y > h + MARGIN
            || self.y < -MARGIN
            || (wind > 0.0 && self.x > w + MARGIN)
            || (wind < 0.0 && self.x < -MARGIN)
    }
}

/// Fixed-size particle pool for the active effect.
#[derive(Debug)]
pub struct ParticleSim {
    kind: Option<ParticleKind>,
    canvas: Option<Canvas>,
    particles: Vec<Particle>,
    rng: fastrand::Rng,
}

impl ParticleSim {
    pub fn new(seed: u64) -> Self {
        Self {
            kind: None,
            canvas: None,
            particles: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn kind(&self) -> Option<ParticleKind> {
        self.kind
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Rebuild the pool when the effect, density or canvas changed.
    pub fn sync(&mut self, cfg: &ParticleConfig, canvas: Canvas) {
        // The reducer rejects larger densities; snapshots loaded from disk are clamped here.
        let target = cfg.density.min(ParticleConfig::MAX_DENSITY);
        let Some(kind) = cfg.effect else {
            self.kind = None;
            self.particles.clear();
            return;
        };
        if self.kind == Some(kind) && self.canvas == Some(canvas) && self.particles.len() == target
        {
            return;
        }

        let (w, h) = (canvas.w(), canvas.h());
        self.particles.clear();
        self.particles.reserve(target);
        for _ in 0..target {
            self.particles.push(Particle::spawn(kind, w, h, &mut self.rng));
        }
        self.kind = Some(kind);
        self.canvas = Some(canvas);
        tracing::debug!(?kind, count = target, "particle pool regenerated");
    }

    /// Advance every particle by `dt` reference ticks and recycle the ones that left.
    pub fn step(&mut self, cfg: &ParticleConfig, dt: f64) {
        let (Some(kind), Some(canvas)) = (self.kind, self.canvas) else {
            return;
        };
        let (w, h) = (canvas.w(), canvas.h());
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        for p in &mut self.particles {
            p.advance(kind, cfg, dt);
            if !p.is_out(w, h, cfg.wind) {
                continue;
            }
            *p = Particle::spawn(kind, w, h, &mut self.rng);
            if matches!(kind, ParticleKind::Rain | ParticleKind::Snow) {
                if cfg.wind > 2.0 {
                    p.x = self.rng.f64() * w - w * 0.5;
                } else if cfg.wind < -2.0 {
                    p.x = self.rng.f64() * w + w * 0.5;
                }
            }
        }
    }

    /// Draw the pool as one layer at the configured opacity.
    ///
    /// `bass` in `0..1` enlarges particles when audio reaction is on.
    pub fn draw(&self, cfg: &ParticleConfig, bass: f64) -> Option<Layer> {
        let kind = self.kind?;
        if self.particles.is_empty() {
            return None;
        }
        let react = if cfg.audio_react {
            1.0 + 0.5 * bass.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let scale_base = cfg.size * react;

        let mut ops = Vec::with_capacity(self.particles.len() * 2);
        for p in &self.particles {
            let at = Affine::translate((p.x, p.y)) * Affine::scale(scale_base * p.z);
            let color = p.color.unwrap_or(cfg.color);
            shape_ops(kind, p, at, color, cfg, &mut ops);
        }

        let mut layer = Layer::new(ops).with_opacity(cfg.opacity / 100.0);
        match kind {
            ParticleKind::Firefly => {
                layer = layer.with_shadow(Shadow::tinted(
                    Color::parse_or("#facc15", Color::WHITE),
                    10.0,
                    Default::default(),
                ));
            }
            ParticleKind::Ember => layer = layer.with_shadow(Shadow::glow(8.0)),
            _ => {}
        }
        Some(layer)
    }
}

fn hex(s: &str) -> Color {
    Color::parse_or(s, Color::WHITE)
}

fn circle(cx: f64, cy: f64, r: f64) -> BezPath {
    kurbo::Circle::new((cx, cy), r.max(0.0)).to_path(0.1)
}

fn radial(r: f64, inner: Color, outer: Color) -> Paint {
    Paint::Radial {
        center: Point::ORIGIN,
        radius: r.max(0.0),
        stops: vec![GradientStop::new(0.0, inner), GradientStop::new(1.0, outer)],
    }
}

fn shape_ops(
    kind: ParticleKind,
    p: &Particle,
    at: Affine,
    color: Color,
    cfg: &ParticleConfig,
    ops: &mut Vec<DrawOp>,
) {
    let s = p.size;
    if kind == ParticleKind::Rain {
        let tilt = PI / 2.0 - (p.speed * 4.0).atan2(cfg.wind * 2.0);
        let mut streak = BezPath::new();
        streak.move_to((0.0, 0.0));
        streak.line_to((0.0, p.speed * 3.0));
        let tint = if color == Color::WHITE {
            Color::rgba8(174, 194, 224, 0.8)
        } else {
            color
        };
        ops.push(DrawOp::solid(
            stroke_to_fill(&streak, 1.5, None),
            at * Affine::rotate(tilt),
            tint.mul_alpha(p.z * 0.6),
        ));
        return;
    }

    let at = at * Affine::rotate(p.angle);
    match kind {
        ParticleKind::Rain => {}
        ParticleKind::Snow => {
            let white = Color::WHITE;
            ops.push(DrawOp::fill(
                circle(0.0, 0.0, s / 2.0),
                at,
                radial(s / 2.0, white.with_alpha(0.9), white.with_alpha(0.0)),
            ));
        }
        ParticleKind::Sakura => {
            let petal = kurbo::Ellipse::new(Point::ORIGIN, (s, s / 2.0), 0.0).to_path(0.1);
            let core = kurbo::Ellipse::new(Point::ORIGIN, (s * 0.5, s * 0.2), 0.0).to_path(0.1);
            ops.push(DrawOp::solid(petal, at, hex("#fbcfe8")));
            ops.push(DrawOp::solid(core, at, hex("#fce7f3")));
        }
        ParticleKind::Autumn => {
            let mut leaf = BezPath::new();
            leaf.move_to((0.0, -s));
            leaf.quad_to((s, 0.0), (0.0, s));
            leaf.quad_to((-s, 0.0), (0.0, -s));
            leaf.close_path();
            ops.push(DrawOp::solid(stroke_to_fill(&leaf, 1.0, None), at, color));
            ops.push(DrawOp::solid(leaf, at, color));
        }
        ParticleKind::Orbs => ops.push(DrawOp::fill(
            circle(0.0, 0.0, s * 2.0),
            at,
            radial(s * 2.0, cfg.color, Color::TRANSPARENT),
        )),
        ParticleKind::Hex => {
            let mut hexagon = BezPath::new();
            for i in 0..6 {
                let a = f64::from(i) * PI / 3.0;
                let pt = (s * a.cos(), s * a.sin());
                if i == 0 {
                    hexagon.move_to(pt);
                } else {
                    hexagon.line_to(pt);
                }
            }
            hexagon.close_path();
            ops.push(DrawOp::solid(stroke_to_fill(&hexagon, 2.0, None), at, color));
            ops.push(DrawOp::solid(hexagon, at, color.mul_alpha(0.3)));
        }
        ParticleKind::Firefly => {
            ops.push(DrawOp::solid(circle(0.0, 0.0, s / 2.0), at, hex("#fef08a")));
        }
        ParticleKind::Star => {
            let mut star = BezPath::new();
            for i in 0..5 {
                let outer = (18.0 + f64::from(i) * 72.0).to_radians();
                let inner = (54.0 + f64::from(i) * 72.0).to_radians();
                let o = (outer.cos() * s, -outer.sin() * s);
                if i == 0 {
                    star.move_to(o);
                } else {
                    star.line_to(o);
                }
                star.line_to((inner.cos() * s / 2.0, -inner.sin() * s / 2.0));
            }
            star.close_path();
            ops.push(DrawOp::solid(star, at, hex("#facc15")));
        }
        ParticleKind::Bubble => {
            ops.push(DrawOp::solid(
                stroke_to_fill(&circle(0.0, 0.0, s), 2.0, None),
                at,
                hex("#a5b4fc"),
            ));
            ops.push(DrawOp::solid(
                circle(-s * 0.3, -s * 0.3, s * 0.2),
                at,
                Color::WHITE.with_alpha(0.5),
            ));
        }
        ParticleKind::Party => ops.push(DrawOp::solid(
            Rect::new(-s, -s / 2.0, s, s / 2.0).to_path(0.1),
            at,
            color,
        )),
        ParticleKind::Notes => ops.push(DrawOp::solid(eighth_note(s), at, hex("#c084fc"))),
        ParticleKind::Mist => ops.push(DrawOp::fill(
            circle(0.0, 0.0, s * 10.0),
            at,
            radial(
                s * 10.0,
                Color::rgba8(200, 200, 200, 0.1),
                Color::TRANSPARENT,
            ),
        )),
        ParticleKind::Dust => ops.push(DrawOp::solid(
            Rect::new(-s / 2.0, -s / 2.0, s / 2.0, s / 2.0).to_path(0.1),
            at,
            color,
        )),
        ParticleKind::Ember => ops.push(DrawOp::fill(
            circle(0.0, 0.0, s),
            at,
            Paint::Radial {
                center: Point::ORIGIN,
                radius: s.max(0.0),
                stops: vec![
                    GradientStop::new(0.0, hex("#fde68a")),
                    GradientStop::new(0.4, hex("#f97316")),
                    GradientStop::new(1.0, Color::TRANSPARENT),
                ],
            },
        )),
    }
}

/// Note head, stem and flag, roughly the size of a `2s` pixel glyph.
fn eighth_note(s: f64) -> BezPath {
    let mut path = kurbo::Ellipse::new((0.0, 0.0), (s * 0.6, s * 0.42), -0.35).to_path(0.1);
    path.extend(Rect::new(s * 0.45, -s * 2.0, s * 0.62, 0.0).to_path(0.1));
    let mut flag = BezPath::new();
    flag.move_to((s * 0.62, -s * 2.0));
    flag.quad_to((s * 1.4, -s * 1.5), (s * 1.1, -s * 0.8));
    flag.quad_to((s * 1.15, -s * 1.35), (s * 0.62, -s * 1.5));
    flag.close_path();
    path.extend(flag);
    path
}

#[cfg(test)]
#[path = "../../tests/unit/fx/particles.rs"]
mod tests;
