use std::sync::Arc;

use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Vec2};
use crate::fx::text::ShapedText;
use crate::media::raster::RasterImage;
use crate::model::layers::{BlendMode, Selection};

#[derive(Clone, Debug)]
/// Backend-agnostic plan for one composited frame.
///
/// Layers are composited in order onto an initially transparent target. The compositor
/// always opens with an opaque black layer, so finished frames are opaque.
pub struct FramePlan {
    /// Target canvas metadata for this frame.
    pub canvas: Canvas,
    /// Back-to-front layer list.
    pub layers: Vec<Layer>,
    /// Interactive regions drawn this frame, in draw order.
    pub hits: Vec<HitRegion>,
}

impl FramePlan {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
            hits: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer) {
        if !layer.is_noop() {
            self.layers.push(layer);
        }
    }

    pub fn extend(&mut self, layers: impl IntoIterator<Item = Layer>) {
        for layer in layers {
            self.push(layer);
        }
    }

    /// Most recent region recorded for `target`.
    pub fn hit_for(&self, target: &Selection) -> Option<&HitRegion> {
        self.hits.iter().rev().find(|h| &h.target == target)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Screen-space bounding box of one interactive element.
pub struct HitRegion {
    /// What a press inside `rect` selects.
    pub target: Selection,
    /// Canvas-pixel bounds (pre-clip, pre-animation).
    pub rect: Rect,
}

#[derive(Clone, Debug)]
/// A group of draw ops rasterized together and composited as a unit.
pub struct Layer {
    /// How the rasterized group lands on the frame.
    pub attrs: LayerAttrs,
    /// Draw operations, in order.
    pub ops: Vec<DrawOp>,
}

impl Layer {
    pub fn new(ops: Vec<DrawOp>) -> Self {
        Self {
            attrs: LayerAttrs::default(),
            ops,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.attrs.opacity = opacity.clamp(0.0, 1.0) as f32;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.attrs.blend = blend;
        self
    }

    pub fn with_clip(mut self, clip: BezPath) -> Self {
        self.attrs.clip = Some(clip);
        self
    }

    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.attrs.shadow = Some(shadow);
        self
    }

    pub fn with_knockout(mut self, rect: Rect) -> Self {
        self.attrs.knockout = Some(rect);
        self
    }

    /// `true` when compositing this layer cannot change the frame.
    pub fn is_noop(&self) -> bool {
        (self.ops.is_empty() || self.attrs.opacity <= 0.0) && self.attrs.knockout.is_none()
    }
}

#[derive(Clone, Debug)]
/// Compositing attributes for a [`Layer`].
pub struct LayerAttrs {
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode against the frame so far.
    pub blend: BlendMode,
    /// Canvas-space clip path.
    pub clip: Option<BezPath>,
    /// Drop shadow composited beneath the layer.
    pub shadow: Option<Shadow>,
    /// Canvas-space rect reset to opaque black before the layer lands.
    pub knockout: Option<Rect>,
}

impl Default for LayerAttrs {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend: BlendMode::Normal,
            clip: None,
            shadow: None,
            knockout: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Blurred, offset copy of a layer's coverage.
pub struct Shadow {
    /// Tint; `None` glows in the layer's own colors.
    pub color: Option<Color>,
    /// Blur length in pixels (gaussian sigma is half of it).
    pub blur: f64,
    /// Canvas-space offset.
    pub offset: Vec2,
}

impl Shadow {
    pub fn tinted(color: Color, blur: f64, offset: Vec2) -> Self {
        Self {
            color: Some(color),
            blur,
            offset,
        }
    }

    pub fn glow(blur: f64) -> Self {
        Self {
            color: None,
            blur,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Fill source. Gradient geometry is in the op's local space.
pub enum Paint {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Point,
        radius: f64,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    /// Sample the stop list at `t` (stops sorted by offset).
    pub fn sample_stops(stops: &[GradientStop], t: f64) -> Color {
        let Some(first) = stops.first() else {
            return Color::TRANSPARENT;
        };
        if t <= first.offset {
            return first.color;
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let k = if span <= 0.0 { 1.0 } else { (t - a.offset) / span };
                return a.color.lerp(b.color, k);
            }
        }
        stops.last().map(|s| s.color).unwrap_or(Color::TRANSPARENT)
    }
}

#[derive(Clone, Debug)]
/// Draw operation inside a [`Layer`].
pub enum DrawOp {
    /// Fill vector geometry.
    Fill {
        /// Path geometry in local space.
        path: BezPath,
        /// Local-to-canvas transform.
        transform: Affine,
        /// Fill source.
        paint: Paint,
    },
    /// Draw a decoded image covering `(0, 0)..(w, h)` in local space.
    Image {
        image: Arc<RasterImage>,
        /// Local-to-canvas transform.
        transform: Affine,
    },
    /// Draw shaped text; local origin is the layout's top-left corner.
    Text {
        text: Arc<ShapedText>,
        /// Local-to-canvas transform.
        transform: Affine,
        paint: Paint,
        /// Outline width in pixels; fills when `None`.
        outline: Option<f64>,
    },
}

impl DrawOp {
    pub fn fill(path: BezPath, transform: Affine, paint: Paint) -> Self {
        Self::Fill {
            path,
            transform,
            paint,
        }
    }

    pub fn solid(path: BezPath, transform: Affine, color: Color) -> Self {
        Self::fill(path, transform, Paint::Solid(color))
    }
}

/// Convert a stroked outline (butt caps, miter joins) into fill geometry.
pub fn stroke_to_fill(path: &BezPath, width: f64, dashes: Option<[f64; 2]>) -> BezPath {
    let mut style = kurbo::Stroke::new(width.max(0.0))
        .with_caps(kurbo::Cap::Butt)
        .with_join(kurbo::Join::Miter);
    if let Some(d) = dashes {
        style = style.with_dashes(0.0, d);
    }
    kurbo::stroke(path.iter(), &style, &kurbo::StrokeOpts::default(), 0.1)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
