use crate::foundation::color::Color;
use crate::model::playlist::MediaKind;

/// Pixel-combination function used when compositing an overlay onto the frame so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    #[serde(rename = "source-over")]
    Normal,
    Screen,
    Multiply,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const ALL: [BlendMode; 16] = [
        Self::Normal,
        Self::Screen,
        Self::Multiply,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];
}

/// Clip shape applied to an overlay, sized from the media's shorter side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CropShape {
    #[default]
    Original,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    Circle,
}

/// An image or video composited above the background.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayLayer {
    pub id: String,
    pub kind: MediaKind,
    pub source: String,
    pub name: String,
    pub visible: bool,
    pub blend: BlendMode,
    /// 0..100.
    pub opacity: f64,
    pub scale: f64,
    /// Pixel offset from the canvas center.
    pub x: f64,
    pub y: f64,
    pub crop: CropShape,
    /// Playback rate, videos only.
    pub speed: f64,
}

impl OverlayLayer {
    pub fn new(id: String, kind: MediaKind, source: String, name: String) -> Self {
        Self {
            id,
            kind,
            source,
            name,
            visible: true,
            blend: BlendMode::Normal,
            opacity: 100.0,
            scale: 1.0,
            x: 0.0,
            y: 0.0,
            crop: CropShape::Original,
            speed: 1.0,
        }
    }
}

/// Partial update of an [`OverlayLayer`]; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayPatch {
    pub visible: Option<bool>,
    pub blend: Option<BlendMode>,
    pub opacity: Option<f64>,
    pub scale: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub crop: Option<CropShape>,
    pub speed: Option<f64>,
}

impl OverlayPatch {
    pub(crate) fn apply_to(&self, layer: &mut OverlayLayer) {
        if let Some(v) = self.visible {
            layer.visible = v;
        }
        if let Some(v) = self.blend {
            layer.blend = v;
        }
        if let Some(v) = self.opacity {
            layer.opacity = v;
        }
        if let Some(v) = self.scale {
            layer.scale = v;
        }
        if let Some(v) = self.x {
            layer.x = v;
        }
        if let Some(v) = self.y {
            layer.y = v;
        }
        if let Some(v) = self.crop {
            layer.crop = v;
        }
        if let Some(v) = self.speed {
            layer.speed = v;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TextAnimation {
    #[default]
    None,
    Pulse,
    Slide,
    Wiggle,
}

/// One of the fifteen text rendering algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TextStyleKind {
    #[default]
    None,
    #[serde(rename = "Shadow Soft")]
    ShadowSoft,
    #[serde(rename = "Shadow Hard")]
    ShadowHard,
    #[serde(rename = "Long Shadow")]
    LongShadow,
    Lift,
    Hollow,
    Splice,
    Glitch,
    Neon,
    Echo,
    Background,
    Curve,
    Duotone,
    Melt,
    Glossy,
}

impl TextStyleKind {
    pub const ALL: [TextStyleKind; 15] = [
        Self::None,
        Self::ShadowSoft,
        Self::ShadowHard,
        Self::LongShadow,
        Self::Lift,
        Self::Hollow,
        Self::Splice,
        Self::Glitch,
        Self::Neon,
        Self::Echo,
        Self::Background,
        Self::Curve,
        Self::Duotone,
        Self::Melt,
        Self::Glossy,
    ];
}

/// Style descriptor: kind, secondary color, and two style-dependent parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    pub kind: TextStyleKind,
    pub color: Color,
    pub amount: f64,
    pub offset: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            kind: TextStyleKind::None,
            color: Color::BLACK,
            amount: 50.0,
            offset: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub id: String,
    pub visible: bool,
    pub content: String,
    pub font_family: String,
    pub color: Color,
    pub animation: TextAnimation,
    pub animation_speed: f64,
    /// Font size in pixels.
    pub size: f64,
    /// 0..100.
    pub opacity: f64,
    /// Percent of canvas width.
    pub x: f64,
    /// Percent of canvas height.
    pub y: f64,
    pub style: TextStyle,
}

impl TextLayer {
    pub fn new(id: String, content: impl Into<String>, size: f64) -> Self {
        Self {
            id,
            visible: true,
            content: content.into(),
            font_family: "Impact".to_owned(),
            color: Color::WHITE,
            animation: TextAnimation::None,
            animation_speed: 1.0,
            size,
            opacity: 100.0,
            x: 50.0,
            y: 50.0,
            style: TextStyle::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextPatch {
    pub visible: Option<bool>,
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub color: Option<Color>,
    pub animation: Option<TextAnimation>,
    pub animation_speed: Option<f64>,
    pub size: Option<f64>,
    pub opacity: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub style: Option<TextStyle>,
}

impl TextPatch {
    pub(crate) fn apply_to(&self, layer: &mut TextLayer) {
        if let Some(v) = self.visible {
            layer.visible = v;
        }
        if let Some(v) = &self.content {
            layer.content.clone_from(v);
        }
        if let Some(v) = &self.font_family {
            layer.font_family.clone_from(v);
        }
        if let Some(v) = self.color {
            layer.color = v;
        }
        if let Some(v) = self.animation {
            layer.animation = v;
        }
        if let Some(v) = self.animation_speed {
            layer.animation_speed = v;
        }
        if let Some(v) = self.size {
            layer.size = v;
        }
        if let Some(v) = self.opacity {
            layer.opacity = v;
        }
        if let Some(v) = self.x {
            layer.x = v;
        }
        if let Some(v) = self.y {
            layer.y = v;
        }
        if let Some(v) = self.style {
            layer.style = v;
        }
    }
}

/// Particle effect kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ParticleKind {
    Rain,
    Snow,
    Sakura,
    Autumn,
    Orbs,
    Hex,
    Firefly,
    Star,
    Bubble,
    Party,
    Notes,
    Mist,
    Dust,
    Ember,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 14] = [
        Self::Rain,
        Self::Snow,
        Self::Sakura,
        Self::Autumn,
        Self::Orbs,
        Self::Hex,
        Self::Firefly,
        Self::Star,
        Self::Bubble,
        Self::Party,
        Self::Notes,
        Self::Mist,
        Self::Dust,
        Self::Ember,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParticleConfig {
    /// Active effect; `None` disables the stage.
    pub effect: Option<ParticleKind>,
    pub audio_react: bool,
    pub color: Color,
    /// 0..100.
    pub opacity: f64,
    /// Target particle count.
    pub density: usize,
    pub speed: f64,
    pub size: f64,
    /// Horizontal wind, nominally -10..10.
    pub wind: f64,
}

impl ParticleConfig {
    /// Largest accepted density.
    pub const MAX_DENSITY: usize = 20_000;
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            effect: Some(ParticleKind::Rain),
            audio_react: true,
            color: Color::WHITE,
            opacity: 100.0,
            density: 300,
            speed: 1.0,
            size: 1.0,
            wind: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VisualizerKind {
    #[default]
    Bars,
    Wave,
    Circle,
    Shimmer,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisualizerConfig {
    pub enabled: bool,
    pub kind: VisualizerKind,
    pub rainbow: bool,
    /// Percent of canvas.
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub gain: f64,
    /// 0..100.
    pub opacity: f64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: VisualizerKind::Bars,
            rainbow: true,
            x: 50.0,
            y: 80.0,
            scale: 50.0,
            gain: 50.0,
            opacity: 80.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Watermark {
    pub source: Option<String>,
    /// Percent of canvas.
    pub x: f64,
    pub y: f64,
    /// Width as a fraction of 20% of the canvas width.
    pub size: f64,
    /// 0..1.
    pub opacity: f64,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            source: None,
            x: 90.0,
            y: 10.0,
            size: 0.5,
            opacity: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SfxConfig {
    pub source: Option<String>,
    /// 0..100.
    pub volume: f64,
    pub looping: bool,
}

impl Default for SfxConfig {
    fn default() -> Self {
        Self {
            source: None,
            volume: 100.0,
            looping: true,
        }
    }
}

/// The element currently active for pointer interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Selection {
    #[default]
    None,
    Text(String),
    Visualizer,
    Watermark,
    Overlay(String),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Caption drawn above the selection box.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Text(_) => "Text Layer",
            Self::Overlay(_) => "Media Layer",
            Self::Visualizer => "EQ",
            Self::Watermark => "Logo",
        }
    }
}
