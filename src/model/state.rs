use crate::model::layers::{
    OverlayLayer, ParticleConfig, Selection, SfxConfig, TextLayer, VisualizerConfig, Watermark,
};
use crate::model::playlist::{Playlist, Slot, TransitionState};

/// How the background is scaled into the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Cover,
    Contain,
}

impl FitMode {
    /// Uniform scale that maps an `iw x ih` source into a `cw x ch` canvas.
    pub fn scale(self, iw: f64, ih: f64, cw: f64, ch: f64) -> f64 {
        if iw <= 0.0 || ih <= 0.0 {
            return 1.0;
        }
        let sx = cw / iw;
        let sy = ch / ih;
        match self {
            Self::Cover => sx.max(sy),
            Self::Contain => sx.min(sy),
        }
    }
}

/// Playlist family addressed by playlist ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deck {
    Background,
    Audio,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundDeck {
    pub playlist: Playlist,
    pub active: Slot,
    pub transition: TransitionState,
    /// Wall-clock time of the last background change, used by the image timer.
    pub last_change_ms: f64,
    pub fit: FitMode,
    pub seamless: bool,
    pub video_speed: f64,
    pub image_duration_secs: f64,
    /// User pan/zoom applied around the canvas center.
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for BackgroundDeck {
    fn default() -> Self {
        Self {
            playlist: Playlist::default(),
            active: Slot::A,
            transition: TransitionState::Idle,
            last_change_ms: 0.0,
            fit: FitMode::Cover,
            seamless: true,
            video_speed: 1.0,
            image_duration_secs: 5.0,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl BackgroundDeck {
    pub fn standby(&self) -> Slot {
        self.active.toggle()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioDeck {
    pub playlist: Playlist,
    pub active: Slot,
    pub transition: TransitionState,
    pub crossfade_secs: f64,
}

impl Default for AudioDeck {
    fn default() -> Self {
        Self {
            playlist: Playlist::default(),
            active: Slot::A,
            transition: TransitionState::Idle,
            crossfade_secs: 5.0,
        }
    }
}

impl AudioDeck {
    pub fn standby(&self) -> Slot {
        self.active.toggle()
    }
}

/// The single state snapshot read by the compositor and mutated only through [`crate::Op`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MixerState {
    pub project_name: String,
    pub background: BackgroundDeck,
    pub audio: AudioDeck,
    pub overlays: Vec<OverlayLayer>,
    pub texts: Vec<TextLayer>,
    pub particles: ParticleConfig,
    pub visualizer: VisualizerConfig,
    pub watermark: Watermark,
    pub sfx: SfxConfig,
    /// 0..100.
    pub master_volume: f64,
    pub selection: Selection,
    pub playing: bool,
    pub capturing: bool,
    /// Wall-clock time playback was paused at, used to shift timers on resume.
    pub paused_at_ms: Option<f64>,
    /// Monotonic counter for minted ids; never decremented.
    pub next_id: u64,
}

pub const MAX_OVERLAYS: usize = 10;

impl Default for MixerState {
    fn default() -> Self {
        let text = TextLayer::new("default-text".to_owned(), "LAMBDA MAGIC", 80.0);
        Self {
            project_name: "My VJ Project".to_owned(),
            background: BackgroundDeck::default(),
            audio: AudioDeck::default(),
            overlays: Vec::new(),
            texts: vec![text],
            particles: ParticleConfig::default(),
            visualizer: VisualizerConfig::default(),
            watermark: Watermark::default(),
            sfx: SfxConfig::default(),
            master_volume: 100.0,
            selection: Selection::None,
            playing: false,
            capturing: false,
            paused_at_ms: None,
            next_id: 1,
        }
    }
}

impl MixerState {
    pub fn overlay(&self, id: &str) -> Option<&OverlayLayer> {
        self.overlays.iter().find(|l| l.id == id)
    }

    pub fn text(&self, id: &str) -> Option<&TextLayer> {
        self.texts.iter().find(|l| l.id == id)
    }

    pub(crate) fn mint_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }
}
