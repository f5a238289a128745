use std::path::Path;
use std::sync::Arc;

use crate::audio::bus::{AudioBus, BusChannel, SoftwareBus};
use crate::audio::megamix::{megamix_name, write_megamix};
use crate::capture::bridge::{CaptureBridge, auto_stop_after};
use crate::capture::sink::{CaptureConfig, CaptureSink, CaptureSummary};
use crate::compile::compositor::{Compositor, FrameInput};
use crate::compile::plan::{FramePlan, HitRegion};
use crate::foundation::clock::TickSource;
use crate::foundation::core::Canvas;
use crate::foundation::error::{VjError, VjResult};
use crate::fx::particles::REFERENCE_TICK_MS;
use crate::fx::text::TextEngine;
use crate::interact::pointer::{Cursor, InteractionResolver, PointerEvent};
use crate::media::catalog::MediaSource;
use crate::media::player::{MediaPlayer, PlayerFactory, SimulatedFactory};
use crate::media::rack::MediaRack;
use crate::model::ops::{ApplyCtx, Op};
use crate::model::playlist::{MediaDraft, MediaItem, MediaKind};
use crate::model::state::{Deck, MixerState};
use crate::render::backend::{BackendKind, FrameRGBA, RenderBackend, create_backend};
use crate::session::config::SessionConfig;
use crate::transition::engine::{
    GainCommand, PlayerCommand, TickInput, TickPlan, TransitionEngine,
};

/// Slack added before converting capture time to a frame count.
const FRAME_EPSILON_SECS: f64 = 1e-6;

fn resume(player: &mut dyn MediaPlayer) {
    if !player.is_playing() && !player.ended() {
        player.play();
    }
}

/// What one [`LiveSession::step`] produced.
#[derive(Clone, Debug)]
pub struct StepOutput {
    pub frame: FrameRGBA,
    /// Stereo audio for the local monitor; empty while muted or while capture drives the bus.
    pub monitor: Vec<f32>,
    /// Set on the step where an auto-stopped capture finished.
    pub capture_finished: Option<CaptureSummary>,
}

/// The running mixer: one state snapshot plus everything that plays, mixes, draws and records it.
///
/// The frame loop calls [`LiveSession::step`] once per display refresh. User edits arrive through
/// [`LiveSession::dispatch`] and pointer events through [`LiveSession::pointer`]; both only touch
/// the state between steps, so each frame composes one consistent snapshot.
pub struct LiveSession {
    config: SessionConfig,
    canvas: Canvas,
    state: MixerState,
    catalog: Arc<dyn MediaSource>,
    rack: MediaRack,
    bus: SoftwareBus,
    engine: TransitionEngine,
    compositor: Compositor,
    backend: Box<dyn RenderBackend>,
    resolver: InteractionResolver,
    hits: Vec<HitRegion>,
    rng: fastrand::Rng,
    clock: Box<dyn TickSource>,
    capture: Option<CaptureBridge>,
    capture_clock_secs: f64,
    monitor_carry: f64,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("canvas", &self.canvas)
            .field("playing", &self.state.playing)
            .field("capturing", &self.state.capturing)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl LiveSession {
    /// Session backed by simulated players over `catalog`.
    pub fn new(
        config: SessionConfig,
        catalog: Arc<dyn MediaSource>,
        clock: Box<dyn TickSource>,
    ) -> VjResult<Self> {
        let factory = Box::new(SimulatedFactory::new(Arc::clone(&catalog)));
        Self::with_players(config, factory, catalog, clock)
    }

    pub fn with_players(
        config: SessionConfig,
        factory: Box<dyn PlayerFactory>,
        catalog: Arc<dyn MediaSource>,
        clock: Box<dyn TickSource>,
    ) -> VjResult<Self> {
        config.validate()?;
        let canvas = config.canvas();

        let mut text = TextEngine::new(config.system_fonts);
        for (family, path) in &config.fonts {
            text.register_font(family, path.clone());
        }

        let mut session = Self {
            canvas,
            state: MixerState::default(),
            rack: MediaRack::new(factory, Arc::clone(&catalog)),
            catalog,
            bus: SoftwareBus::new(config.capture.sample_rate),
            engine: TransitionEngine::new(config.media_timeout_secs),
            compositor: Compositor::new(text, config.seed),
            backend: create_backend(BackendKind::default()),
            resolver: InteractionResolver::new(),
            hits: Vec::new(),
            rng: fastrand::Rng::with_seed(config.seed),
            clock,
            capture: None,
            capture_clock_secs: 0.0,
            monitor_carry: 0.0,
            config,
        };
        session.state.background.last_change_ms = session.clock.now_ms();
        session.settle();
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn state(&self) -> &MixerState {
        &self.state
    }

    /// Hit regions recorded by the last composed frame, bottom to top.
    pub fn hits(&self) -> &[HitRegion] {
        &self.hits
    }

    pub fn bus(&self) -> &SoftwareBus {
        &self.bus
    }

    pub fn rack_mut(&mut self) -> &mut MediaRack {
        &mut self.rack
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn cursor(&self) -> Cursor {
        self.resolver.cursor()
    }

    /// Replace the whole snapshot, e.g. with one loaded from disk. Transport and capture flags
    /// are kept from the running session.
    pub fn load_state(&mut self, mut state: MixerState) {
        state.playing = self.state.playing;
        state.capturing = self.state.capturing;
        state.paused_at_ms = self.state.paused_at_ms;
        self.state = state;
        self.engine.reset();
        self.settle();
        self.align_deck_gains();
    }

    fn apply(&mut self, op: Op) -> VjResult<()> {
        let mut ctx = ApplyCtx {
            rng: &mut self.rng,
            now_ms: self.clock.now_ms(),
        };
        self.state.apply(op, &mut ctx)
    }

    /// Apply one user op. Transport ops route through [`LiveSession::play`] and
    /// [`LiveSession::pause`].
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn dispatch(&mut self, op: Op) -> VjResult<()> {
        let deck_change = match &op {
            Op::SetPlaying { on: true } => return self.play(),
            Op::SetPlaying { on: false } => return self.pause(),
            Op::AppendMedia { deck, .. }
            | Op::SelectItem { deck, .. }
            | Op::ReorderItem { deck, .. }
            | Op::RemoveItem { deck, .. }
            | Op::SetShuffle { deck, .. } => Some(*deck),
            _ => None,
        };
        self.apply(op)?;
        if let Some(deck) = deck_change {
            self.engine.reset();
            if deck == Deck::Audio {
                self.align_deck_gains();
            }
        }
        self.settle();
        Ok(())
    }

    /// Bring players and bus in line with the snapshot after it changed.
    fn settle(&mut self) {
        self.rack.sync(&self.state);
        self.bus
            .set_master((self.state.master_volume / 100.0).clamp(0.0, 1.0) as f32);
        self.bus.set_gain(
            BusChannel::Sfx,
            (self.state.sfx.volume / 100.0).clamp(0.0, 1.0) as f32,
        );
        if self.state.playing {
            self.keep_rolling();
        }
    }

    /// Active deck audible, standby silent. Only valid while no crossfade runs.
    fn align_deck_gains(&mut self) {
        let au = &self.state.audio;
        if !au.transition.is_idle() {
            return;
        }
        self.bus.set_gain(BusChannel::deck(au.active), 1.0);
        self.bus.set_gain(BusChannel::deck(au.standby()), 0.0);
    }

    /// Start whatever should be running but is not: freshly loaded active items, a standby
    /// item that is fading in, and the SFX track. Ended players are left for the transition
    /// engine.
    fn keep_rolling(&mut self) {
        let bg = &self.state.background;
        let is_video = |item: Option<&MediaItem>| item.is_some_and(|i| i.kind == MediaKind::Video);
        let mut slots = Vec::with_capacity(2);
        if is_video(bg.playlist.current_item()) {
            slots.push(bg.active);
        }
        if !bg.transition.is_idle() && is_video(bg.playlist.next_item()) {
            slots.push(bg.standby());
        }
        for slot in slots {
            resume(self.rack.background(slot));
        }

        let au = &self.state.audio;
        if au.playlist.current_item().is_some() {
            let (active, standby) = (au.active, au.standby());
            let fading_in = !au.transition.is_idle();
            resume(self.rack.audio(active));
            if fading_in {
                resume(self.rack.audio(standby));
            }
        }
        if self.state.sfx.source.is_some() {
            resume(self.rack.sfx());
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn play(&mut self) -> VjResult<()> {
        if self.state.playing {
            return Ok(());
        }
        self.apply(Op::SetPlaying { on: true })?;
        self.rack.play_overlays();
        self.settle();
        Ok(())
    }

    /// Stop playback: every player pauses, stall timers reset, particles freeze. The audio
    /// clock stops too, so a running crossfade resumes where it left off.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn pause(&mut self) -> VjResult<()> {
        if !self.state.playing {
            return Ok(());
        }
        self.apply(Op::SetPlaying { on: false })?;
        self.rack.pause_all();
        self.engine.reset();
        Ok(())
    }

    /// Seek the active audio track to `secs` and the active background video to
    /// `secs` modulo its length.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn scrub(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.rack.audio(self.state.audio.active).seek(secs);
        let bg = self.rack.background(self.state.background.active);
        if let Some(d) = bg.duration().filter(|d| *d > 0.0) {
            bg.seek(secs % d);
        }
        self.engine.reset();
    }

    /// Run the transition engine once and carry out what it asks for.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&mut self) -> TickPlan {
        let input = TickInput {
            now_ms: self.clock.now_ms(),
            audio_now: self.bus.now(),
            background: self.rack.observe_background(self.state.background.active),
            audio: self.rack.observe_audio(self.state.audio.active),
        };
        let plan = self.engine.plan(&self.state, input);
        if plan.is_empty() {
            return plan;
        }

        for op in &plan.ops {
            if let Err(e) = self.apply(op.clone()) {
                tracing::warn!(error = %e, ?op, "transition op rejected");
            }
        }
        self.rack.sync(&self.state);

        for cmd in &plan.players {
            match *cmd {
                PlayerCommand::BackgroundFromStart { slot, rate } => {
                    let p = self.rack.background(slot);
                    p.set_rate(rate);
                    p.seek(0.0);
                    p.play();
                }
                PlayerCommand::BackgroundPauseReset { slot } => {
                    let p = self.rack.background(slot);
                    p.pause();
                    p.seek(0.0);
                }
                PlayerCommand::BackgroundRestart { slot } => {
                    let p = self.rack.background(slot);
                    p.seek(0.0);
                    p.play();
                }
                PlayerCommand::AudioFromStart { slot } | PlayerCommand::AudioRestart { slot } => {
                    let p = self.rack.audio(slot);
                    p.seek(0.0);
                    p.play();
                }
                PlayerCommand::AudioPauseReset { slot } => {
                    let p = self.rack.audio(slot);
                    p.pause();
                    p.seek(0.0);
                }
            }
        }

        for cmd in &plan.gains {
            match *cmd {
                GainCommand::RampFromCurrent { channel, to, secs } => {
                    let from = self.bus.gain(channel);
                    self.bus.ramp_gain(channel, from, to, secs);
                }
                GainCommand::Ramp {
                    channel,
                    from,
                    to,
                    secs,
                } => self.bus.ramp_gain(channel, from, to, secs),
                GainCommand::Set { channel, value } => self.bus.set_gain(channel, value),
            }
        }

        if self.state.playing {
            self.keep_rolling();
        }
        plan
    }

    /// Compose the current snapshot without advancing anything.
    pub fn compose(&mut self, particle_dt: f64) -> FramePlan {
        let input = FrameInput {
            state: &self.state,
            spectrum: self.bus.spectrum(),
            time_ms: self.clock.now_ms(),
            canvas: self.canvas,
            particle_dt,
        };
        let plan = self.compositor.compose(&input, &mut self.rack);
        self.hits = plan.hits.clone();
        plan
    }

    /// Compose and rasterize one frame without advancing media.
    pub fn render_frame(&mut self) -> VjResult<FrameRGBA> {
        let plan = self.compose(0.0);
        self.backend.render_plan(&plan)
    }

    /// One pass of the frame loop: advance media by `dt_secs`, mix audio, tick transitions,
    /// compose and rasterize, and feed the capture if one runs.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn step(&mut self, dt_secs: f64) -> VjResult<StepOutput> {
        let dt = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        self.rack.advance_video(dt);

        let mut monitor = Vec::new();
        if self.capture.is_none() {
            let exact = dt * f64::from(self.bus.sample_rate()) + self.monitor_carry;
            let frames = exact.floor().max(0.0);
            self.monitor_carry = exact - frames;
            let mixed = self.mix(frames as usize);
            if !self.bus.monitor_muted() {
                monitor = mixed;
            }
        }

        self.tick();
        let particle_dt = if self.state.playing {
            dt * 1000.0 / REFERENCE_TICK_MS
        } else {
            0.0
        };
        let plan = self.compose(particle_dt);
        let frame = self.backend.render_plan(&plan)?;

        let capture_finished = self.feed_capture(&frame, dt)?;
        Ok(StepOutput {
            frame,
            monitor,
            capture_finished,
        })
    }

    /// Pull `frames` of mixed stereo. The audio clock, and with it every scheduled gain ramp,
    /// only runs while playing; a paused session yields silence.
    fn mix(&mut self, frames: usize) -> Vec<f32> {
        if !self.state.playing {
            return vec![0.0; frames * 2];
        }
        self.bus.render(frames, &mut self.rack)
    }

    fn feed_capture(&mut self, frame: &FrameRGBA, dt: f64) -> VjResult<Option<CaptureSummary>> {
        let elapsed = self.capture_clock_secs + FRAME_EPSILON_SECS;
        let Some(due) = self.capture.as_ref().map(|b| b.frames_due(elapsed)) else {
            return Ok(None);
        };
        for _ in 0..due {
            let n = self
                .capture
                .as_ref()
                .map_or(0, CaptureBridge::audio_frames_for_next);
            let audio = self.mix(n);
            if let Some(bridge) = self.capture.as_mut() {
                bridge.push(frame, &audio)?;
            }
        }
        self.capture_clock_secs += dt;
        if self.capture.as_ref().is_some_and(CaptureBridge::is_complete) {
            return self.stop_capture().map(Some);
        }
        Ok(None)
    }

    /// Capture settings matching this session's canvas and frame rate.
    pub fn default_capture_config(&self) -> VjResult<CaptureConfig> {
        let mut cfg = self.config.capture_config()?;
        cfg.width = self.canvas.width;
        cfg.height = self.canvas.height;
        Ok(cfg)
    }

    /// Start recording into `sink`.
    ///
    /// Players rewind and playback starts, the local monitor is muted, and with `auto_stop` the
    /// capture ends by itself after the active media's length. If the sink cannot be opened the
    /// session is left exactly as it was.
    #[tracing::instrument(level = "info", skip(self, sink))]
    pub fn start_capture(
        &mut self,
        sink: Box<dyn CaptureSink>,
        cfg: CaptureConfig,
        auto_stop: bool,
    ) -> VjResult<()> {
        if self.capture.is_some() {
            return Err(VjError::capture("a capture is already running"));
        }
        if cfg.sample_rate != self.bus.sample_rate() {
            return Err(VjError::capture(format!(
                "capture sample rate {} does not match the mixing bus ({})",
                cfg.sample_rate,
                self.bus.sample_rate()
            )));
        }

        let limit = auto_stop.then(|| self.auto_stop_secs());
        let bridge = CaptureBridge::start(sink, cfg, limit)?;

        self.rack.rewind_all();
        self.engine.reset();
        self.apply(Op::ResetBackgroundTimer)?;
        self.bus.set_monitor_muted(true);
        self.bus.reset_analyzer();
        self.capture = Some(bridge);
        self.capture_clock_secs = 0.0;
        self.apply(Op::SetCapturing { on: true })?;
        self.play()?;
        self.settle();
        Ok(())
    }

    fn auto_stop_secs(&mut self) -> f64 {
        let audio = self.rack.audio(self.state.audio.active).duration();
        let bg = &self.state.background;
        let current = bg.playlist.current_item().map(|i| i.kind);
        let video = match current {
            Some(MediaKind::Video) => self.rack.background(bg.active).duration(),
            _ => None,
        };
        let image = (current == Some(MediaKind::Image)).then_some(bg.image_duration_secs);
        auto_stop_after(audio, video, image)
    }

    /// Finish the running capture and unmute the monitor.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn stop_capture(&mut self) -> VjResult<CaptureSummary> {
        let bridge = self
            .capture
            .take()
            .ok_or_else(|| VjError::capture("no capture is running"))?;
        self.apply(Op::SetCapturing { on: false })?;
        self.bus.set_monitor_muted(false);
        bridge.finish()
    }

    /// Route a pointer event through the last frame's hit regions.
    pub fn pointer(&mut self, event: PointerEvent) -> VjResult<()> {
        let ops = self
            .resolver
            .handle(event, &self.hits, &self.state, self.canvas);
        for op in ops {
            self.dispatch(op)?;
        }
        Ok(())
    }

    /// Merge the audio playlist into one crossfaded WAV at `path` and append it as a new item.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn megamix(&mut self, path: &Path) -> VjResult<()> {
        let items = &self.state.audio.playlist.items;
        if items.len() < 2 {
            return Err(VjError::validation("megamix needs at least two audio tracks"));
        }
        let mut tracks = Vec::with_capacity(items.len());
        for item in items {
            let spec = self.catalog.open(&item.source)?;
            let pcm = spec
                .pcm
                .ok_or_else(|| VjError::media(format!("\"{}\" has no audio", item.source)))?;
            tracks.push(pcm);
        }
        write_megamix(path, &tracks, self.state.audio.crossfade_secs)?;

        let mut draft = MediaDraft::new(path.to_string_lossy(), MediaKind::Audio);
        draft.name = megamix_name(tracks.len());
        self.dispatch(Op::AppendMedia {
            deck: Deck::Audio,
            items: vec![draft],
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/live.rs"]
mod tests;
