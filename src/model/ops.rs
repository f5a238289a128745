use crate::foundation::error::{VjError, VjResult};
use crate::model::layers::{
    OverlayLayer, OverlayPatch, ParticleConfig, Selection, SfxConfig, TextLayer, TextPatch,
    VisualizerConfig, Watermark,
};
use crate::model::playlist::{MediaDraft, MediaItem, MediaKind, Playlist, Slot, TransitionState};
use crate::model::state::{Deck, FitMode, MAX_OVERLAYS, MixerState};

/// Every way the mixer state can change.
///
/// User edits and the transition engine's own updates share this type so both interleave
/// only at tick boundaries.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    AppendMedia { deck: Deck, items: Vec<MediaDraft> },
    SelectItem { deck: Deck, index: usize },
    ReorderItem { deck: Deck, from: usize, to: usize },
    RemoveItem { deck: Deck, index: usize },
    SetShuffle { deck: Deck, on: bool },
    SetCrossfade { secs: f64 },
    SetSeamless { on: bool },
    SetFit { fit: FitMode },
    SetVideoSpeed { speed: f64 },
    SetImageDuration { secs: f64 },
    SetBackgroundTransform { scale: f64, offset_x: f64, offset_y: f64 },

    AddOverlay { kind: MediaKind, source: String, name: String },
    UpdateOverlay { id: String, patch: OverlayPatch },
    RemoveOverlay { id: String },
    AddText,
    UpdateText { id: String, patch: TextPatch },
    RemoveText { id: String },
    SetParticles { config: ParticleConfig },
    SetVisualizer { config: VisualizerConfig },
    SetWatermark { watermark: Watermark },
    SetSfx { sfx: SfxConfig },
    SetMasterVolume { volume: f64 },

    Select { target: Selection },
    /// Move by `(dx, dy)` in the target's own units: percent of canvas for text, EQ and
    /// logo, pixels for overlays.
    MoveLayer { target: Selection, dx: f64, dy: f64 },
    ResizeLayer { target: Selection, grow: bool },

    SetPlaying { on: bool },
    SetCapturing { on: bool },

    BeginBackgroundTransition,
    SetBackgroundProgress { progress: f64 },
    FinishBackgroundTransition,
    /// Restart the image timer without changing slots.
    ResetBackgroundTimer,
    BeginAudioTransition { at_secs: f64 },
    SetAudioProgress { progress: f64 },
    FinishAudioTransition,
}

/// Inputs an op may consume besides the state itself.
pub struct ApplyCtx<'a> {
    pub rng: &'a mut fastrand::Rng,
    /// Wall-clock now, for the background image timer.
    pub now_ms: f64,
}

fn step_clamped(v: f64, step: f64, grow: bool, lo: f64, hi: f64) -> f64 {
    let next = if grow { v + step } else { v - step };
    next.clamp(lo, hi)
}

impl MixerState {
    fn playlist_mut(&mut self, deck: Deck) -> &mut Playlist {
        match deck {
            Deck::Background => &mut self.background.playlist,
            Deck::Audio => &mut self.audio.playlist,
        }
    }

    fn deck_mut(&mut self, deck: Deck) -> (&mut Playlist, &mut TransitionState) {
        match deck {
            Deck::Background => (&mut self.background.playlist, &mut self.background.transition),
            Deck::Audio => (&mut self.audio.playlist, &mut self.audio.transition),
        }
    }

    /// Id of the item loaded in the standby slot, while a transition runs on `deck`.
    fn standby_in_flight(&mut self, deck: Deck) -> Option<String> {
        let (playlist, transition) = self.deck_mut(deck);
        if transition.is_idle() {
            return None;
        }
        playlist.next_item().map(|item| item.id.clone())
    }

    /// Point `next` back at the item already fading in after a playlist edit. When that item
    /// is gone, or became current, the transition is dropped.
    fn keep_standby(&mut self, deck: Deck, standby: Option<String>) {
        let Some(id) = standby else {
            return;
        };
        let (playlist, transition) = self.deck_mut(deck);
        match playlist.items.iter().position(|item| item.id == id) {
            Some(at) if playlist.current != Some(at) => playlist.next = Some(at),
            _ => {
                *transition = TransitionState::Idle;
                tracing::debug!(?deck, "standby item left the playlist; transition dropped");
            }
        }
    }

    /// Reset a deck to slot A, idle, with a fresh image timer.
    fn rewind_deck(&mut self, deck: Deck, now_ms: f64) {
        match deck {
            Deck::Background => {
                self.background.active = Slot::A;
                self.background.transition = TransitionState::Idle;
                self.background.last_change_ms = now_ms;
            }
            Deck::Audio => {
                self.audio.active = Slot::A;
                self.audio.transition = TransitionState::Idle;
            }
        }
    }

    fn overlay_index(&self, id: &str) -> VjResult<usize> {
        self.overlays
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| VjError::validation(format!("unknown overlay layer \"{id}\"")))
    }

    fn text_index(&self, id: &str) -> VjResult<usize> {
        self.texts
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| VjError::validation(format!("unknown text layer \"{id}\"")))
    }

    /// Apply one op in place.
    ///
    /// Invalid input returns [`VjError::Validation`] and leaves the state untouched.
    pub fn apply(&mut self, op: Op, ctx: &mut ApplyCtx<'_>) -> VjResult<()> {
        match op {
            Op::AppendMedia { deck, items } => {
                if items.is_empty() {
                    return Ok(());
                }
                let items: Vec<MediaItem> = items
                    .into_iter()
                    .map(|d| MediaItem {
                        id: self.mint_id(d.kind.as_str()),
                        source: d.source,
                        name: d.name,
                        kind: d.kind,
                    })
                    .collect();
                self.playlist_mut(deck).append(items, ctx.rng);
                self.rewind_deck(deck, ctx.now_ms);
            }
            Op::SelectItem { deck, index } => {
                self.playlist_mut(deck).select(index, ctx.rng)?;
                self.rewind_deck(deck, ctx.now_ms);
            }
            Op::ReorderItem { deck, from, to } => {
                let standby = self.standby_in_flight(deck);
                self.playlist_mut(deck).reorder(from, to, ctx.rng)?;
                self.keep_standby(deck, standby);
            }
            Op::RemoveItem { deck, index } => {
                let standby = self.standby_in_flight(deck);
                self.playlist_mut(deck).remove(index, ctx.rng)?;
                if self.playlist_mut(deck).is_empty() {
                    self.rewind_deck(deck, ctx.now_ms);
                } else {
                    self.keep_standby(deck, standby);
                }
            }
            Op::SetShuffle { deck, on } => {
                let standby = self.standby_in_flight(deck);
                self.playlist_mut(deck).set_shuffle(on, ctx.rng);
                self.keep_standby(deck, standby);
            }
            Op::SetCrossfade { secs } => {
                if !(secs.is_finite() && secs > 0.0) {
                    return Err(VjError::validation("crossfade must be > 0 seconds"));
                }
                self.audio.crossfade_secs = secs;
            }
            Op::SetSeamless { on } => self.background.seamless = on,
            Op::SetFit { fit } => self.background.fit = fit,
            Op::SetVideoSpeed { speed } => {
                if !(speed.is_finite() && speed > 0.0) {
                    return Err(VjError::validation("video speed must be > 0"));
                }
                self.background.video_speed = speed;
            }
            Op::SetImageDuration { secs } => {
                if !(secs.is_finite() && secs > 0.0) {
                    return Err(VjError::validation("image duration must be > 0 seconds"));
                }
                self.background.image_duration_secs = secs;
            }
            Op::SetBackgroundTransform {
                scale,
                offset_x,
                offset_y,
            } => {
                self.background.scale = scale;
                self.background.offset_x = offset_x;
                self.background.offset_y = offset_y;
            }

            Op::AddOverlay { kind, source, name } => {
                if self.overlays.len() >= MAX_OVERLAYS {
                    return Err(VjError::validation(format!(
                        "at most {MAX_OVERLAYS} overlay layers are allowed"
                    )));
                }
                if kind == MediaKind::Audio {
                    return Err(VjError::validation("overlay layers must be video or image"));
                }
                let id = self.mint_id("layer");
                self.overlays
                    .push(OverlayLayer::new(id.clone(), kind, source, name));
                self.selection = Selection::Overlay(id);
            }
            Op::UpdateOverlay { id, patch } => {
                let i = self.overlay_index(&id)?;
                patch.apply_to(&mut self.overlays[i]);
            }
            Op::RemoveOverlay { id } => {
                let i = self.overlay_index(&id)?;
                self.overlays.remove(i);
                if matches!(&self.selection, Selection::Overlay(sel) if *sel == id) {
                    self.selection = Selection::None;
                }
            }
            Op::AddText => {
                let id = self.mint_id("text");
                self.texts.push(TextLayer::new(id.clone(), "New Text", 60.0));
                self.selection = Selection::Text(id);
            }
            Op::UpdateText { id, patch } => {
                let i = self.text_index(&id)?;
                patch.apply_to(&mut self.texts[i]);
            }
            Op::RemoveText { id } => {
                let i = self.text_index(&id)?;
                self.texts.remove(i);
                self.selection = match self.texts.last() {
                    Some(last) => Selection::Text(last.id.clone()),
                    None => Selection::None,
                };
            }
            Op::SetParticles { config } => {
                if config.density > ParticleConfig::MAX_DENSITY {
                    return Err(VjError::validation(format!(
                        "particle density {} exceeds {}",
                        config.density,
                        ParticleConfig::MAX_DENSITY
                    )));
                }
                self.particles = config;
            }
            Op::SetVisualizer { config } => self.visualizer = config,
            Op::SetWatermark { watermark } => self.watermark = watermark,
            Op::SetSfx { sfx } => self.sfx = sfx,
            Op::SetMasterVolume { volume } => self.master_volume = volume.clamp(0.0, 100.0),

            Op::Select { target } => {
                match &target {
                    Selection::Text(id) => {
                        self.text_index(id)?;
                    }
                    Selection::Overlay(id) => {
                        self.overlay_index(id)?;
                    }
                    _ => {}
                }
                self.selection = target;
            }
            Op::MoveLayer { target, dx, dy } => match &target {
                Selection::None => {}
                Selection::Text(id) => {
                    let i = self.text_index(id)?;
                    self.texts[i].x += dx;
                    self.texts[i].y += dy;
                }
                Selection::Overlay(id) => {
                    let i = self.overlay_index(id)?;
                    self.overlays[i].x += dx;
                    self.overlays[i].y += dy;
                }
                Selection::Visualizer => {
                    self.visualizer.x += dx;
                    self.visualizer.y += dy;
                }
                Selection::Watermark => {
                    self.watermark.x += dx;
                    self.watermark.y += dy;
                }
            },
            Op::ResizeLayer { target, grow } => match &target {
                Selection::None => {}
                Selection::Text(id) => {
                    let i = self.text_index(id)?;
                    let t = &mut self.texts[i];
                    t.size = step_clamped(t.size, 5.0, grow, 10.0, 300.0);
                }
                Selection::Overlay(id) => {
                    let i = self.overlay_index(id)?;
                    let l = &mut self.overlays[i];
                    l.scale = step_clamped(l.scale, 0.1, grow, 0.1, 5.0);
                }
                Selection::Visualizer => {
                    let v = &mut self.visualizer;
                    v.scale = step_clamped(v.scale, 5.0, grow, 10.0, 200.0);
                }
                Selection::Watermark => {
                    let w = &mut self.watermark;
                    w.size = step_clamped(w.size, 0.1, grow, 0.1, 2.0);
                }
            },

            Op::SetPlaying { on } => {
                if on == self.playing {
                    return Ok(());
                }
                if on {
                    if let Some(paused_at) = self.paused_at_ms.take() {
                        let shift = (ctx.now_ms - paused_at).max(0.0);
                        self.background.last_change_ms += shift;
                        if let TransitionState::Transitioning { started_at, .. } =
                            &mut self.background.transition
                        {
                            *started_at += shift;
                        }
                    }
                } else {
                    self.paused_at_ms = Some(ctx.now_ms);
                }
                self.playing = on;
            }
            Op::SetCapturing { on } => self.capturing = on,

            Op::BeginBackgroundTransition => {
                let bg = &mut self.background;
                if !bg.transition.is_idle() || bg.playlist.len() < 2 {
                    tracing::debug!("background transition precondition not met; skipped");
                    return Ok(());
                }
                bg.transition = TransitionState::Transitioning {
                    progress: 0.0,
                    started_at: ctx.now_ms,
                };
                tracing::debug!(next = ?bg.playlist.next, "background transition begins");
            }
            Op::SetBackgroundProgress { progress } => {
                if let TransitionState::Transitioning { progress: p, .. } =
                    &mut self.background.transition
                {
                    *p = progress.max(*p).min(1.0);
                }
            }
            Op::FinishBackgroundTransition => {
                let bg = &mut self.background;
                if bg.transition.is_idle() {
                    tracing::debug!("background finish without a running transition; skipped");
                    return Ok(());
                }
                bg.active = bg.active.toggle();
                bg.playlist.advance(ctx.rng);
                bg.last_change_ms = ctx.now_ms;
                bg.transition = TransitionState::Idle;
                tracing::debug!(active = ?bg.active, current = ?bg.playlist.current, "background slot swap");
            }
            Op::ResetBackgroundTimer => self.background.last_change_ms = ctx.now_ms,
            Op::BeginAudioTransition { at_secs } => {
                let au = &mut self.audio;
                if !au.transition.is_idle() || au.playlist.len() < 2 {
                    tracing::debug!("audio transition precondition not met; skipped");
                    return Ok(());
                }
                au.transition = TransitionState::Transitioning {
                    progress: 0.0,
                    started_at: at_secs,
                };
                tracing::debug!(next = ?au.playlist.next, "audio crossfade begins");
            }
            Op::SetAudioProgress { progress } => {
                if let TransitionState::Transitioning { progress: p, .. } =
                    &mut self.audio.transition
                {
                    *p = progress.max(*p).min(1.0);
                }
            }
            Op::FinishAudioTransition => {
                let au = &mut self.audio;
                if au.transition.is_idle() {
                    tracing::debug!("audio finish without a running transition; skipped");
                    return Ok(());
                }
                au.active = au.active.toggle();
                au.playlist.advance(ctx.rng);
                au.transition = TransitionState::Idle;
                tracing::debug!(active = ?au.active, current = ?au.playlist.current, "audio slot swap");
            }
        }
        Ok(())
    }
}

/// Pure form of [`MixerState::apply`]: returns the successor state.
pub fn reduce(state: &MixerState, op: Op, ctx: &mut ApplyCtx<'_>) -> VjResult<MixerState> {
    let mut next = state.clone();
    next.apply(op, ctx)?;
    Ok(next)
}

#[cfg(test)]
#[path = "../../tests/unit/model/ops.rs"]
mod tests;
