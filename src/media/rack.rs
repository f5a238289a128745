use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::audio::bus::{BusChannel, BusSource};
use crate::media::catalog::MediaSource;
use crate::media::raster::RasterImage;
use crate::media::player::{MediaPlayer, PlayerFactory};
use crate::media::store::MediaStore;
use crate::model::layers::OverlayLayer;
use crate::model::playlist::{MediaKind, Playlist, Slot, TransitionState};
use crate::model::state::MixerState;

/// Frame lookups the compositor needs; never blocks, `None` means "skip this frame".
pub trait FrameSource {
    fn background_frame(&mut self, slot: Slot) -> Option<Arc<RasterImage>>;
    fn overlay_frame(&mut self, layer: &OverlayLayer) -> Option<Arc<RasterImage>>;
    fn still(&mut self, source: &str) -> Option<Arc<RasterImage>>;
}

/// Playback feedback from the active slot of a deck.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerObs {
    pub ready: bool,
    pub position: f64,
    pub duration: Option<f64>,
    pub ended: bool,
}

impl PlayerObs {
    pub fn of(player: &dyn MediaPlayer) -> Self {
        Self {
            ready: player.is_ready(),
            position: player.position(),
            duration: player.duration(),
            ended: player.ended(),
        }
    }
}

/// Fixed bindings of players to deck slots, the SFX channel, and overlays.
///
/// Which concrete player backs slot A or B never changes; only the state's active
/// designation toggles.
pub struct MediaRack {
    factory: Box<dyn PlayerFactory>,
    background: [Box<dyn MediaPlayer>; 2],
    audio: [Box<dyn MediaPlayer>; 2],
    sfx: Box<dyn MediaPlayer>,
    overlays: HashMap<String, Box<dyn MediaPlayer>>,
    store: MediaStore,
}

/// Load current into the active player and next into the standby one.
///
/// While a transition runs the standby player is already fading in and is left alone.
fn sync_deck(
    players: &mut [Box<dyn MediaPlayer>; 2],
    playlist: &Playlist,
    active: Slot,
    transition: TransitionState,
) {
    let Some(current) = playlist.current_item() else {
        for p in players.iter_mut() {
            p.release();
        }
        return;
    };
    players[active.index()].load(&current.source);
    if !transition.is_idle() {
        return;
    }
    let standby = &mut players[active.toggle().index()];
    match playlist.next_item() {
        Some(next) => standby.load(&next.source),
        None => standby.release(),
    }
}

impl MediaRack {
    pub fn new(factory: Box<dyn PlayerFactory>, catalog: Arc<dyn MediaSource>) -> Self {
        Self {
            background: [factory.create(), factory.create()],
            audio: [factory.create(), factory.create()],
            sfx: factory.create(),
            overlays: HashMap::new(),
            store: MediaStore::new(catalog),
            factory,
        }
    }

    /// Bring player sources in line with `state`. Sources already loaded are left alone.
    pub fn sync(&mut self, state: &MixerState) {
        let bg = &state.background;
        sync_deck(&mut self.background, &bg.playlist, bg.active, bg.transition);
        for p in self.background.iter_mut() {
            p.set_rate(bg.video_speed);
            p.set_looping(false);
        }

        let au = &state.audio;
        sync_deck(&mut self.audio, &au.playlist, au.active, au.transition);

        match &state.sfx.source {
            Some(src) => {
                self.sfx.load(src);
                self.sfx.set_looping(state.sfx.looping);
            }
            None => self.sfx.release(),
        }

        let live: HashSet<&str> = state.overlays.iter().map(|l| l.id.as_str()).collect();
        self.overlays.retain(|id, p| {
            let keep = live.contains(id.as_str());
            if !keep {
                p.release();
            }
            keep
        });
        for layer in &state.overlays {
            let player = self
                .overlays
                .entry(layer.id.clone())
                .or_insert_with(|| self.factory.create());
            if player.source() != Some(layer.source.as_str()) {
                player.load(&layer.source);
                if state.playing && layer.kind == MediaKind::Video {
                    player.play();
                }
            }
            player.set_rate(layer.speed);
            player.set_looping(true);
        }

        let mut stills: HashSet<&str> = state
            .overlays
            .iter()
            .filter(|l| l.kind == MediaKind::Image)
            .map(|l| l.source.as_str())
            .collect();
        if let Some(src) = &state.watermark.source {
            stills.insert(src.as_str());
        }
        self.store.retain_sources(&stills);
    }

    pub fn background(&mut self, slot: Slot) -> &mut dyn MediaPlayer {
        self.background[slot.index()].as_mut()
    }

    pub fn audio(&mut self, slot: Slot) -> &mut dyn MediaPlayer {
        self.audio[slot.index()].as_mut()
    }

    pub fn sfx(&mut self) -> &mut dyn MediaPlayer {
        self.sfx.as_mut()
    }

    pub fn overlay(&mut self, id: &str) -> Option<&mut (dyn MediaPlayer + 'static)> {
        self.overlays.get_mut(id).map(|p| p.as_mut())
    }

    pub fn observe_background(&self, slot: Slot) -> PlayerObs {
        PlayerObs::of(self.background[slot.index()].as_ref())
    }

    pub fn observe_audio(&self, slot: Slot) -> PlayerObs {
        PlayerObs::of(self.audio[slot.index()].as_ref())
    }

    /// Advance video clocks (both background slots and overlays) by wall-clock time.
    pub fn advance_video(&mut self, dt_secs: f64) {
        for p in self.background.iter_mut() {
            p.advance(dt_secs);
        }
        for p in self.overlays.values_mut() {
            p.advance(dt_secs);
        }
    }

    /// Play overlay videos (used on transport play).
    pub fn play_overlays(&mut self) {
        for p in self.overlays.values_mut() {
            if p.duration().is_some() {
                p.play();
            }
        }
    }

    pub fn pause_all(&mut self) {
        for p in self
            .background
            .iter_mut()
            .chain(self.audio.iter_mut())
            .chain(std::iter::once(&mut self.sfx))
            .chain(self.overlays.values_mut())
        {
            p.pause();
        }
    }

    /// Seek every player to zero (capture start).
    pub fn rewind_all(&mut self) {
        for p in self
            .background
            .iter_mut()
            .chain(self.audio.iter_mut())
            .chain(std::iter::once(&mut self.sfx))
            .chain(self.overlays.values_mut())
        {
            p.seek(0.0);
        }
    }
}

impl FrameSource for MediaRack {
    fn background_frame(&mut self, slot: Slot) -> Option<Arc<RasterImage>> {
        let p = &self.background[slot.index()];
        if p.is_ready() { p.frame() } else { None }
    }

    fn overlay_frame(&mut self, layer: &OverlayLayer) -> Option<Arc<RasterImage>> {
        if layer.kind == MediaKind::Image {
            return self.store.still(&layer.source);
        }
        let p = self.overlays.get(&layer.id)?;
        if p.is_ready() { p.frame() } else { None }
    }

    fn still(&mut self, source: &str) -> Option<Arc<RasterImage>> {
        self.store.still(source)
    }
}

impl BusSource for MediaRack {
    fn fill(&mut self, channel: BusChannel, out: &mut [f32], sample_rate: u32) {
        let player = match channel {
            BusChannel::DeckA => &mut self.audio[0],
            BusChannel::DeckB => &mut self.audio[1],
            BusChannel::Sfx => &mut self.sfx,
        };
        player.fill_audio(out, sample_rate);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/rack.rs"]
mod tests;
