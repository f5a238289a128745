use std::sync::Arc;

use crate::media::catalog::{MediaSource, MediaSpec};
use crate::media::raster::RasterImage;

/// Capability set of one playback element (a deck slot, an overlay, the SFX channel).
///
/// Readiness is polled, never awaited: a player that is not ready yet is skipped for the frame.
pub trait MediaPlayer: Send {
    /// Point the player at `source`. Loading the current source again is a no-op.
    fn load(&mut self, source: &str);
    fn source(&self) -> Option<&str>;
    /// Drop the loaded source and its decoded data.
    fn release(&mut self);
    fn is_ready(&self) -> bool;

    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    fn seek(&mut self, secs: f64);
    fn position(&self) -> f64;
    fn duration(&self) -> Option<f64>;
    fn ended(&self) -> bool;
    fn set_rate(&mut self, rate: f64);
    fn set_looping(&mut self, on: bool);

    /// Current video frame (or the still, for images).
    fn frame(&self) -> Option<Arc<RasterImage>>;
    /// Advance the video clock by wall-clock `dt_secs`.
    fn advance(&mut self, dt_secs: f64);
    /// Render the next `out.len() / 2` stereo frames, advancing the audio position.
    fn fill_audio(&mut self, out: &mut [f32], sample_rate: u32);
}

/// Creates players for rack slots.
pub trait PlayerFactory: Send {
    fn create(&self) -> Box<dyn MediaPlayer>;
}

const RETRY_SECS: f64 = 1.0;

/// Deterministic player over a [`MediaSource`]; its clock only moves when driven.
pub struct SimulatedPlayer {
    catalog: Arc<dyn MediaSource>,
    source: Option<String>,
    spec: Option<MediaSpec>,
    warned: bool,
    since_retry: f64,
    playing: bool,
    position: f64,
    rate: f64,
    looping: bool,
    ended: bool,
}

impl SimulatedPlayer {
    pub fn new(catalog: Arc<dyn MediaSource>) -> Self {
        Self {
            catalog,
            source: None,
            spec: None,
            warned: false,
            since_retry: 0.0,
            playing: false,
            position: 0.0,
            rate: 1.0,
            looping: false,
            ended: false,
        }
    }

    fn open_current(&mut self) {
        let Some(source) = self.source.as_deref() else {
            return;
        };
        match self.catalog.open(source) {
            Ok(spec) => {
                self.spec = Some(spec);
                self.warned = false;
            }
            Err(e) => {
                if !self.warned {
                    tracing::warn!(source, error = %e, "media load failed; will retry");
                    self.warned = true;
                }
                self.spec = None;
            }
        }
        self.since_retry = 0.0;
    }

    /// Move the media clock, handling end-of-media.
    fn step(&mut self, dt_media: f64) {
        if !self.playing || self.spec.is_none() {
            return;
        }
        self.position += dt_media;
        if let Some(dur) = self.duration()
            && self.position >= dur
        {
            if self.looping && dur > 0.0 {
                self.position %= dur;
            } else {
                self.position = dur;
                self.ended = true;
                self.playing = false;
            }
        }
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn load(&mut self, source: &str) {
        if self.source.as_deref() == Some(source) {
            return;
        }
        self.source = Some(source.to_owned());
        self.warned = false;
        self.playing = false;
        self.position = 0.0;
        self.ended = false;
        self.open_current();
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn release(&mut self) {
        self.source = None;
        self.spec = None;
        self.playing = false;
        self.position = 0.0;
        self.ended = false;
    }

    fn is_ready(&self) -> bool {
        self.spec.is_some()
    }

    fn play(&mut self) {
        if self.source.is_none() {
            return;
        }
        if self.ended {
            self.position = 0.0;
            self.ended = false;
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.position = match self.duration() {
            Some(d) => secs.min(d),
            None => secs,
        };
        self.ended = false;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.spec
            .as_ref()
            .and_then(|s| s.duration)
            .filter(|d| d.is_finite())
    }

    fn ended(&self) -> bool {
        self.ended
    }

    fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
    }

    fn set_looping(&mut self, on: bool) {
        self.looping = on;
    }

    fn frame(&self) -> Option<Arc<RasterImage>> {
        self.spec.as_ref().and_then(|s| s.frame.clone())
    }

    fn advance(&mut self, dt_secs: f64) {
        if self.source.is_some() && self.spec.is_none() {
            self.since_retry += dt_secs;
            if self.since_retry >= RETRY_SECS {
                self.open_current();
            }
            return;
        }
        self.step(dt_secs * self.rate);
    }

    fn fill_audio(&mut self, out: &mut [f32], sample_rate: u32) {
        out.fill(0.0);
        let frames = out.len() / 2;
        if frames == 0 || sample_rate == 0 {
            return;
        }
        let block_secs = frames as f64 / f64::from(sample_rate);
        if self.source.is_some() && self.spec.is_none() {
            self.since_retry += block_secs;
            if self.since_retry >= RETRY_SECS {
                self.open_current();
            }
            return;
        }
        if !self.playing {
            return;
        }
        let dt = self.rate / f64::from(sample_rate);
        let duration = self.duration();
        if let Some(pcm) = self.spec.as_ref().and_then(|s| s.pcm.as_ref()) {
            for (i, px) in out.chunks_exact_mut(2).enumerate() {
                let mut t = self.position + i as f64 * dt;
                if let Some(d) = duration
                    && t >= d
                {
                    if !self.looping || d <= 0.0 {
                        break;
                    }
                    t %= d;
                }
                let (l, r) = pcm.stereo_at(t);
                px[0] = l;
                px[1] = r;
            }
        }
        self.step(frames as f64 * dt);
    }
}

/// Builds [`SimulatedPlayer`]s sharing one catalog.
pub struct SimulatedFactory {
    catalog: Arc<dyn MediaSource>,
}

impl SimulatedFactory {
    pub fn new(catalog: Arc<dyn MediaSource>) -> Self {
        Self { catalog }
    }
}

impl PlayerFactory for SimulatedFactory {
    fn create(&self) -> Box<dyn MediaPlayer> {
        Box::new(SimulatedPlayer::new(self.catalog.clone()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/player.rs"]
mod tests;
