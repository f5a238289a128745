use crate::audio::analyzer::SpectrumAnalyzer;
use crate::audio::automation::GainParam;
use crate::model::playlist::Slot;

/// Mixer inputs: the two main-deck slots and the SFX channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusChannel {
    DeckA,
    DeckB,
    Sfx,
}

impl BusChannel {
    pub const ALL: [BusChannel; 3] = [Self::DeckA, Self::DeckB, Self::Sfx];

    pub fn deck(slot: Slot) -> Self {
        match slot {
            Slot::A => Self::DeckA,
            Slot::B => Self::DeckB,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::DeckA => 0,
            Self::DeckB => 1,
            Self::Sfx => 2,
        }
    }
}

/// Pulls channel audio from whatever owns the players.
pub trait BusSource {
    /// Overwrite `out` with interleaved stereo for `channel`.
    fn fill(&mut self, channel: BusChannel, out: &mut [f32], sample_rate: u32);
}

/// Gain automation and analysis surface of an audio mixing bus.
///
/// All times are on the bus's own audio clock, which advances independently of the frame loop.
pub trait AudioBus {
    /// Audio clock in seconds.
    fn now(&self) -> f64;
    fn gain(&self, channel: BusChannel) -> f32;
    /// Cancel scheduled automation and set `value` immediately.
    fn set_gain(&mut self, channel: BusChannel, value: f32);
    /// Cancel scheduled automation, then ramp linearly `from -> to` starting now.
    fn ramp_gain(&mut self, channel: BusChannel, from: f32, to: f32, duration_secs: f64);
    fn set_master(&mut self, value: f32);
    fn master(&self) -> f32;
    /// Latest byte-magnitude spectrum.
    fn spectrum(&self) -> &[u8];
}

/// In-process mixing bus: pulls PCM from a [`BusSource`], applies per-sample gain
/// automation and master gain, and feeds the spectrum analyzer.
pub struct SoftwareBus {
    sample_rate: u32,
    clock_frames: u64,
    gains: [GainParam; 3],
    master: f32,
    analyzer: SpectrumAnalyzer,
    scratch: Vec<f32>,
    monitor_muted: bool,
}

impl SoftwareBus {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            clock_frames: 0,
            gains: [GainParam::new(1.0), GainParam::new(0.0), GainParam::new(1.0)],
            master: 1.0,
            analyzer: SpectrumAnalyzer::new(),
            scratch: Vec::new(),
            monitor_muted: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Silence the local monitor output; the capture mix is unaffected.
    pub fn set_monitor_muted(&mut self, on: bool) {
        self.monitor_muted = on;
    }

    pub fn monitor_muted(&self) -> bool {
        self.monitor_muted
    }

    /// Mix `frames` stereo frames, advancing the audio clock.
    pub fn render(&mut self, frames: usize, source: &mut dyn BusSource) -> Vec<f32> {
        let mut out = vec![0.0f32; frames * 2];
        if frames == 0 {
            return out;
        }
        let sr = f64::from(self.sample_rate);
        self.scratch.resize(frames * 2, 0.0);
        for ch in BusChannel::ALL {
            source.fill(ch, &mut self.scratch, self.sample_rate);
            let gain = &self.gains[ch.index()];
            for (i, (dst, src)) in out
                .chunks_exact_mut(2)
                .zip(self.scratch.chunks_exact(2))
                .enumerate()
            {
                let t = (self.clock_frames + i as u64) as f64 / sr;
                let g = gain.value_at(t);
                dst[0] += src[0] * g;
                dst[1] += src[1] * g;
            }
        }
        for s in &mut out {
            *s = (*s * self.master).clamp(-1.0, 1.0);
        }
        self.clock_frames += frames as u64;
        self.analyzer.push_stereo(&out);
        self.analyzer.update();
        out
    }

    /// Render `secs` of audio, rounding to whole frames.
    pub fn render_secs(&mut self, secs: f64, source: &mut dyn BusSource) -> Vec<f32> {
        let frames = (secs * f64::from(self.sample_rate)).round().max(0.0) as usize;
        self.render(frames, source)
    }

    pub fn reset_analyzer(&mut self) {
        self.analyzer.reset();
    }
}

impl AudioBus for SoftwareBus {
    fn now(&self) -> f64 {
        self.clock_frames as f64 / f64::from(self.sample_rate)
    }

    fn gain(&self, channel: BusChannel) -> f32 {
        self.gains[channel.index()].value_at(self.now())
    }

    fn set_gain(&mut self, channel: BusChannel, value: f32) {
        self.gains[channel.index()].set(value);
    }

    fn ramp_gain(&mut self, channel: BusChannel, from: f32, to: f32, duration_secs: f64) {
        let now = self.now();
        let g = &mut self.gains[channel.index()];
        g.cancel_and_hold(now);
        g.ramp(from, to, now, duration_secs);
    }

    fn set_master(&mut self, value: f32) {
        self.master = value.max(0.0);
    }

    fn master(&self) -> f32 {
        self.master
    }

    fn spectrum(&self) -> &[u8] {
        self.analyzer.bytes()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/bus.rs"]
mod tests;
