use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const SMOOTHING: f32 = 0.85;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Byte-magnitude spectrum over the most recent `FFT_SIZE` mono samples.
///
/// Magnitudes are normalized by the window length, smoothed over time, then mapped from
/// `[MIN_DB, MAX_DB]` onto `0..=255`.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn rustfft::Fft<f32>>,
    hann: Vec<f32>,
    ring: Vec<f32>,
    write_pos: usize,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let n = FFT_SIZE;
        let hann = (0..n)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (n as f32)).cos())
            .collect::<Vec<_>>();
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(n),
            hann,
            ring: vec![0.0; n],
            write_pos: 0,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; BIN_COUNT],
            bytes: vec![0; BIN_COUNT],
        }
    }

    /// Append interleaved stereo samples (downmixed to mono).
    pub fn push_stereo(&mut self, interleaved: &[f32]) {
        for frame in interleaved.chunks_exact(2) {
            self.ring[self.write_pos] = (frame[0] + frame[1]) * 0.5;
            self.write_pos = (self.write_pos + 1) % FFT_SIZE;
        }
    }

    /// Recompute the byte spectrum from the current window.
    pub fn update(&mut self) {
        let n = FFT_SIZE;
        for i in 0..n {
            let s = self.ring[(self.write_pos + i) % n];
            self.fft_buf[i] = Complex {
                re: s * self.hann[i],
                im: 0.0,
            };
        }
        self.fft.process(&mut self.fft_buf);

        let range = MAX_DB - MIN_DB;
        for (k, c) in self.fft_buf.iter().take(BIN_COUNT).enumerate() {
            let mag = (c.re * c.re + c.im * c.im).sqrt() / n as f32;
            let s = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * mag;
            self.smoothed[k] = s;
            let db = if s > 0.0 { 20.0 * s.log10() } else { f32::NEG_INFINITY };
            let v = 255.0 * (db - MIN_DB) / range;
            self.bytes[k] = if v.is_finite() {
                v.clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.smoothed.fill(0.0);
        self.bytes.fill(0);
    }
}

/// Mean of the lowest 8 bins as `0..1`, used by audio-reactive particles.
pub fn bass_level(spectrum: &[u8]) -> f64 {
    let lows = &spectrum[..spectrum.len().min(8)];
    if lows.is_empty() {
        return 0.0;
    }
    let sum: u32 = lows.iter().map(|&b| u32::from(b)).sum();
    f64::from(sum) / lows.len() as f64 / 255.0
}

#[cfg(test)]
#[path = "../../tests/unit/audio/analyzer.rs"]
mod tests;
