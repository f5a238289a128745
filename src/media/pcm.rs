use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{VjError, VjResult};

/// Interleaved `f32` PCM held in memory.
#[derive(Clone, Debug)]
pub struct Pcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Arc<Vec<f32>>,
}

impl Pcm {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> VjResult<Self> {
        if sample_rate == 0 {
            return Err(VjError::media("pcm sample rate must be > 0"));
        }
        if channels == 0 || channels > 2 {
            return Err(VjError::media("pcm must be mono or stereo"));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples: Arc::new(samples),
        })
    }

    /// Sine tone, handy for synthetic decks.
    pub fn tone(sample_rate: u32, secs: f64, hz: f64, amp: f32) -> Self {
        let frames = (secs * f64::from(sample_rate)).max(0.0) as usize;
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f64 / f64::from(sample_rate);
            let v = (std::f64::consts::TAU * hz * t).sin() as f32 * amp;
            samples.push(v);
            samples.push(v);
        }
        Self {
            sample_rate: sample_rate.max(1),
            channels: 2,
            samples: Arc::new(samples),
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Linearly interpolated stereo sample at `secs`; silence outside the buffer.
    pub fn stereo_at(&self, secs: f64) -> (f32, f32) {
        let frames = self.frames();
        let pos = secs * f64::from(self.sample_rate);
        if frames == 0 || !pos.is_finite() || pos < 0.0 {
            return (0.0, 0.0);
        }
        let f0 = pos.floor() as usize;
        if f0 >= frames {
            return (0.0, 0.0);
        }
        let f1 = (f0 + 1).min(frames - 1);
        let frac = (pos - f0 as f64) as f32;
        let src = self.samples.as_slice();
        if self.channels == 1 {
            let v = src[f0] + (src[f1] - src[f0]) * frac;
            (v, v)
        } else {
            let i0 = f0 * 2;
            let i1 = f1 * 2;
            (
                src[i0] + (src[i1] - src[i0]) * frac,
                src[i0 + 1] + (src[i1 + 1] - src[i0 + 1]) * frac,
            )
        }
    }
}

/// Decode a WAV file into interleaved `f32`, folding more than two channels into stereo.
pub fn load_wav(path: &Path) -> VjResult<Pcm> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("open wav '{}'", path.display()))?;
    let spec = reader.spec();
    let src_channels = usize::from(spec.channels.max(1));

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("read float wav samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("read int wav samples")?
        }
    };

    if src_channels <= 2 {
        return Pcm::new(spec.sample_rate, spec.channels, raw);
    }
    let mut stereo = Vec::with_capacity(raw.len() / src_channels * 2);
    for frame in raw.chunks_exact(src_channels) {
        stereo.push(frame[0]);
        stereo.push(frame[1]);
    }
    Pcm::new(spec.sample_rate, 2, stereo)
}

/// Write interleaved stereo `f32` as 16-bit PCM WAV.
pub fn write_wav_i16(path: &Path, sample_rate: u32, stereo: &[f32]) -> VjResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create wav output directory '{}'", parent.display()))?;
    }
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("create wav '{}'", path.display()))?;
    for &s in stereo {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(v).context("write wav sample")?;
    }
    writer.finalize().context("finalize wav")?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/pcm.rs"]
mod tests;
