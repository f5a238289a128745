use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{VjError, VjResult};
use crate::render::backend::FrameRGBA;

/// Largest accepted capture dimension.
pub const MAX_CAPTURE_DIM: u32 = 16384;

/// Stream parameters handed to a [`CaptureSink`] when capture starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub sample_rate: u32,
    /// 1 (mono downmix) or 2 (interleaved stereo).
    pub channels: u16,
}

impl CaptureConfig {
    /// Reject configurations no sink can honor.
    pub fn validate(&self) -> VjResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VjError::capture("capture width/height must be non-zero"));
        }
        if self.width > MAX_CAPTURE_DIM || self.height > MAX_CAPTURE_DIM {
            return Err(VjError::capture(format!(
                "capture size {}x{} exceeds {MAX_CAPTURE_DIM}",
                self.width, self.height
            )));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(VjError::capture("capture fps must be non-zero"));
        }
        let fps = self.fps.as_f64();
        if !(fps > 0.0 && fps <= 240.0) {
            return Err(VjError::capture(format!("unsupported capture fps {fps}")));
        }
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(VjError::capture(format!(
                "unsupported audio sample rate {}",
                self.sample_rate
            )));
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(VjError::capture(format!(
                "unsupported audio channel count {}",
                self.channels
            )));
        }
        Ok(())
    }

    /// Video bitrate hint for external encoders, `w * h * fps * 0.2` bits per second.
    pub fn suggested_bitrate(&self) -> u64 {
        (f64::from(self.width) * f64::from(self.height) * self.fps.as_f64() * 0.2).round() as u64
    }
}

/// What a finished capture produced.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureSummary {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
    /// Audio sample frames (one per channel group).
    pub audio_frames: u64,
    pub suggested_bitrate: u64,
    pub pixel_format: String,
    pub sample_format: String,
}

impl CaptureSummary {
    fn new(cfg: &CaptureConfig, frames: u64, audio_frames: u64) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
            frames,
            audio_frames,
            suggested_bitrate: cfg.suggested_bitrate(),
            pixel_format: "rgba8".to_owned(),
            sample_format: "f32le".to_owned(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 * self.fps.frame_duration_secs()
    }
}

/// Consumer of the live audio+video stream.
///
/// Ordering contract: `push_frame` is called with strictly increasing [`FrameIndex`]; audio is
/// pushed in stream order, interleaved per `channels`.
pub trait CaptureSink: Send {
    /// Called once before anything is pushed; an error aborts the capture.
    fn begin(&mut self, cfg: &CaptureConfig) -> VjResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VjResult<()>;
    fn push_audio(&mut self, samples: &[f32]) -> VjResult<()>;
    /// Called once after the last push.
    fn end(&mut self) -> VjResult<CaptureSummary>;
}

/// Lets a caller keep a handle on a sink it handed to a capture.
impl<S: CaptureSink> CaptureSink for Arc<Mutex<S>> {
    fn begin(&mut self, cfg: &CaptureConfig) -> VjResult<()> {
        lock(self)?.begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VjResult<()> {
        lock(self)?.push_frame(idx, frame)
    }

    fn push_audio(&mut self, samples: &[f32]) -> VjResult<()> {
        lock(self)?.push_audio(samples)
    }

    fn end(&mut self) -> VjResult<CaptureSummary> {
        lock(self)?.end()
    }
}

fn lock<S>(m: &Mutex<S>) -> VjResult<std::sync::MutexGuard<'_, S>> {
    m.lock()
        .map_err(|_| VjError::capture("capture sink lock poisoned"))
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryCaptureSink {
    cfg: Option<CaptureConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    audio: Vec<f32>,
    ended: bool,
}

impl InMemoryCaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<CaptureConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn audio(&self) -> &[f32] {
        &self.audio
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl CaptureSink for InMemoryCaptureSink {
    fn begin(&mut self, cfg: &CaptureConfig) -> VjResult<()> {
        self.cfg = Some(*cfg);
        self.frames.clear();
        self.audio.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VjResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn push_audio(&mut self, samples: &[f32]) -> VjResult<()> {
        self.audio.extend_from_slice(samples);
        Ok(())
    }

    fn end(&mut self) -> VjResult<CaptureSummary> {
        let cfg = self
            .cfg
            .ok_or_else(|| VjError::capture("in-memory sink not started"))?;
        self.ended = true;
        let ch = u64::from(cfg.channels);
        Ok(CaptureSummary::new(
            &cfg,
            self.frames.len() as u64,
            self.audio.len() as u64 / ch,
        ))
    }
}

/// Writes a raw stream directory: `frames.rgba` (opaque RGBA8 frames back to back),
/// `audio.f32le` (interleaved little-endian floats) and `meta.json` (a [`CaptureSummary`]).
pub struct RawDirSink {
    dir: PathBuf,
    video: Option<BufWriter<File>>,
    audio: Option<BufWriter<File>>,
    cfg: Option<CaptureConfig>,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
    frames: u64,
    audio_samples: u64,
}

impl RawDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            video: None,
            audio: None,
            cfg: None,
            scratch: Vec::new(),
            last_idx: None,
            frames: 0,
            audio_samples: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn create(path: &Path) -> VjResult<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    Ok(BufWriter::new(f))
}

impl CaptureSink for RawDirSink {
    fn begin(&mut self, cfg: &CaptureConfig) -> VjResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            VjError::capture(format!(
                "failed to create capture directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.video = Some(create(&self.dir.join("frames.rgba"))?);
        self.audio = Some(create(&self.dir.join("audio.f32le"))?);
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.cfg = Some(*cfg);
        self.last_idx = None;
        self.frames = 0;
        self.audio_samples = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VjResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| VjError::capture("raw sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(VjError::capture("raw sink received out-of-order frame index"));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(VjError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        flatten_premul_over_black(&mut self.scratch, &frame.data)?;
        let video = self
            .video
            .as_mut()
            .ok_or_else(|| VjError::capture("raw sink is already finalized"))?;
        video
            .write_all(&self.scratch)
            .context("failed to write frame")?;
        self.last_idx = Some(idx);
        self.frames += 1;
        Ok(())
    }

    fn push_audio(&mut self, samples: &[f32]) -> VjResult<()> {
        let audio = self
            .audio
            .as_mut()
            .ok_or_else(|| VjError::capture("raw sink is not accepting audio"))?;
        for s in samples {
            audio
                .write_all(&s.to_le_bytes())
                .context("failed to write audio")?;
        }
        self.audio_samples += samples.len() as u64;
        Ok(())
    }

    fn end(&mut self) -> VjResult<CaptureSummary> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| VjError::capture("raw sink not started"))?;
        for w in [self.video.take(), self.audio.take()].into_iter().flatten() {
            w.into_inner()
                .map_err(|e| VjError::capture(format!("failed to flush capture stream: {e}")))?
                .sync_all()
                .context("failed to sync capture stream")?;
        }
        let summary = CaptureSummary::new(
            &cfg,
            self.frames,
            self.audio_samples / u64::from(cfg.channels),
        );
        let meta = serde_json::to_vec_pretty(&summary).map_err(|e| VjError::serde(e.to_string()))?;
        let meta_path = self.dir.join("meta.json");
        std::fs::write(&meta_path, meta)
            .with_context(|| format!("failed to write '{}'", meta_path.display()))?;
        Ok(summary)
    }
}

fn flatten_premul_over_black(dst: &mut [u8], src_premul: &[u8]) -> VjResult<()> {
    if dst.len() != src_premul.len() {
        return Err(VjError::capture("frame data size mismatch with width*height*4"));
    }
    // Over opaque black the premultiplied color is the result.
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        d[..3].copy_from_slice(&s[..3]);
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/capture/sink.rs"]
mod tests;
