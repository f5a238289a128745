use crate::capture::sink::{CaptureConfig, CaptureSink, CaptureSummary};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VjError, VjResult};
use crate::render::backend::FrameRGBA;

/// Extra time recorded past the chosen media duration.
pub const AUTO_STOP_TAIL_SECS: f64 = 0.5;

/// Capture length when nothing on the decks reports a duration.
pub const AUTO_STOP_FALLBACK_SECS: f64 = 10.0;

/// Auto-stop point: the active audio track, else the active background video, else the image
/// hold time, else [`AUTO_STOP_FALLBACK_SECS`], plus [`AUTO_STOP_TAIL_SECS`].
pub fn auto_stop_after(audio: Option<f64>, video: Option<f64>, image: Option<f64>) -> f64 {
    let usable = |d: Option<f64>| d.filter(|v| v.is_finite() && *v > 0.0);
    usable(audio)
        .or(usable(video))
        .or(usable(image))
        .unwrap_or(AUTO_STOP_FALLBACK_SECS)
        + AUTO_STOP_TAIL_SECS
}

/// Paces frames and audio into a [`CaptureSink`] on the capture's own timeline.
///
/// Frame `n` carries timestamp `n / fps`; audio is kept aligned so that after frame `n` the sink
/// has exactly `round((n + 1) * sample_rate / fps)` sample frames.
pub struct CaptureBridge {
    sink: Box<dyn CaptureSink>,
    cfg: CaptureConfig,
    next_frame: FrameIndex,
    audio_frames: u64,
    auto_stop_secs: Option<f64>,
}

impl std::fmt::Debug for CaptureBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBridge")
            .field("cfg", &self.cfg)
            .field("next_frame", &self.next_frame)
            .field("audio_frames", &self.audio_frames)
            .field("auto_stop_secs", &self.auto_stop_secs)
            .finish_non_exhaustive()
    }
}

impl CaptureBridge {
    /// Validate `cfg` and open the sink. On error nothing is left running.
    pub fn start(
        mut sink: Box<dyn CaptureSink>,
        cfg: CaptureConfig,
        auto_stop_secs: Option<f64>,
    ) -> VjResult<Self> {
        cfg.validate()?;
        sink.begin(&cfg).map_err(|e| match e {
            VjError::Capture(_) => e,
            other => VjError::capture(format!("capture sink failed to start: {other}")),
        })?;
        tracing::info!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps.as_f64(),
            bitrate = cfg.suggested_bitrate(),
            auto_stop_secs,
            "capture started"
        );
        Ok(Self {
            sink,
            cfg,
            next_frame: FrameIndex(0),
            audio_frames: 0,
            auto_stop_secs,
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.cfg
    }

    pub fn frames_written(&self) -> u64 {
        self.next_frame.0
    }

    pub fn auto_stop_secs(&self) -> Option<f64> {
        self.auto_stop_secs
    }

    /// Recorded length so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.next_frame.0 as f64 * self.cfg.fps.frame_duration_secs()
    }

    /// Frames owed for a capture that has been running `elapsed_secs` of wall time.
    pub fn frames_due(&self, elapsed_secs: f64) -> u64 {
        if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            return 0;
        }
        let target = (elapsed_secs * self.cfg.fps.as_f64()).floor() as u64 + 1;
        target.saturating_sub(self.next_frame.0)
    }

    /// Stereo sample frames to mix before pushing the next video frame.
    pub fn audio_frames_for_next(&self) -> usize {
        let fps = self.cfg.fps;
        let end = ((self.next_frame.0 + 1) as f64 * f64::from(self.cfg.sample_rate)
            * f64::from(fps.den)
            / f64::from(fps.num))
        .round() as u64;
        end.saturating_sub(self.audio_frames) as usize
    }

    /// Push one frame plus its interleaved stereo audio chunk.
    pub fn push(&mut self, frame: &FrameRGBA, stereo: &[f32]) -> VjResult<()> {
        self.sink.push_frame(self.next_frame, frame)?;
        self.next_frame = FrameIndex(self.next_frame.0 + 1);

        let frames = stereo.len() / 2;
        if self.cfg.channels == 1 {
            let mono: Vec<f32> = stereo
                .chunks_exact(2)
                .map(|lr| (lr[0] + lr[1]) * 0.5)
                .collect();
            self.sink.push_audio(&mono)?;
        } else {
            self.sink.push_audio(&stereo[..frames * 2])?;
        }
        self.audio_frames += frames as u64;
        Ok(())
    }

    /// `true` once the recorded length reaches the auto-stop point.
    pub fn is_complete(&self) -> bool {
        self.auto_stop_secs
            .is_some_and(|limit| self.elapsed_secs() >= limit)
    }

    pub fn finish(mut self) -> VjResult<CaptureSummary> {
        let summary = self.sink.end()?;
        tracing::info!(
            frames = summary.frames,
            secs = summary.duration_secs(),
            "capture stopped"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/bridge.rs"]
mod tests;
