use std::path::Path;

use crate::foundation::error::{VjError, VjResult};
use crate::media::pcm::{Pcm, write_wav_i16};

pub const MEGAMIX_SAMPLE_RATE: u32 = 44_100;

/// Placement of one track in the merged timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MegamixSegment {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub fade_in_secs: f64,
    pub fade_out_secs: f64,
}

impl MegamixSegment {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    fn gain_at(&self, rel_secs: f64) -> f32 {
        let mut gain = 1.0f64;
        if self.fade_in_secs > 0.0 {
            gain *= (rel_secs / self.fade_in_secs).clamp(0.0, 1.0);
        }
        if self.fade_out_secs > 0.0 {
            let rem = (self.duration_secs - rel_secs).max(0.0);
            gain *= (rem / self.fade_out_secs).clamp(0.0, 1.0);
        }
        gain as f32
    }
}

/// Sequence tracks of the given durations with linear crossfades.
///
/// The first track starts at full gain; each later one fades in over the crossfade. Every
/// track but the last fades out over its final crossfade window, and the next track starts
/// at that window's start. Crossfades longer than a track are shortened to fit it.
pub fn plan_megamix(durations: &[f64], crossfade_secs: f64) -> Vec<MegamixSegment> {
    let cf = crossfade_secs.max(0.0);
    let last = durations.len().saturating_sub(1);
    let mut out = Vec::with_capacity(durations.len());
    let mut start = 0.0f64;
    let mut prev_fade_out = 0.0f64;
    for (i, &dur) in durations.iter().enumerate() {
        let dur = dur.max(0.0);
        let fade_in = if i == 0 { 0.0 } else { prev_fade_out };
        let fade_out = if i < last { cf.min(dur) } else { 0.0 };
        out.push(MegamixSegment {
            start_secs: start,
            duration_secs: dur,
            fade_in_secs: fade_in,
            fade_out_secs: fade_out,
        });
        start += dur - fade_out;
        prev_fade_out = fade_out;
    }
    out
}

/// Render the playlist into one interleaved stereo buffer at `sample_rate`.
pub fn render_megamix(tracks: &[Pcm], crossfade_secs: f64, sample_rate: u32) -> Vec<f32> {
    let durations: Vec<f64> = tracks.iter().map(Pcm::duration_secs).collect();
    let plan = plan_megamix(&durations, crossfade_secs);
    let total_secs = plan.iter().map(MegamixSegment::end_secs).fold(0.0, f64::max);
    let sr = f64::from(sample_rate.max(1));
    let frames = (total_secs * sr).ceil() as usize;
    let mut out = vec![0.0f32; frames * 2];

    for (pcm, seg) in tracks.iter().zip(&plan) {
        let first = (seg.start_secs * sr).round() as usize;
        let count = (seg.duration_secs * sr).ceil() as usize;
        for i in 0..count {
            let dst = first + i;
            if dst >= frames {
                break;
            }
            let rel = i as f64 / sr;
            let (l, r) = pcm.stereo_at(rel);
            let g = seg.gain_at(rel);
            out[dst * 2] += l * g;
            out[dst * 2 + 1] += r * g;
        }
    }
    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

/// Merge `tracks` into a 16-bit stereo WAV at [`MEGAMIX_SAMPLE_RATE`].
#[tracing::instrument(skip(tracks), fields(tracks = tracks.len()))]
pub fn write_megamix(path: &Path, tracks: &[Pcm], crossfade_secs: f64) -> VjResult<f64> {
    if tracks.is_empty() {
        return Err(VjError::validation("megamix needs at least one track"));
    }
    let mix = render_megamix(tracks, crossfade_secs, MEGAMIX_SAMPLE_RATE);
    write_wav_i16(path, MEGAMIX_SAMPLE_RATE, &mix)?;
    let secs = (mix.len() / 2) as f64 / f64::from(MEGAMIX_SAMPLE_RATE);
    tracing::info!(path = %path.display(), secs, "megamix written");
    Ok(secs)
}

/// Display name given to a merged playlist item.
pub fn megamix_name(track_count: usize) -> String {
    format!("Megamix ({track_count} Songs)")
}

#[cfg(test)]
#[path = "../../tests/unit/audio/megamix.rs"]
mod tests;
