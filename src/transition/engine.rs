use crate::animation::ease::Ease;
use crate::audio::bus::BusChannel;
use crate::media::rack::PlayerObs;
use crate::model::ops::Op;
use crate::model::playlist::{MediaKind, Slot, TransitionState};
use crate::model::state::MixerState;

/// Player side effects requested by a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Seek the background slot to zero and play it at `rate`.
    BackgroundFromStart { slot: Slot, rate: f64 },
    /// Pause the background slot and rewind it.
    BackgroundPauseReset { slot: Slot },
    /// Loop the background slot in place.
    BackgroundRestart { slot: Slot },
    AudioFromStart { slot: Slot },
    AudioPauseReset { slot: Slot },
    AudioRestart { slot: Slot },
}

/// Bus automation requested by a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GainCommand {
    /// Hold the channel at its current value, then ramp linearly to `to`.
    RampFromCurrent {
        channel: BusChannel,
        to: f32,
        secs: f64,
    },
    Ramp {
        channel: BusChannel,
        from: f32,
        to: f32,
        secs: f64,
    },
    Set {
        channel: BusChannel,
        value: f32,
    },
}

/// Everything one tick of the engine wants to happen, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickPlan {
    pub ops: Vec<Op>,
    pub players: Vec<PlayerCommand>,
    pub gains: Vec<GainCommand>,
}

impl TickPlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.players.is_empty() && self.gains.is_empty()
    }
}

/// Inputs to one engine tick.
#[derive(Clone, Copy, Debug)]
pub struct TickInput {
    /// Wall clock, drives the background fade and image timer.
    pub now_ms: f64,
    /// Audio clock, drives the audio crossfade.
    pub audio_now: f64,
    /// Active background slot feedback.
    pub background: PlayerObs,
    /// Active audio slot feedback.
    pub audio: PlayerObs,
}

/// Dual-slot transition state machine for the background and audio decks.
///
/// Only reads the state snapshot; every change it wants comes back as [`Op`]s plus
/// player and bus commands. The only state it keeps is how long an active source has
/// been unready, so failed items get skipped.
#[derive(Clone, Debug)]
pub struct TransitionEngine {
    pub background_fade_ms: f64,
    pub ease: Ease,
    /// Used for sources that never report a finite duration or never become ready.
    pub default_timeout_secs: f64,
    bg_stalled_since_ms: Option<f64>,
    audio_stalled_since: Option<f64>,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl TransitionEngine {
    pub fn new(default_timeout_secs: f64) -> Self {
        Self {
            background_fade_ms: 1000.0,
            ease: Ease::InOutSine,
            default_timeout_secs,
            bg_stalled_since_ms: None,
            audio_stalled_since: None,
        }
    }

    /// Eased blend alpha for the standby background during a transition.
    pub fn background_alpha(&self, state: &MixerState) -> Option<f64> {
        state.background.transition.progress().map(|p| self.ease.apply(p))
    }

    /// Evaluate one tick. Nothing runs while playback is stopped.
    pub fn plan(&mut self, state: &MixerState, input: TickInput) -> TickPlan {
        let mut plan = TickPlan::default();
        if !state.playing {
            return plan;
        }
        self.plan_background(state, &input, &mut plan);
        self.plan_audio(state, &input, &mut plan);
        plan
    }

    fn plan_background(&mut self, state: &MixerState, input: &TickInput, plan: &mut TickPlan) {
        let bg = &state.background;
        let Some(current) = bg.playlist.current_item() else {
            self.bg_stalled_since_ms = None;
            return;
        };
        let len = bg.playlist.len();

        if let TransitionState::Transitioning { started_at, .. } = bg.transition {
            let t = (input.now_ms - started_at) / self.background_fade_ms.max(1.0);
            plan.ops.push(Op::SetBackgroundProgress {
                progress: t.clamp(0.0, 1.0),
            });
            if t >= 1.0 {
                plan.ops.push(Op::FinishBackgroundTransition);
                if current.kind == MediaKind::Video {
                    plan.players
                        .push(PlayerCommand::BackgroundPauseReset { slot: bg.active });
                }
                self.bg_stalled_since_ms = None;
            }
            return;
        }

        let obs = input.background;
        let elapsed_ms = input.now_ms - bg.last_change_ms;
        let timeout_ms = self.default_timeout_secs * 1000.0;

        let due = match current.kind {
            MediaKind::Video if !obs.ready => {
                let since = *self.bg_stalled_since_ms.get_or_insert(input.now_ms);
                input.now_ms - since > timeout_ms
            }
            MediaKind::Video => {
                self.bg_stalled_since_ms = None;
                let speed = bg.video_speed.max(1e-6);
                match obs.duration {
                    Some(dur) => {
                        let time_left = (dur - obs.position) / speed;
                        if bg.seamless && len > 1 {
                            time_left < 1.0
                        } else {
                            if obs.ended || time_left <= 0.0 {
                                plan.players
                                    .push(PlayerCommand::BackgroundRestart { slot: bg.active });
                            }
                            false
                        }
                    }
                    None => elapsed_ms > timeout_ms,
                }
            }
            MediaKind::Image | MediaKind::Audio => {
                self.bg_stalled_since_ms = None;
                elapsed_ms > bg.image_duration_secs * 1000.0
            }
        };

        if !due || !bg.seamless || len < 2 {
            return;
        }
        plan.ops.push(Op::BeginBackgroundTransition);
        if let Some(next) = bg.playlist.next_item()
            && next.kind == MediaKind::Video
        {
            plan.players.push(PlayerCommand::BackgroundFromStart {
                slot: bg.standby(),
                rate: bg.video_speed,
            });
        }
        tracing::debug!(elapsed_ms, "background transition triggered");
    }

    fn plan_audio(&mut self, state: &MixerState, input: &TickInput, plan: &mut TickPlan) {
        let au = &state.audio;
        if au.playlist.current_item().is_none() {
            self.audio_stalled_since = None;
            return;
        }
        let len = au.playlist.len();
        let crossfade = au.crossfade_secs.max(0.0);

        if let TransitionState::Transitioning { started_at, .. } = au.transition {
            let t = input.audio_now - started_at;
            let progress = if crossfade > 0.0 {
                (t / crossfade).clamp(0.0, 1.0)
            } else {
                1.0
            };
            plan.ops.push(Op::SetAudioProgress { progress });
            if t >= crossfade {
                plan.ops.push(Op::FinishAudioTransition);
                plan.players
                    .push(PlayerCommand::AudioPauseReset { slot: au.active });
                plan.gains.push(GainCommand::Set {
                    channel: BusChannel::deck(au.active),
                    value: 0.0,
                });
                plan.gains.push(GainCommand::Set {
                    channel: BusChannel::deck(au.standby()),
                    value: 1.0,
                });
                self.audio_stalled_since = None;
            }
            return;
        }

        let obs = input.audio;
        if len == 1 {
            if obs.ended {
                plan.players
                    .push(PlayerCommand::AudioRestart { slot: au.active });
            }
            return;
        }

        let due = if obs.ready {
            self.audio_stalled_since = None;
            let dur = obs.duration.unwrap_or(self.default_timeout_secs);
            let time_left = dur - obs.position;
            (time_left < crossfade && time_left > 0.0) || time_left <= 0.0 || obs.ended
        } else {
            let since = *self.audio_stalled_since.get_or_insert(input.audio_now);
            input.audio_now - since > self.default_timeout_secs
        };
        if !due {
            return;
        }

        plan.ops.push(Op::BeginAudioTransition {
            at_secs: input.audio_now,
        });
        plan.players
            .push(PlayerCommand::AudioFromStart { slot: au.standby() });
        plan.gains.push(GainCommand::RampFromCurrent {
            channel: BusChannel::deck(au.active),
            to: 0.0,
            secs: crossfade,
        });
        plan.gains.push(GainCommand::Ramp {
            channel: BusChannel::deck(au.standby()),
            from: 0.0,
            to: 1.0,
            secs: crossfade,
        });
        tracing::debug!(position = obs.position, "audio crossfade triggered");
    }

    /// Forget stall timers (after a manual selection or a transport jump).
    pub fn reset(&mut self) {
        self.bg_stalled_since_ms = None;
        self.audio_stalled_since = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/engine.rs"]
mod tests;
