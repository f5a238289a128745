use super::*;
use crate::model::ops::ApplyCtx;
use crate::model::playlist::MediaDraft;
use crate::model::state::Deck;

fn obs(position: f64, duration: f64) -> PlayerObs {
    PlayerObs {
        ready: true,
        position,
        duration: Some(duration),
        ended: position >= duration,
    }
}

fn idle_obs() -> PlayerObs {
    PlayerObs {
        ready: false,
        position: 0.0,
        duration: None,
        ended: false,
    }
}

fn state_with(deck: Deck, items: Vec<MediaDraft>) -> MixerState {
    let mut s = MixerState::default();
    let mut rng = fastrand::Rng::with_seed(3);
    let mut ctx = ApplyCtx {
        rng: &mut rng,
        now_ms: 0.0,
    };
    s.apply(Op::AppendMedia { deck, items }, &mut ctx).unwrap();
    s.apply(Op::SetPlaying { on: true }, &mut ctx).unwrap();
    s
}

fn apply(s: &mut MixerState, ops: Vec<Op>, now_ms: f64) {
    let mut rng = fastrand::Rng::with_seed(4);
    for op in ops {
        let mut ctx = ApplyCtx {
            rng: &mut rng,
            now_ms,
        };
        s.apply(op, &mut ctx).unwrap();
    }
}

fn input(now_ms: f64, audio_now: f64, background: PlayerObs, audio: PlayerObs) -> TickInput {
    TickInput {
        now_ms,
        audio_now,
        background,
        audio,
    }
}

#[test]
fn nothing_happens_while_stopped() {
    let mut s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("a.png", MediaKind::Image),
            MediaDraft::new("b.png", MediaKind::Image),
        ],
    );
    apply(&mut s, vec![Op::SetPlaying { on: false }], 0.0);
    let mut eng = TransitionEngine::default();
    let plan = eng.plan(&s, input(60_000.0, 60.0, idle_obs(), idle_obs()));
    assert!(plan.is_empty());
}

#[test]
fn video_triggers_one_second_before_end_and_starts_standby() {
    let s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("v1.mp4", MediaKind::Video),
            MediaDraft::new("v2.mp4", MediaKind::Video),
        ],
    );
    let mut eng = TransitionEngine::default();

    let early = eng.plan(&s, input(3_000.0, 0.0, obs(3.0, 5.0), idle_obs()));
    assert!(early.ops.is_empty());

    let plan = eng.plan(&s, input(4_100.0, 0.0, obs(4.1, 5.0), idle_obs()));
    assert_eq!(plan.ops, vec![Op::BeginBackgroundTransition]);
    assert_eq!(
        plan.players,
        vec![PlayerCommand::BackgroundFromStart {
            slot: Slot::B,
            rate: 1.0
        }]
    );
}

#[test]
fn video_speed_scales_time_left() {
    let mut s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("v1.mp4", MediaKind::Video),
            MediaDraft::new("v2.mp4", MediaKind::Video),
        ],
    );
    apply(&mut s, vec![Op::SetVideoSpeed { speed: 2.0 }], 0.0);
    let mut eng = TransitionEngine::default();
    // 1.5 s of media left at 2x is 0.75 s of wall time.
    let plan = eng.plan(&s, input(1_000.0, 0.0, obs(3.5, 5.0), idle_obs()));
    assert_eq!(plan.ops, vec![Op::BeginBackgroundTransition]);
}

#[test]
fn fade_progresses_then_finishes_and_pauses_old_video() {
    let mut s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("v1.mp4", MediaKind::Video),
            MediaDraft::new("i2.png", MediaKind::Image),
        ],
    );
    apply(&mut s, vec![Op::BeginBackgroundTransition], 4_000.0);
    let mut eng = TransitionEngine::default();

    let mid = eng.plan(&s, input(4_500.0, 0.0, obs(4.5, 5.0), idle_obs()));
    assert_eq!(mid.ops, vec![Op::SetBackgroundProgress { progress: 0.5 }]);
    apply(&mut s, mid.ops, 4_500.0);
    let alpha = eng.background_alpha(&s).unwrap();
    assert!((alpha - 0.5).abs() < 1e-9);

    let done = eng.plan(&s, input(5_000.0, 0.0, obs(5.0, 5.0), idle_obs()));
    assert_eq!(
        done.ops,
        vec![
            Op::SetBackgroundProgress { progress: 1.0 },
            Op::FinishBackgroundTransition
        ]
    );
    assert_eq!(
        done.players,
        vec![PlayerCommand::BackgroundPauseReset { slot: Slot::A }]
    );
    apply(&mut s, done.ops, 5_000.0);
    assert_eq!(s.background.active, Slot::B);
    assert_eq!(s.background.playlist.current, Some(1));
    assert_eq!(s.background.playlist.next, Some(0));
}

#[test]
fn images_wait_for_their_duration() {
    let s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("a.png", MediaKind::Image),
            MediaDraft::new("b.png", MediaKind::Image),
        ],
    );
    let mut eng = TransitionEngine::default();
    assert!(eng.plan(&s, input(4_900.0, 0.0, idle_obs(), idle_obs())).is_empty());
    let plan = eng.plan(&s, input(5_100.0, 0.0, idle_obs(), idle_obs()));
    assert_eq!(plan.ops, vec![Op::BeginBackgroundTransition]);
    assert!(plan.players.is_empty());
}

#[test]
fn seamless_off_loops_videos_and_holds_images() {
    let mut s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("v1.mp4", MediaKind::Video),
            MediaDraft::new("i2.png", MediaKind::Image),
        ],
    );
    apply(&mut s, vec![Op::SetSeamless { on: false }], 0.0);
    let mut eng = TransitionEngine::default();
    let plan = eng.plan(&s, input(5_000.0, 0.0, obs(5.0, 5.0), idle_obs()));
    assert!(plan.ops.is_empty());
    assert_eq!(
        plan.players,
        vec![PlayerCommand::BackgroundRestart { slot: Slot::A }]
    );
}

#[test]
fn single_item_never_transitions() {
    let s = state_with(
        Deck::Background,
        vec![MediaDraft::new("v1.mp4", MediaKind::Video)],
    );
    let mut eng = TransitionEngine::default();
    let plan = eng.plan(&s, input(5_000.0, 0.0, obs(5.0, 5.0), idle_obs()));
    assert!(plan.ops.is_empty());
    assert_eq!(
        plan.players,
        vec![PlayerCommand::BackgroundRestart { slot: Slot::A }]
    );
}

#[test]
fn unready_video_is_skipped_after_timeout() {
    let s = state_with(
        Deck::Background,
        vec![
            MediaDraft::new("broken.mp4", MediaKind::Video),
            MediaDraft::new("b.png", MediaKind::Image),
        ],
    );
    let mut eng = TransitionEngine::new(2.0);
    assert!(eng.plan(&s, input(100.0, 0.0, idle_obs(), idle_obs())).is_empty());
    assert!(eng.plan(&s, input(2_000.0, 0.0, idle_obs(), idle_obs())).is_empty());
    let plan = eng.plan(&s, input(2_200.0, 0.0, idle_obs(), idle_obs()));
    assert_eq!(plan.ops, vec![Op::BeginBackgroundTransition]);
}

#[test]
fn audio_crossfade_schedules_complementary_ramps() {
    let s = state_with(
        Deck::Audio,
        vec![
            MediaDraft::new("t1.wav", MediaKind::Audio),
            MediaDraft::new("t2.wav", MediaKind::Audio),
        ],
    );
    let mut eng = TransitionEngine::default();
    assert!(eng.plan(&s, input(0.0, 4.0, idle_obs(), obs(4.0, 10.0))).is_empty());

    let plan = eng.plan(&s, input(0.0, 5.5, idle_obs(), obs(5.5, 10.0)));
    assert_eq!(plan.ops, vec![Op::BeginAudioTransition { at_secs: 5.5 }]);
    assert_eq!(plan.players, vec![PlayerCommand::AudioFromStart { slot: Slot::B }]);
    assert_eq!(
        plan.gains,
        vec![
            GainCommand::RampFromCurrent {
                channel: BusChannel::DeckA,
                to: 0.0,
                secs: 5.0
            },
            GainCommand::Ramp {
                channel: BusChannel::DeckB,
                from: 0.0,
                to: 1.0,
                secs: 5.0
            },
        ]
    );
}

#[test]
fn audio_finish_swaps_and_pins_gains() {
    let mut s = state_with(
        Deck::Audio,
        vec![
            MediaDraft::new("t1.wav", MediaKind::Audio),
            MediaDraft::new("t2.wav", MediaKind::Audio),
        ],
    );
    apply(
        &mut s,
        vec![
            Op::SetCrossfade { secs: 2.0 },
            Op::BeginAudioTransition { at_secs: 8.0 },
        ],
        0.0,
    );
    let mut eng = TransitionEngine::default();
    let mid = eng.plan(&s, input(0.0, 9.0, idle_obs(), obs(9.0, 10.0)));
    assert_eq!(mid.ops, vec![Op::SetAudioProgress { progress: 0.5 }]);
    // No new trigger may fire while a crossfade is running.
    assert!(mid.players.is_empty());

    let done = eng.plan(&s, input(0.0, 10.0, idle_obs(), obs(10.0, 10.0)));
    assert_eq!(
        done.ops,
        vec![
            Op::SetAudioProgress { progress: 1.0 },
            Op::FinishAudioTransition
        ]
    );
    assert_eq!(done.players, vec![PlayerCommand::AudioPauseReset { slot: Slot::A }]);
    assert_eq!(
        done.gains,
        vec![
            GainCommand::Set {
                channel: BusChannel::DeckA,
                value: 0.0
            },
            GainCommand::Set {
                channel: BusChannel::DeckB,
                value: 1.0
            },
        ]
    );
    apply(&mut s, done.ops, 0.0);
    assert_eq!(s.audio.active, Slot::B);
    assert_eq!(s.audio.playlist.current, Some(1));
}

#[test]
fn single_track_restarts_when_ended() {
    let s = state_with(Deck::Audio, vec![MediaDraft::new("t1.wav", MediaKind::Audio)]);
    let mut eng = TransitionEngine::default();
    let plan = eng.plan(&s, input(0.0, 10.0, idle_obs(), obs(10.0, 10.0)));
    assert!(plan.ops.is_empty());
    assert_eq!(plan.players, vec![PlayerCommand::AudioRestart { slot: Slot::A }]);
}
