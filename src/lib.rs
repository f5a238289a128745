//! vjmix is a live audio-visual performance mixer.
//!
//! A single [`MixerState`] snapshot holds the background and audio playlists plus every layer.
//! Each frame a [`LiveSession`]:
//!
//! - advances the dual-slot transition engine (background fade, audio crossfade)
//! - composes the snapshot into a backend-agnostic [`FramePlan`] in fixed stage order
//! - rasterizes it on the CPU and, when recording, pushes frame and mixed audio to a
//!   [`CaptureSink`]
//!
//! Edits arrive as [`Op`]s and pointer events, applied only between frames.
#![forbid(unsafe_code)]

pub mod animation;
pub mod audio;
pub mod capture;
pub mod compile;
pub mod foundation;
pub mod fx;
pub mod interact;
pub mod media;
pub mod model;
pub mod render;
pub mod session;
pub mod transition;

pub use crate::foundation::clock::{ManualClock, SystemClock, TickSource};
pub use crate::foundation::color::Color;
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{VjError, VjResult};

pub use crate::capture::sink::{
    CaptureConfig, CaptureSink, CaptureSummary, InMemoryCaptureSink, RawDirSink,
};
pub use crate::compile::plan::{FramePlan, HitRegion};
pub use crate::interact::pointer::{Cursor, PointerEvent};
pub use crate::media::catalog::{Catalog, MediaSource, MediaSpec};
pub use crate::model::layers::Selection;
pub use crate::model::ops::{ApplyCtx, Op, reduce};
pub use crate::model::playlist::{MediaDraft, MediaKind, Slot};
pub use crate::model::state::{Deck, MixerState};
pub use crate::render::backend::{FrameRGBA, RenderBackend};
pub use crate::render::cpu::CpuBackend;
pub use crate::session::config::SessionConfig;
pub use crate::session::live::{LiveSession, StepOutput};
