use super::*;
use crate::foundation::core::Rgba8Premul;
use crate::model::layers::{ParticleKind, TextLayer};
use crate::model::playlist::{MediaItem, MediaKind, Slot, TransitionState};
use crate::model::state::FitMode;

#[derive(Default)]
struct FakeFrames {
    background: Option<Arc<RasterImage>>,
    standby: Option<Arc<RasterImage>>,
    overlay: Option<Arc<RasterImage>>,
    still: Option<Arc<RasterImage>>,
}

impl FrameSource for FakeFrames {
    fn background_frame(&mut self, slot: Slot) -> Option<Arc<RasterImage>> {
        match slot {
            Slot::A => self.background.clone(),
            Slot::B => self.standby.clone(),
        }
    }

    fn overlay_frame(&mut self, _layer: &OverlayLayer) -> Option<Arc<RasterImage>> {
        self.overlay.clone()
    }

    fn still(&mut self, _source: &str) -> Option<Arc<RasterImage>> {
        self.still.clone()
    }
}

fn img(w: u32, h: u32) -> Arc<RasterImage> {
    Arc::new(RasterImage::solid(w, h, Rgba8Premul::black()).unwrap())
}

fn bare_state() -> MixerState {
    let mut s = MixerState::default();
    s.texts.clear();
    s.visualizer.enabled = false;
    s.particles.effect = None;
    s
}

fn compose(state: &MixerState, frames: &mut FakeFrames) -> FramePlan {
    let mut c = Compositor::new(TextEngine::isolated(), 7);
    let canvas = Canvas::new(1920, 1080).unwrap();
    c.compose(
        &FrameInput {
            state,
            spectrum: &[],
            time_ms: 0.0,
            canvas,
            particle_dt: 0.0,
        },
        frames,
    )
}

fn item(id: &str) -> MediaItem {
    MediaItem {
        id: id.to_owned(),
        source: format!("{id}.png"),
        name: id.to_owned(),
        kind: MediaKind::Image,
    }
}

#[test]
fn empty_state_is_just_the_black_clear() {
    let plan = compose(&bare_state(), &mut FakeFrames::default());
    assert_eq!(plan.layers.len(), 1);
    assert!(plan.hits.is_empty());
}

#[test]
fn background_fits_contain_and_cross_fades_standby() {
    let mut s = bare_state();
    s.background.playlist.items = vec![item("a"), item("b")];
    s.background.playlist.current = Some(0);
    s.background.playlist.next = Some(1);
    s.background.fit = FitMode::Contain;
    s.background.transition = TransitionState::Transitioning {
        progress: 0.5,
        started_at: 0.0,
    };
    let mut frames = FakeFrames {
        background: Some(img(960, 1080)),
        standby: Some(img(960, 1080)),
        ..Default::default()
    };
    let plan = compose(&s, &mut frames);
    assert_eq!(plan.layers.len(), 3);

    let DrawOp::Image { transform, .. } = &plan.layers[1].ops[0] else {
        panic!("expected image op");
    };
    let p = *transform * kurbo::Point::new(0.0, 0.0);
    assert!((p.x - 480.0).abs() < 1e-9 && p.y.abs() < 1e-9);
    assert!((plan.layers[2].attrs.opacity - 0.5).abs() < 1e-6);
}

#[test]
fn overlay_crop_and_hit_follow_scale() {
    let mut s = bare_state();
    let mut layer = OverlayLayer::new(
        "ov-1".into(),
        MediaKind::Image,
        "logo.png".into(),
        "logo".into(),
    );
    layer.scale = 2.0;
    layer.x = 100.0;
    layer.crop = CropShape::Circle;
    layer.opacity = 50.0;
    s.overlays.push(layer);
    let mut frames = FakeFrames {
        overlay: Some(img(100, 50)),
        ..Default::default()
    };
    let plan = compose(&s, &mut frames);

    let hit = plan.hit_for(&Selection::Overlay("ov-1".into())).unwrap();
    assert_eq!(hit.rect, Rect::new(960.0, 490.0, 1160.0, 590.0));
    let top = plan.layers.last().unwrap();
    assert!(top.attrs.clip.is_some());
    assert!((top.attrs.opacity - 0.5).abs() < 1e-6);
}

#[test]
fn missing_overlay_frame_skips_draw_and_hit() {
    let mut s = bare_state();
    s.overlays.push(OverlayLayer::new(
        "ov-1".into(),
        MediaKind::Video,
        "clip.mp4".into(),
        "clip".into(),
    ));
    let plan = compose(&s, &mut FakeFrames::default());
    assert_eq!(plan.layers.len(), 1);
    assert!(plan.hits.is_empty());
}

#[test]
fn crop_shapes_use_shorter_side() {
    assert!(crop_path(CropShape::Original, 10.0, 10.0).is_none());
    let r = crop_path(CropShape::Portrait9x16, 200.0, 100.0).unwrap().bounding_box();
    assert!((r.width() - 56.0).abs() < 1e-9);
    assert!((r.height() - 100.0).abs() < 1e-9);
    let c = crop_path(CropShape::Circle, 80.0, 120.0).unwrap().bounding_box();
    assert!((c.width() - 80.0).abs() < 1e-6);
}

#[test]
fn text_hit_is_centered_on_percent_position() {
    let mut s = bare_state();
    let mut t = TextLayer::new("t-1".into(), "ABCD", 50.0);
    t.x = 50.0;
    t.y = 50.0;
    s.texts.push(t);
    let plan = compose(&s, &mut FakeFrames::default());
    let hit = plan.hit_for(&Selection::Text("t-1".into())).unwrap();
    let w = 4.0 * 50.0 * 0.6;
    assert!((hit.rect.x0 - (960.0 - w / 2.0)).abs() < 1e-9);
    assert!((hit.rect.height() - 50.0).abs() < 1e-9);
}

#[test]
fn hidden_or_empty_text_is_skipped() {
    let mut s = bare_state();
    let mut hidden = TextLayer::new("t-1".into(), "X", 40.0);
    hidden.visible = false;
    s.texts.push(hidden);
    s.texts.push(TextLayer::new("t-2".into(), "", 40.0));
    let plan = compose(&s, &mut FakeFrames::default());
    assert!(plan.hits.is_empty());
}

#[test]
fn watermark_keeps_aspect_inside_base_box() {
    let mut s = bare_state();
    s.watermark.source = Some("logo.png".into());
    s.watermark.size = 1.0;
    s.watermark.x = 50.0;
    s.watermark.y = 50.0;
    let mut frames = FakeFrames {
        still: Some(img(200, 100)),
        ..Default::default()
    };
    let plan = compose(&s, &mut frames);
    let hit = plan.hit_for(&Selection::Watermark).unwrap();
    assert!((hit.rect.width() - 384.0).abs() < 1e-9);
    assert!((hit.rect.height() - 192.0).abs() < 1e-9);
    assert!((plan.layers.last().unwrap().attrs.opacity - 0.8).abs() < 1e-6);
}

#[test]
fn selection_box_only_outside_capture() {
    let mut s = bare_state();
    s.visualizer.enabled = true;
    s.selection = Selection::Visualizer;
    let live = compose(&s, &mut FakeFrames::default());

    s.capturing = true;
    let captured = compose(&s, &mut FakeFrames::default());
    assert_eq!(live.layers.len(), captured.layers.len() + 1);
}

#[test]
fn particles_are_drawn_when_enabled() {
    let mut s = bare_state();
    s.particles.effect = Some(ParticleKind::Snow);
    s.particles.density = 30;
    let plan = compose(&s, &mut FakeFrames::default());
    assert_eq!(plan.layers.len(), 2);
}
