use super::*;
use crate::foundation::core::Rect;

fn hits() -> Vec<HitRegion> {
    vec![
        HitRegion {
            target: Selection::Overlay("ov-1".into()),
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        },
        HitRegion {
            target: Selection::Text("t-1".into()),
            rect: Rect::new(50.0, 50.0, 150.0, 150.0),
        },
    ]
}

fn canvas() -> Canvas {
    Canvas::new(1000, 500).unwrap()
}

#[test]
fn press_selects_topmost_overlapping_region() {
    let mut r = InteractionResolver::new();
    let ops = r.handle(
        PointerEvent::Press { x: 75.0, y: 75.0 },
        &hits(),
        &MixerState::default(),
        canvas(),
    );
    assert_eq!(
        ops,
        vec![Op::Select {
            target: Selection::Text("t-1".into())
        }]
    );
    assert!(r.is_dragging());
}

#[test]
fn edges_are_inclusive() {
    let h = hits();
    assert!(hit_test(&h, Point::new(0.0, 0.0)).is_some());
    assert!(hit_test(&h, Point::new(150.0, 150.0)).is_some());
    assert!(hit_test(&h, Point::new(150.1, 150.0)).is_none());
}

#[test]
fn miss_clears_selection() {
    let mut r = InteractionResolver::new();
    let ops = r.handle(
        PointerEvent::Press { x: 900.0, y: 400.0 },
        &hits(),
        &MixerState::default(),
        canvas(),
    );
    assert_eq!(
        ops,
        vec![Op::Select {
            target: Selection::None
        }]
    );
    assert!(!r.is_dragging());
}

#[test]
fn drag_uses_percent_for_text_and_pixels_for_overlays() {
    let state = MixerState::default();
    let mut r = InteractionResolver::new();
    r.handle(PointerEvent::Press { x: 120.0, y: 120.0 }, &hits(), &state, canvas());
    let ops = r.handle(PointerEvent::Move { x: 130.0, y: 125.0 }, &hits(), &state, canvas());
    assert_eq!(
        ops,
        vec![Op::MoveLayer {
            target: Selection::Text("t-1".into()),
            dx: 1.0,
            dy: 1.0,
        }]
    );
    r.handle(PointerEvent::Release, &hits(), &state, canvas());

    r.handle(PointerEvent::Press { x: 10.0, y: 10.0 }, &hits(), &state, canvas());
    let ops = r.handle(PointerEvent::Move { x: 20.0, y: 5.0 }, &hits(), &state, canvas());
    assert_eq!(
        ops,
        vec![Op::MoveLayer {
            target: Selection::Overlay("ov-1".into()),
            dx: 10.0,
            dy: -5.0,
        }]
    );
}

#[test]
fn drag_deltas_do_not_compound() {
    let state = MixerState::default();
    let mut r = InteractionResolver::new();
    r.handle(PointerEvent::Press { x: 10.0, y: 10.0 }, &hits(), &state, canvas());
    r.handle(PointerEvent::Move { x: 15.0, y: 10.0 }, &hits(), &state, canvas());
    let ops = r.handle(PointerEvent::Move { x: 17.0, y: 10.0 }, &hits(), &state, canvas());
    let [Op::MoveLayer { dx, .. }] = ops.as_slice() else {
        panic!("expected one move op");
    };
    assert_eq!(*dx, 2.0);
}

#[test]
fn hover_sets_cursor_only_when_not_dragging() {
    let state = MixerState::default();
    let mut r = InteractionResolver::new();
    assert!(r
        .handle(PointerEvent::Move { x: 10.0, y: 10.0 }, &hits(), &state, canvas())
        .is_empty());
    assert_eq!(r.cursor(), Cursor::Move);
    r.handle(PointerEvent::Move { x: 800.0, y: 10.0 }, &hits(), &state, canvas());
    assert_eq!(r.cursor(), Cursor::Default);
}

#[test]
fn scroll_resizes_current_selection() {
    let mut state = MixerState::default();
    let mut r = InteractionResolver::new();
    assert!(r
        .handle(PointerEvent::Scroll { delta_y: 3.0 }, &hits(), &state, canvas())
        .is_empty());

    state.selection = Selection::Watermark;
    let ops = r.handle(PointerEvent::Scroll { delta_y: 3.0 }, &hits(), &state, canvas());
    assert_eq!(
        ops,
        vec![Op::ResizeLayer {
            target: Selection::Watermark,
            grow: false,
        }]
    );
    let ops = r.handle(PointerEvent::Scroll { delta_y: -1.0 }, &hits(), &state, canvas());
    assert_eq!(
        ops,
        vec![Op::ResizeLayer {
            target: Selection::Watermark,
            grow: true,
        }]
    );
}
