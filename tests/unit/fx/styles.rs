use super::*;
use crate::compile::plan::DrawOp;

fn layer_with(kind: TextStyleKind, amount: f64, offset: f64) -> TextLayer {
    let mut l = TextLayer::new("t".to_owned(), "HELLO", 40.0);
    l.style.kind = kind;
    l.style.amount = amount;
    l.style.offset = offset;
    l
}

fn render(layer: &TextLayer) -> Vec<Layer> {
    let mut engine = TextEngine::isolated();
    let mut rng = fastrand::Rng::with_seed(9);
    let mut ctx = StyleCtx {
        engine: &mut engine,
        rng: &mut rng,
        time_ms: 1234.0,
    };
    render_styled_text(layer, Affine::translate((100.0, 100.0)), &mut ctx)
}

fn op_count(layers: &[Layer]) -> usize {
    layers.iter().map(|l| l.ops.len()).sum()
}

#[test]
fn every_style_survives_extreme_parameters() {
    for kind in TextStyleKind::ALL {
        for (a, o) in [(0.0, 0.0), (50.0, 20.0), (1e9, -1e9), (f64::NAN, f64::INFINITY)] {
            let layers = render(&layer_with(kind, a, o));
            assert!(!layers.is_empty(), "{kind:?} produced nothing");
            assert!(op_count(&layers) <= MAX_COPIES * 4 + 8);
        }
        let mut empty = layer_with(kind, 50.0, 20.0);
        empty.content.clear();
        let _ = render(&empty);
    }
}

#[test]
fn long_shadow_repeats_amount_copies_under_the_fill() {
    let layers = render(&layer_with(TextStyleKind::LongShadow, 7.0, 50.0));
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].ops.len(), 8);
}

#[test]
fn echo_count_follows_amount() {
    let layers = render(&layer_with(TextStyleKind::Echo, 25.0, 10.0));
    // floor(25 / 10) + 1 echoes plus the primary fill.
    assert_eq!(layers[0].ops.len(), 4);
}

#[test]
fn soft_shadow_uses_amount_for_blur_and_offset_for_displacement() {
    let layers = render(&layer_with(TextStyleKind::ShadowSoft, 40.0, 60.0));
    let shadow = layers[0].attrs.shadow.unwrap();
    assert_eq!(shadow.blur, 20.0);
    assert!((shadow.offset.x - 4.0).abs() < 1e-9);
    assert_eq!(shadow.offset.x, shadow.offset.y);
}

#[test]
fn neon_stacks_three_escalating_glows() {
    let layers = render(&layer_with(TextStyleKind::Neon, 20.0, 0.0));
    let blurs: Vec<f64> = layers.iter().map(|l| l.attrs.shadow.unwrap().blur).collect();
    assert_eq!(blurs, vec![10.0, 20.0, 30.0]);
}

#[test]
fn splice_clips_two_halves() {
    let layers = render(&layer_with(TextStyleKind::Splice, 50.0, 0.0));
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|l| l.attrs.clip.is_some()));
}

#[test]
fn curve_places_one_op_per_character() {
    let layers = render(&layer_with(TextStyleKind::Curve, 10.0, 10.0));
    assert_eq!(layers[0].ops.len(), 5);
}

#[test]
fn melt_drip_count_is_amount_over_five() {
    let layers = render(&layer_with(TextStyleKind::Melt, 30.0, 0.0));
    assert_eq!(layers[0].ops.len(), 1 + 6);
}

#[test]
fn hollow_outlines_with_minimum_width() {
    let layers = render(&layer_with(TextStyleKind::Hollow, 2.0, 0.0));
    let DrawOp::Text { outline, .. } = &layers[0].ops[0] else {
        panic!("expected a text op");
    };
    assert_eq!(*outline, Some(1.0));
}

#[test]
fn layer_opacity_applies_to_every_layer() {
    let mut l = layer_with(TextStyleKind::Neon, 20.0, 0.0);
    l.opacity = 50.0;
    for layer in render(&l) {
        assert!((layer.attrs.opacity - 0.5).abs() < 1e-6);
    }
}

#[test]
fn pulse_scales_and_slide_shifts() {
    let mut l = layer_with(TextStyleKind::None, 0.0, 0.0);
    let mut rng = fastrand::Rng::with_seed(1);
    let center = Point::new(10.0, 20.0);

    l.animation = TextAnimation::Slide;
    l.animation_speed = 1.0;
    let t = std::f64::consts::FRAC_PI_2 / 0.002;
    let moved = animation_transform(&l, center, t, &mut rng) * Point::ORIGIN;
    assert!((moved.x - 110.0).abs() < 1e-6);

    l.animation = TextAnimation::Pulse;
    let t = std::f64::consts::FRAC_PI_2 / 0.005;
    let a = animation_transform(&l, center, t, &mut rng);
    let p = a * Point::new(1.0, 0.0);
    assert!((p.x - 11.1).abs() < 1e-6);

    l.animation = TextAnimation::None;
    let a = animation_transform(&l, center, 0.0, &mut rng);
    assert_eq!(a * Point::ORIGIN, center);
}
