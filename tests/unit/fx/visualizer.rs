use super::*;

fn canvas() -> Canvas {
    Canvas::new(800, 400).unwrap()
}

fn cfg(kind: VisualizerKind) -> VisualizerConfig {
    VisualizerConfig {
        enabled: true,
        kind,
        rainbow: false,
        ..VisualizerConfig::default()
    }
}

#[test]
fn bars_bounds_follow_gain_and_scale() {
    let f = render_visualizer(&cfg(VisualizerKind::Bars), &[255; 128], canvas(), 0.0);
    // 40 bars spanning the canvas, 200 px tall at unit gain and scale, anchored at 80%.
    assert_eq!(f.bounds, Rect::new(0.0, 120.0, 800.0, 320.0));
    assert_eq!(f.layers.len(), 1);
    assert_eq!(f.layers[0].ops.len(), BAR_COUNT * 2);
    assert!((f.layers[0].attrs.opacity - 0.8).abs() < 1e-6);
}

#[test]
fn circle_bounds_cover_full_reach() {
    let f = render_visualizer(&cfg(VisualizerKind::Circle), &[0; 128], canvas(), 0.0);
    let reach = 100.0 + 150.0;
    assert_eq!(
        f.bounds,
        Rect::new(400.0 - reach, 320.0 - reach, 400.0 + reach, 320.0 + reach)
    );
    assert_eq!(f.layers[0].ops.len(), RAY_COUNT);
}

#[test]
fn wave_spans_canvas_width() {
    let f = render_visualizer(&cfg(VisualizerKind::Wave), &[128; 128], canvas(), 0.0);
    assert_eq!(f.bounds, Rect::new(0.0, 220.0, 800.0, 420.0));
}

#[test]
fn shimmer_skips_quiet_bins_and_marks_peaks() {
    let mut bins = [0u8; 128];
    bins[0] = 40;
    bins[3] = 120;
    bins[6] = 230;
    let f = render_visualizer(&cfg(VisualizerKind::Shimmer), &bins, canvas(), 0.0);
    assert_eq!(f.layers[0].ops.len(), 2);
    assert_eq!(f.layers[1].ops.len(), 1);
    assert!(f.layers[0].attrs.shadow.is_some());
}

#[test]
fn empty_spectrum_renders_silence() {
    for kind in [
        VisualizerKind::Bars,
        VisualizerKind::Wave,
        VisualizerKind::Circle,
        VisualizerKind::Shimmer,
    ] {
        let f = render_visualizer(&cfg(kind), &[], canvas(), 500.0);
        assert!(f.bounds.width() > 0.0);
    }
}
