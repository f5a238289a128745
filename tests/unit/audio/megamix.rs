use super::*;

#[test]
fn plan_overlaps_by_crossfade() {
    let plan = plan_megamix(&[10.0, 8.0, 6.0], 2.0);
    assert_eq!(plan.len(), 3);
    assert_eq!(plan[0].start_secs, 0.0);
    assert_eq!(plan[0].fade_in_secs, 0.0);
    assert_eq!(plan[0].fade_out_secs, 2.0);
    assert_eq!(plan[1].start_secs, 8.0);
    assert_eq!(plan[1].fade_in_secs, 2.0);
    assert_eq!(plan[2].start_secs, 14.0);
    assert_eq!(plan[2].fade_out_secs, 0.0);
    assert_eq!(plan[2].end_secs(), 20.0);
}

#[test]
fn short_tracks_shrink_the_crossfade() {
    let plan = plan_megamix(&[1.0, 4.0], 3.0);
    assert_eq!(plan[0].fade_out_secs, 1.0);
    assert_eq!(plan[1].start_secs, 0.0);
}

#[test]
fn render_keeps_constant_level_through_linear_crossfade() {
    let sr = 100;
    let a = Pcm::new(sr, 1, vec![0.5; 400]).unwrap();
    let b = Pcm::new(sr, 1, vec![0.5; 400]).unwrap();
    let mix = render_megamix(&[a, b], 1.0, sr);
    assert_eq!(mix.len(), 700 * 2);
    assert!((mix[0] - 0.5).abs() < 1e-6);
    let mid = 350 * 2;
    assert!((mix[mid] - 0.5).abs() < 0.02);
    assert!((mix[mix.len() - 2] - 0.5).abs() < 0.02);
}

#[test]
fn write_rejects_empty_playlist() {
    let path = std::env::temp_dir().join("vjmix-empty-megamix.wav");
    assert!(write_megamix(&path, &[], 2.0).is_err());
    assert_eq!(megamix_name(3), "Megamix (3 Songs)");
}
