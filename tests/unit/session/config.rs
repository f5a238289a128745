use super::*;

#[test]
fn defaults_match_the_stock_session() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.canvas(), Canvas::FHD);
    assert_eq!(cfg.frame_rate().unwrap().as_f64(), 30.0);
    assert_eq!(cfg.media_timeout_secs, 10.0);
    let cap = cfg.capture_config().unwrap();
    assert_eq!((cap.sample_rate, cap.channels), (48_000, 2));
    assert_eq!((cap.width, cap.height), (1920, 1080));
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = SessionConfig::from_json(
        r#"{"resolution": "1280x720 (HD)", "fps": 60, "fonts": {"Impact": "fonts/impact.ttf"}}"#,
    )
    .unwrap();
    assert_eq!(cfg.canvas(), Canvas::new(1280, 720).unwrap());
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.seed, SessionConfig::default().seed);
    assert_eq!(
        cfg.fonts.get("Impact").map(|p| p.as_path()),
        Some(Path::new("fonts/impact.ttf"))
    );
}

#[test]
fn unreadable_resolution_falls_back_to_fhd() {
    let cfg = SessionConfig::from_json(r#"{"resolution": "Ultra wide"}"#).unwrap();
    assert_eq!(cfg.canvas(), Canvas::FHD);
}

#[test]
fn rejects_zero_fps_and_bad_timeout() {
    assert!(matches!(
        SessionConfig::from_json(r#"{"fps": 0}"#),
        Err(VjError::Validation(_))
    ));
    assert!(matches!(
        SessionConfig::from_json(r#"{"media_timeout_secs": -1.0}"#),
        Err(VjError::Validation(_))
    ));
    assert!(matches!(
        SessionConfig::from_json("{not json"),
        Err(VjError::Serde(_))
    ));
}
