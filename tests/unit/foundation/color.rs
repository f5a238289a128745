use super::*;
use serde_json::json;

#[test]
fn parses_short_long_and_alpha_hex() {
    assert_eq!(Color::parse_hex("#fff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse_hex("#FF0000").unwrap(), Color::rgb8(255, 0, 0));
    let c = Color::parse_hex("0000ff80").unwrap();
    assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
    assert!(Color::parse_hex("#12345").is_err());
    assert!(Color::parse_hex("#gg0000").is_err());
}

#[test]
fn hsl_primaries() {
    let red = Color::hsla(0.0, 1.0, 0.5, 1.0);
    assert_eq!(red.to_rgba8_straight(), [255, 0, 0, 255]);
    let wrapped = Color::hsla(480.0, 1.0, 0.5, 1.0);
    assert_eq!(wrapped.to_rgba8_straight(), [0, 255, 0, 255]);
    let gray = Color::hsla(123.0, 0.0, 0.5, 1.0);
    assert_eq!(gray.to_rgba8_straight(), [128, 128, 128, 255]);
}

#[test]
fn serde_uses_hex_strings() {
    let c: Color = serde_json::from_value(json!("#10b981")).unwrap();
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#10b981"));
    let c: Color = serde_json::from_value(json!({"r": 1.0, "g": 0.0, "b": 0.0, "a": 0.5})).unwrap();
    assert_eq!(c.to_hex(), "#ff000080");
}

#[test]
fn premul_and_lerp() {
    let c = Color::rgba(1.0, 0.5, 0.0, 0.5).to_rgba8_premul();
    assert_eq!([c.r, c.g, c.b, c.a], [128, 64, 0, 128]);
    let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
    assert!((mid.r - 0.5).abs() < 1e-9);
    assert_eq!(Color::WHITE.lerp(Color::BLACK, 7.0), Color::BLACK);
}
