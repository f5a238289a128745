use super::*;

#[test]
fn endpoints_are_exact() {
    for ease in [Ease::Linear, Ease::InOutSine] {
        assert!(ease.apply(0.0).abs() < 1e-12);
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12);
    }
}

#[test]
fn sine_is_symmetric_and_monotonic() {
    assert!((Ease::InOutSine.apply(0.5) - 0.5).abs() < 1e-12);
    let mut prev = 0.0;
    for i in 0..=100 {
        let v = Ease::InOutSine.apply(f64::from(i) / 100.0);
        assert!(v >= prev);
        prev = v;
    }
}

#[test]
fn out_of_range_input_is_clamped() {
    assert_eq!(Ease::InOutSine.apply(-3.0), 0.0);
    assert_eq!(Ease::Linear.apply(9.0), 1.0);
    assert_eq!(Ease::Linear.apply(f64::NAN), 0.0);
}
