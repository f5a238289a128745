use super::*;

#[test]
fn ramp_interpolates_and_holds() {
    let mut g = GainParam::new(1.0);
    g.ramp(1.0, 0.0, 10.0, 2.0);
    assert_eq!(g.value_at(9.0), 1.0);
    assert!((g.value_at(11.0) - 0.5).abs() < 1e-6);
    assert_eq!(g.value_at(12.0), 0.0);
    assert_eq!(g.value_at(100.0), 0.0);
    assert!(g.is_ramping_at(11.0));
    assert!(!g.is_ramping_at(12.0));
}

#[test]
fn cancel_and_hold_freezes_midway() {
    let mut g = GainParam::new(0.0);
    g.ramp(0.0, 1.0, 0.0, 4.0);
    g.cancel_and_hold(1.0);
    assert!((g.value_at(50.0) - 0.25).abs() < 1e-6);
    g.set(0.8);
    assert_eq!(g.value_at(0.0), 0.8);
}

#[test]
fn zero_length_ramp_jumps() {
    let mut g = GainParam::default();
    g.ramp(1.0, 0.3, 5.0, 0.0);
    assert_eq!(g.value_at(5.0), 1.0);
    assert_eq!(g.value_at(5.0001), 0.3);
}
