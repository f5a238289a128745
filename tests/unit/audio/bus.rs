use super::*;

struct Constant {
    level: [f32; 3],
}

impl BusSource for Constant {
    fn fill(&mut self, channel: BusChannel, out: &mut [f32], _sample_rate: u32) {
        let v = match channel {
            BusChannel::DeckA => self.level[0],
            BusChannel::DeckB => self.level[1],
            BusChannel::Sfx => self.level[2],
        };
        out.fill(v);
    }
}

#[test]
fn clock_advances_with_rendered_frames() {
    let mut bus = SoftwareBus::new(1_000);
    let mut src = Constant { level: [0.0; 3] };
    bus.render(250, &mut src);
    assert!((bus.now() - 0.25).abs() < 1e-12);
    bus.render_secs(0.75, &mut src);
    assert!((bus.now() - 1.0).abs() < 1e-12);
}

#[test]
fn crossfade_gains_sum_to_one_and_land_exactly() {
    let mut bus = SoftwareBus::new(1_000);
    let mut src = Constant {
        level: [0.5, 0.5, 0.0],
    };
    bus.render(100, &mut src);
    bus.ramp_gain(BusChannel::DeckA, 1.0, 0.0, 2.0);
    bus.ramp_gain(BusChannel::DeckB, 0.0, 1.0, 2.0);
    for _ in 0..25 {
        let sum = bus.gain(BusChannel::DeckA) + bus.gain(BusChannel::DeckB);
        assert!(sum <= 1.0 + 1e-6, "sum {sum}");
        let out = bus.render(100, &mut src);
        assert!(out.iter().all(|s| *s <= 0.5 + 1e-6));
    }
    assert_eq!(bus.gain(BusChannel::DeckA), 0.0);
    assert_eq!(bus.gain(BusChannel::DeckB), 1.0);
}

#[test]
fn master_scales_and_output_clamps() {
    let mut bus = SoftwareBus::new(100);
    let mut src = Constant {
        level: [0.9, 0.0, 0.9],
    };
    let out = bus.render(10, &mut src);
    assert!(out.iter().all(|s| *s == 1.0));
    bus.set_master(0.25);
    let out = bus.render(10, &mut src);
    assert!(out.iter().all(|s| (*s - 0.45).abs() < 1e-6));
}

#[test]
fn deck_channel_mapping() {
    assert_eq!(BusChannel::deck(Slot::A), BusChannel::DeckA);
    assert_eq!(BusChannel::deck(Slot::B), BusChannel::DeckB);
}
