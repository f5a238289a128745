use super::*;

fn canvas() -> Canvas {
    Canvas::new(640, 360).unwrap()
}

fn config(kind: ParticleKind, density: usize) -> ParticleConfig {
    ParticleConfig {
        effect: Some(kind),
        density,
        ..ParticleConfig::default()
    }
}

#[test]
fn pool_size_matches_density_after_many_steps() {
    for kind in ParticleKind::ALL {
        let cfg = config(kind, 57);
        let mut sim = ParticleSim::new(11);
        sim.sync(&cfg, canvas());
        for _ in 0..400 {
            sim.step(&cfg, 1.0);
            sim.sync(&cfg, canvas());
        }
        assert_eq!(sim.len(), 57, "{kind:?}");
    }
}

#[test]
fn kind_or_density_change_regenerates() {
    let mut sim = ParticleSim::new(3);
    let cfg = config(ParticleKind::Snow, 10);
    sim.sync(&cfg, canvas());
    let before = sim.particles().to_vec();
    sim.sync(&cfg, canvas());
    assert_eq!(sim.particles(), &before[..]);

    sim.sync(&config(ParticleKind::Party, 10), canvas());
    assert_eq!(sim.kind(), Some(ParticleKind::Party));
    assert!(sim.particles().iter().all(|p| p.color.is_some()));

    sim.sync(&config(ParticleKind::Party, 3), canvas());
    assert_eq!(sim.len(), 3);

    let off = ParticleConfig {
        effect: None,
        ..ParticleConfig::default()
    };
    sim.sync(&off, canvas());
    assert!(sim.is_empty());
    assert!(sim.draw(&off, 0.0).is_none());
}

#[test]
fn rain_falls_and_bubbles_rise() {
    let mut sim = ParticleSim::new(5);
    let rain = config(ParticleKind::Rain, 1);
    sim.sync(&rain, canvas());
    let y0 = sim.particles()[0].y;
    sim.step(&rain, 0.01);
    assert!(sim.particles()[0].y > y0);

    let bubble = config(ParticleKind::Bubble, 1);
    sim.sync(&bubble, canvas());
    let y0 = sim.particles()[0].y;
    sim.step(&bubble, 0.01);
    assert!(sim.particles()[0].y < y0);
}

#[test]
fn recycling_reseeds_attributes() {
    let cfg = config(ParticleKind::Rain, 1);
    let mut sim = ParticleSim::new(8);
    sim.sync(&cfg, canvas());
    let first = sim.particles()[0];
    // Rain moves at least 4 px per tick; 200 ticks leave the canvas.
    let mut recycled = false;
    for _ in 0..200 {
        let before = sim.particles()[0];
        sim.step(&cfg, 1.0);
        let after = sim.particles()[0];
        if after.y < before.y {
            recycled = true;
            assert_ne!(after.z, first.z);
            break;
        }
    }
    assert!(recycled);
}

#[test]
fn zero_dt_freezes_motion() {
    let cfg = config(ParticleKind::Snow, 20);
    let mut sim = ParticleSim::new(1);
    sim.sync(&cfg, canvas());
    let before = sim.particles().to_vec();
    sim.step(&cfg, 0.0);
    assert_eq!(sim.particles(), &before[..]);
}

#[test]
fn draw_emits_ops_and_reacts_to_bass() {
    let mut cfg = config(ParticleKind::Dust, 4);
    cfg.opacity = 40.0;
    let mut sim = ParticleSim::new(2);
    sim.sync(&cfg, canvas());
    let quiet = sim.draw(&cfg, 0.0).unwrap();
    assert_eq!(quiet.ops.len(), 4);
    assert!((quiet.attrs.opacity - 0.4).abs() < 1e-6);

    let loud = sim.draw(&cfg, 1.0).unwrap();
    let scale_of = |op: &DrawOp| match op {
        DrawOp::Fill { transform, .. } => transform.as_coeffs()[0].hypot(transform.as_coeffs()[1]),
        _ => 0.0,
    };
    let q = scale_of(&quiet.ops[0]);
    let l = scale_of(&loud.ops[0]);
    assert!((l / q - 1.5).abs() < 1e-9);

    cfg.audio_react = false;
    let flat = sim.draw(&cfg, 1.0).unwrap();
    assert!((scale_of(&flat.ops[0]) - q).abs() < 1e-9);
}

#[test]
fn every_kind_draws() {
    for kind in ParticleKind::ALL {
        let cfg = config(kind, 3);
        let mut sim = ParticleSim::new(4);
        sim.sync(&cfg, canvas());
        let layer = sim.draw(&cfg, 0.2).unwrap();
        assert!(layer.ops.len() >= 3, "{kind:?}");
    }
    let mut sim = ParticleSim::new(4);
    let cfg = config(ParticleKind::Firefly, 2);
    sim.sync(&cfg, canvas());
    assert!(sim.draw(&cfg, 0.0).unwrap().attrs.shadow.is_some());
}

#[test]
fn zero_speed_multiplier_freezes_every_kind() {
    for kind in ParticleKind::ALL {
        let cfg = ParticleConfig {
            speed: 0.0,
            ..config(kind, 12)
        };
        let mut sim = ParticleSim::new(6);
        sim.sync(&cfg, canvas());
        let before = sim.particles().to_vec();
        sim.step(&cfg, 1.0);
        assert_eq!(sim.particles(), &before[..], "{kind:?}");
    }
}

#[test]
fn loaded_density_is_clamped_to_the_ceiling() {
    let cfg = config(ParticleKind::Dust, ParticleConfig::MAX_DENSITY + 5);
    let mut sim = ParticleSim::new(1);
    sim.sync(&cfg, Canvas::new(64, 36).unwrap());
    assert_eq!(sim.len(), ParticleConfig::MAX_DENSITY);
}
