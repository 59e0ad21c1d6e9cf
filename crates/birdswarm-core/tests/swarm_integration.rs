use birdswarm_core::{
    BoundaryPolicy, Coefficients, Iteration, Position, PsoConfig, Simulation, Swarm, Terrain,
    TerrainConfig, Velocity, step,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn base_config(seed: u64) -> PsoConfig {
    PsoConfig {
        particles: 30,
        max_iterations: 80,
        rng_seed: Some(seed),
        ..PsoConfig::default()
    }
}

#[test]
fn identical_seeds_produce_identical_trajectories() {
    let mut first = Simulation::new(base_config(0xBEEF)).expect("simulation");
    let mut second = Simulation::new(base_config(0xBEEF)).expect("simulation");

    let left = first.run().expect("run");
    let right = second.run().expect("run");

    assert_eq!(left.frames, right.frames);
    assert_eq!(left.global_best_position, right.global_best_position);
    assert_eq!(left.global_best_fitness, right.global_best_fitness);
}

#[test]
fn different_seeds_diverge() {
    let mut first = Simulation::new(base_config(1)).expect("simulation");
    let mut second = Simulation::new(base_config(2)).expect("simulation");
    let left = first.run().expect("run");
    let right = second.run().expect("run");
    assert_ne!(left.frames, right.frames);
}

#[test]
fn global_best_is_monotonically_non_decreasing() {
    let mut sim = Simulation::new(base_config(7)).expect("simulation");
    let outcome = sim.run().expect("run");
    for pair in outcome.frames.windows(2) {
        assert!(
            pair[1].global_best_fitness >= pair[0].global_best_fitness,
            "global best regressed between iterations {} and {}",
            pair[0].iteration,
            pair[1].iteration,
        );
    }
}

#[test]
fn speed_cap_and_bounds_hold_every_iteration() {
    for boundary in [BoundaryPolicy::ClampZero, BoundaryPolicy::Reflect] {
        let config = PsoConfig {
            boundary,
            ..base_config(13)
        };
        let max_speed = config.max_speed;
        let extent = config.terrain.size as f32;
        let mut sim = Simulation::new(config).expect("simulation");
        let outcome = sim.run().expect("run");

        for frame in &outcome.frames {
            for velocity in &frame.velocities {
                assert!(velocity.vx.abs() <= max_speed, "{boundary:?}: vx over cap");
                assert!(velocity.vy.abs() <= max_speed, "{boundary:?}: vy over cap");
            }
            for position in &frame.positions {
                assert!(
                    (0.0..=extent).contains(&position.x)
                        && (0.0..=extent).contains(&position.y),
                    "{boundary:?}: particle escaped at iteration {}",
                    frame.iteration,
                );
            }
        }
    }
}

/// A lone bird already perched on the summit, with no social pull and no
/// random impulse, has nowhere better to go: the global best locks in on
/// the first iteration and the bird never drifts.
#[test]
fn particle_pinned_at_the_summit_does_not_drift() {
    let terrain_config = TerrainConfig {
        size: 50,
        seed: 42,
        ..TerrainConfig::default()
    };
    let terrain = Terrain::generate(&terrain_config).expect("terrain");
    let (peak_x, peak_y, peak_value) = terrain.max_cell();
    let peak = Position::new(peak_x as f32, peak_y as f32);

    let mut swarm =
        Swarm::from_parts(vec![peak], vec![Velocity::default()]).expect("swarm");
    let coefficients = Coefficients {
        inertia: 0.7,
        cognitive: 1.5,
        social: 0.0,
        random_weight: 0.0,
    };
    let mut rng = SmallRng::seed_from_u64(99);

    for it in 1..=10 {
        let outcome = step(
            &mut swarm,
            &terrain,
            &coefficients,
            2.0,
            BoundaryPolicy::ClampZero,
            Iteration(it),
            &mut rng,
        )
        .expect("step");
        assert_eq!(outcome.global_best_fitness, peak_value);
        assert_eq!(swarm.columns().positions()[0], peak);
        assert_eq!(swarm.columns().velocities()[0], Velocity::default());
    }
    assert_eq!(swarm.global_best_position(), peak);
}

/// Regression fixture for the `size=50, seed=42` landscape: regeneration
/// is bit-identical, integer-coordinate samples equal their grid cells,
/// midpoint samples equal the bilinear corner blend, and out-of-domain
/// samples fall back.
#[test]
fn terrain_fixture_size50_seed42() {
    let config = TerrainConfig {
        size: 50,
        seed: 42,
        ..TerrainConfig::default()
    };
    let terrain = Terrain::generate(&config).expect("terrain");
    let again = Terrain::generate(&config).expect("terrain");
    assert_eq!(terrain.cells(), again.cells());

    let cell = terrain.get(12, 34).expect("cell");
    assert_eq!(terrain.sample(12.0, 34.0), cell);

    let c00 = terrain.get(12, 34).expect("cell");
    let c10 = terrain.get(13, 34).expect("cell");
    let c01 = terrain.get(12, 35).expect("cell");
    let c11 = terrain.get(13, 35).expect("cell");
    let center = terrain.sample(12.5, 34.5);
    let blended = (c00 + c10 + c01 + c11) * 0.25;
    assert!((center - blended).abs() < 1e-5);

    assert_eq!(terrain.sample(50.0, 0.0), terrain.fallback());
    assert_eq!(terrain.sample(0.0, -0.5), terrain.fallback());
}

#[test]
fn auto_tuning_runs_stay_valid_and_deterministic() {
    let config = PsoConfig {
        auto_tune: true,
        ..base_config(0xFEED)
    };
    let mut first = Simulation::new(config.clone()).expect("simulation");
    let mut second = Simulation::new(config).expect("simulation");

    let left = first.run().expect("run");
    let right = second.run().expect("run");
    assert_eq!(left.frames, right.frames);

    // Whatever the tuner did, the working coefficients are still legal.
    assert!(first.coefficients().validate().is_ok());
}

#[test]
fn frames_serialize_for_the_external_renderer() {
    let config = PsoConfig {
        particles: 4,
        max_iterations: 3,
        rng_seed: Some(3),
        ..PsoConfig::default()
    };
    let mut sim = Simulation::new(config).expect("simulation");
    let outcome = sim.run().expect("run");

    let json = serde_json::to_string(&outcome).expect("serialize");
    let parsed: birdswarm_core::RunOutcome = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed, outcome);
}
