//! Simulation runner: owns one terrain and one swarm, drives the engine.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::engine::{BoundaryPolicy, Coefficients, step};
use crate::swarm::Swarm;
use crate::terrain::{Terrain, TerrainConfig};
use crate::tuning::AutoTuner;
use crate::{ConfigError, Iteration, Position, SimulationError, Velocity};

/// Early-stop rule: end the run once the global best has improved by at
/// most `tolerance` for `patience` consecutive iterations. A zero
/// tolerance stops only on exact plateaus, where the global best did not
/// move at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConvergencePolicy {
    /// Consecutive plateau iterations required before stopping.
    pub patience: u32,
    /// Largest per-iteration gain still counted as a plateau.
    pub tolerance: f32,
}

impl ConvergencePolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.patience == 0 {
            return Err(ConfigError::Invalid(
                "convergence patience must be non-zero",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "convergence tolerance must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Static configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PsoConfig {
    /// Number of particles in the swarm.
    pub particles: usize,
    /// Landscape generation parameters.
    pub terrain: TerrainConfig,
    /// Initial behavioral weights.
    pub coefficients: Coefficients,
    /// Iteration budget for the run.
    pub max_iterations: u32,
    /// Per-component velocity cap, in world units per iteration.
    pub max_speed: f32,
    /// How particles leaving the terrain extent are handled.
    pub boundary: BoundaryPolicy,
    /// Optional early-stop rule; absent means the full budget runs.
    pub convergence: Option<ConvergencePolicy>,
    /// Whether the auto-tuner adjusts coefficients between iterations.
    pub auto_tune: bool,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            particles: 50,
            terrain: TerrainConfig::default(),
            coefficients: Coefficients::default(),
            max_iterations: 120,
            max_speed: 2.0,
            boundary: BoundaryPolicy::default(),
            convergence: None,
            auto_tune: false,
            rng_seed: None,
        }
    }
}

impl PsoConfig {
    /// Validates the whole configuration before any state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particles == 0 {
            return Err(ConfigError::Invalid("particle count must be non-zero"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be non-zero"));
        }
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(ConfigError::Invalid(
                "max_speed must be finite and positive",
            ));
        }
        self.terrain.validate()?;
        self.coefficients.validate()?;
        if let Some(convergence) = &self.convergence {
            convergence.validate()?;
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// One recorded frame of swarm state, consumed by an external renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub iteration: u64,
    pub positions: Vec<Position>,
    pub velocities: Vec<Velocity>,
    pub global_best_position: Position,
    pub global_best_fitness: f32,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The full iteration budget was consumed.
    IterationBudget,
    /// The convergence policy fired early.
    Converged,
}

/// Final result of a run: the frame sequence plus the best record found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub frames: Vec<FrameSnapshot>,
    pub iterations: u32,
    pub stop: StopReason,
    pub global_best_position: Position,
    pub global_best_fitness: f32,
}

/// A single simulation run: one terrain, one swarm, one RNG stream.
///
/// Construction validates the configuration and builds all state up
/// front; a failed construction leaves nothing half-initialized. The run
/// itself is single-threaded and synchronous, and deterministic for a
/// given seed.
#[derive(Debug)]
pub struct Simulation {
    config: PsoConfig,
    terrain: Terrain,
    swarm: Swarm,
    coefficients: Coefficients,
    tuner: AutoTuner,
    rng: SmallRng,
    iteration: Iteration,
}

impl Simulation {
    /// Build a simulation from a validated configuration.
    pub fn new(config: PsoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let terrain = Terrain::generate(&config.terrain)?;
        let mut rng = config.seeded_rng();
        let swarm = Swarm::spawn(
            config.particles,
            terrain.extent(),
            config.max_speed,
            &mut rng,
        )?;
        Ok(Self {
            coefficients: config.coefficients,
            tuner: AutoTuner::default(),
            config,
            terrain,
            swarm,
            rng,
            iteration: Iteration::zero(),
        })
    }

    /// Build a simulation around an explicitly constructed swarm.
    ///
    /// The terrain and coefficients still come from `config`; used by
    /// tests and replay tooling that need full control over particle
    /// placement.
    pub fn with_swarm(config: PsoConfig, swarm: Swarm) -> Result<Self, ConfigError> {
        config.validate()?;
        if swarm.len() != config.particles {
            return Err(ConfigError::Invalid(
                "swarm size must match configured particle count",
            ));
        }
        let terrain = Terrain::generate(&config.terrain)?;
        let rng = config.seeded_rng();
        Ok(Self {
            coefficients: config.coefficients,
            tuner: AutoTuner::default(),
            config,
            terrain,
            swarm,
            rng,
            iteration: Iteration::zero(),
        })
    }

    /// The configuration this simulation was built from.
    #[must_use]
    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// The generated landscape.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Current swarm state.
    #[must_use]
    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    /// Current behavioral weights (the tuner may have moved them).
    #[must_use]
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            iteration: self.iteration.0,
            positions: self.swarm.columns().positions().to_vec(),
            velocities: self.swarm.columns().velocities().to_vec(),
            global_best_position: self.swarm.global_best_position(),
            global_best_fitness: self.swarm.global_best_fitness(),
        }
    }

    /// Run to the iteration budget or convergence, whichever comes first.
    ///
    /// Records one frame per completed iteration, so `frames.len()`
    /// equals the number of iterations actually run.
    pub fn run(&mut self) -> Result<RunOutcome, SimulationError> {
        let mut frames = Vec::with_capacity(self.config.max_iterations as usize);
        let mut stop = StopReason::IterationBudget;
        let mut plateau = 0u32;

        for _ in 0..self.config.max_iterations {
            self.iteration = self.iteration.next();
            let outcome = step(
                &mut self.swarm,
                &self.terrain,
                &self.coefficients,
                self.config.max_speed,
                self.config.boundary,
                self.iteration,
                &mut self.rng,
            )?;
            frames.push(self.snapshot());

            if self.config.auto_tune {
                self.tuner.adjust(&mut self.coefficients, outcome.improved());
            }

            if let Some(convergence) = &self.config.convergence {
                if outcome.improvement <= convergence.tolerance {
                    plateau += 1;
                } else {
                    plateau = 0;
                }
                if plateau >= convergence.patience {
                    stop = StopReason::Converged;
                    break;
                }
            }
        }

        Ok(RunOutcome {
            iterations: frames.len() as u32,
            stop,
            global_best_position: self.swarm.global_best_position(),
            global_best_fitness: self.swarm.global_best_fitness(),
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_bad_configs_before_any_state_exists() {
        let zero_particles = PsoConfig {
            particles: 0,
            ..PsoConfig::default()
        };
        assert!(Simulation::new(zero_particles).is_err());

        let zero_iterations = PsoConfig {
            max_iterations: 0,
            ..PsoConfig::default()
        };
        assert!(Simulation::new(zero_iterations).is_err());

        let bad_speed = PsoConfig {
            max_speed: 0.0,
            ..PsoConfig::default()
        };
        assert!(Simulation::new(bad_speed).is_err());

        let negative_weight = PsoConfig {
            coefficients: Coefficients {
                social: -1.0,
                ..Coefficients::default()
            },
            ..PsoConfig::default()
        };
        assert!(Simulation::new(negative_weight).is_err());

        let zero_terrain = PsoConfig {
            terrain: TerrainConfig {
                size: 0,
                ..TerrainConfig::default()
            },
            ..PsoConfig::default()
        };
        assert!(Simulation::new(zero_terrain).is_err());
    }

    #[test]
    fn run_records_one_frame_per_iteration() {
        let config = PsoConfig {
            particles: 12,
            max_iterations: 25,
            rng_seed: Some(5),
            ..PsoConfig::default()
        };
        let mut sim = Simulation::new(config).expect("simulation");
        let outcome = sim.run().expect("run");
        assert_eq!(outcome.iterations, 25);
        assert_eq!(outcome.frames.len(), 25);
        assert_eq!(outcome.stop, StopReason::IterationBudget);
        assert_eq!(outcome.frames[0].iteration, 1);
        assert_eq!(outcome.frames[24].iteration, 25);
        for frame in &outcome.frames {
            assert_eq!(frame.positions.len(), 12);
            assert_eq!(frame.velocities.len(), 12);
        }
    }

    #[test]
    fn with_swarm_checks_the_particle_count() {
        let config = PsoConfig {
            particles: 2,
            rng_seed: Some(1),
            ..PsoConfig::default()
        };
        let swarm = Swarm::from_parts(
            vec![Position::new(1.0, 1.0)],
            vec![Velocity::default()],
        )
        .expect("swarm");
        assert!(Simulation::with_swarm(config, swarm).is_err());
    }

    #[test]
    fn loose_tolerance_converges_early() {
        let config = PsoConfig {
            particles: 20,
            max_iterations: 200,
            rng_seed: Some(21),
            convergence: Some(ConvergencePolicy {
                patience: 5,
                // Elevations live in [0, 1], so every post-discovery gain
                // counts as a plateau.
                tolerance: 10.0,
            }),
            ..PsoConfig::default()
        };
        let mut sim = Simulation::new(config).expect("simulation");
        let outcome = sim.run().expect("run");
        assert_eq!(outcome.stop, StopReason::Converged);
        assert!(outcome.iterations < 200);
    }

    #[test]
    fn zero_tolerance_fires_on_exact_plateaus() {
        // One bird pinned on the summit with no social or random pull:
        // the global best locks in on iteration 1 and never moves, so a
        // zero tolerance must still end the run after `patience` flat
        // iterations.
        let terrain_config = TerrainConfig {
            size: 50,
            seed: 42,
            ..TerrainConfig::default()
        };
        let terrain = Terrain::generate(&terrain_config).expect("terrain");
        let (peak_x, peak_y, _) = terrain.max_cell();

        let config = PsoConfig {
            particles: 1,
            terrain: terrain_config,
            coefficients: Coefficients {
                inertia: 0.7,
                cognitive: 1.5,
                social: 0.0,
                random_weight: 0.0,
            },
            max_iterations: 50,
            rng_seed: Some(11),
            convergence: Some(ConvergencePolicy {
                patience: 3,
                tolerance: 0.0,
            }),
            ..PsoConfig::default()
        };
        let swarm = Swarm::from_parts(
            vec![Position::new(peak_x as f32, peak_y as f32)],
            vec![Velocity::default()],
        )
        .expect("swarm");

        let mut sim = Simulation::with_swarm(config, swarm).expect("simulation");
        let outcome = sim.run().expect("run");
        assert_eq!(outcome.stop, StopReason::Converged);
        assert_eq!(outcome.iterations, 4);
    }

    #[test]
    fn convergence_policy_itself_is_validated() {
        let config = PsoConfig {
            convergence: Some(ConvergencePolicy {
                patience: 0,
                tolerance: 0.1,
            }),
            ..PsoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
