//! PSO update engine: one synchronous swarm iteration.

use std::f32::consts::TAU;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::swarm::Swarm;
use crate::terrain::Terrain;
use crate::{ConfigError, Iteration, Position, SimulationError, Velocity};

/// Behavioral weights read (never written) by the update engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coefficients {
    /// Weight applied to a particle's previous velocity.
    pub inertia: f32,
    /// Pull strength toward a particle's own best-seen position.
    pub cognitive: f32,
    /// Pull strength toward the swarm's global best position.
    pub social: f32,
    /// Magnitude of the random exploration impulse.
    pub random_weight: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        // Clerc constriction values.
        Self {
            inertia: 0.729,
            cognitive: 1.49445,
            social: 1.49445,
            random_weight: 0.02,
        }
    }
}

impl Coefficients {
    /// Validates that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            (self.inertia, "inertia must be finite and non-negative"),
            (self.cognitive, "cognitive weight must be finite and non-negative"),
            (self.social, "social weight must be finite and non-negative"),
            (self.random_weight, "random weight must be finite and non-negative"),
        ];
        for (value, reason) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(reason));
            }
        }
        Ok(())
    }
}

/// How particles that step outside the terrain extent are handled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Clamp the position to the boundary and zero the offending velocity
    /// component, so the particle cannot immediately re-exit.
    #[default]
    ClampZero,
    /// Clamp the position to the boundary and negate the offending
    /// velocity component, bouncing the particle back inward.
    Reflect,
}

/// Result of a single swarm iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Global best fitness after the iteration.
    pub global_best_fitness: f32,
    /// Gain over the previous global best; infinite on the first
    /// iteration, when no best existed yet.
    pub improvement: f32,
}

impl StepOutcome {
    /// Whether the iteration improved the global best at all.
    #[must_use]
    pub fn improved(&self) -> bool {
        self.improvement > 0.0
    }
}

#[inline]
fn resolve_axis(value: f32, velocity: f32, extent: f32, policy: BoundaryPolicy) -> (f32, f32) {
    let bounced = match policy {
        BoundaryPolicy::ClampZero => 0.0,
        BoundaryPolicy::Reflect => -velocity,
    };
    if value < 0.0 {
        (0.0, bounced)
    } else if value > extent {
        (extent, bounced)
    } else {
        (value, velocity)
    }
}

/// Advance the swarm by one iteration against `terrain`.
///
/// For each particle in index order: evaluate fitness at the current
/// position, record personal-best improvements, refresh the global best
/// (earliest index wins ties), then integrate velocity and position. The
/// new velocity blends inertia, the cognitive pull toward the particle's
/// own best, the social pull toward the global best, and a random unit
/// perturbation, with each component clamped to `[-max_speed, max_speed]`.
/// Positions leaving `[0, extent]` are resolved per `policy`.
///
/// Any non-finite fitness, velocity, or position aborts the iteration.
pub fn step(
    swarm: &mut Swarm,
    terrain: &Terrain,
    coefficients: &Coefficients,
    max_speed: f32,
    policy: BoundaryPolicy,
    iteration: Iteration,
    rng: &mut SmallRng,
) -> Result<StepOutcome, SimulationError> {
    let count = swarm.len();

    for particle in 0..count {
        let position = swarm.columns().positions()[particle];
        let fitness = terrain.sample(position.x, position.y);
        if !fitness.is_finite() {
            return Err(SimulationError::NonFiniteFitness {
                iteration: iteration.0,
                particle,
            });
        }
        if fitness > swarm.columns().best_fitness()[particle] {
            swarm.columns_mut().record_best(particle, position, fitness);
        }
    }

    let previous_best = swarm.global_best_fitness();
    swarm.refresh_global_best();
    let global_best = swarm.global_best_position();
    let improvement = if previous_best == f32::NEG_INFINITY {
        f32::INFINITY
    } else {
        swarm.global_best_fitness() - previous_best
    };

    let extent = terrain.extent();
    for particle in 0..count {
        // One fixed draw sequence per particle keeps runs reproducible.
        let r1: f32 = rng.random();
        let r2: f32 = rng.random();
        let r3: f32 = rng.random();
        let angle: f32 = rng.random_range(0.0..TAU);

        let columns = swarm.columns_mut();
        let position = columns.positions()[particle];
        let best = columns.best_positions()[particle];
        let velocity = columns.velocities()[particle];

        let vx = coefficients.inertia * velocity.vx
            + coefficients.cognitive * r1 * (best.x - position.x)
            + coefficients.social * r2 * (global_best.x - position.x)
            + coefficients.random_weight * r3 * angle.cos();
        let vy = coefficients.inertia * velocity.vy
            + coefficients.cognitive * r1 * (best.y - position.y)
            + coefficients.social * r2 * (global_best.y - position.y)
            + coefficients.random_weight * r3 * angle.sin();

        let capped = Velocity::new(
            vx.clamp(-max_speed, max_speed),
            vy.clamp(-max_speed, max_speed),
        );
        if !capped.is_finite() {
            return Err(SimulationError::NonFiniteVelocity {
                iteration: iteration.0,
                particle,
            });
        }

        let (x, vx) = resolve_axis(position.x + capped.vx, capped.vx, extent, policy);
        let (y, vy) = resolve_axis(position.y + capped.vy, capped.vy, extent, policy);
        let moved = Position::new(x, y);
        if !moved.is_finite() {
            return Err(SimulationError::NonFinitePosition {
                iteration: iteration.0,
                particle,
            });
        }

        columns.positions_mut()[particle] = moved;
        columns.velocities_mut()[particle] = Velocity::new(vx, vy);
    }

    Ok(StepOutcome {
        global_best_fitness: swarm.global_best_fitness(),
        improvement,
    })
}
