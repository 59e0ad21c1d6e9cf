//! Core types shared across the birdswarm workspace.
//!
//! The simulation models a flock of birds searching a noise-generated
//! landscape for its highest point using particle swarm optimization:
//! each bird balances its own memory of good terrain against the flock's
//! collective knowledge, plus a small random exploration impulse.

pub mod engine;
pub mod sim;
pub mod swarm;
pub mod terrain;
pub mod tuning;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::{BoundaryPolicy, Coefficients, StepOutcome, step};
pub use sim::{
    ConvergencePolicy, FrameSnapshot, PsoConfig, RunOutcome, Simulation, StopReason,
};
pub use swarm::{Swarm, SwarmColumns};
pub use terrain::{Terrain, TerrainConfig};
pub use tuning::AutoTuner;

/// Simulation clock (iterations completed since the run started).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Iteration(pub u64);

impl Iteration {
    /// Returns the next sequential iteration.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the iteration counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Axis-aligned 2D position over the terrain domain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Per-iteration displacement of a particle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    /// Construct a new velocity vector.
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.vx.is_finite() && self.vy.is_finite()
    }
}

/// Errors raised while validating configuration, before any iteration runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Errors raised mid-run. The computation is deterministic given its seed,
/// so a failed run is reported to the caller rather than retried.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("non-finite fitness for particle {particle} at iteration {iteration}")]
    NonFiniteFitness { iteration: u64, particle: usize },
    #[error("non-finite velocity for particle {particle} at iteration {iteration}")]
    NonFiniteVelocity { iteration: u64, particle: usize },
    #[error("non-finite position for particle {particle} at iteration {iteration}")]
    NonFinitePosition { iteration: u64, particle: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
