//! Swarm state: particle columns plus the derived global best.

use ordered_float::OrderedFloat;
use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Position, Velocity};

/// Collection of per-particle columns for hot-path iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SwarmColumns {
    positions: Vec<Position>,
    velocities: Vec<Velocity>,
    best_positions: Vec<Position>,
    best_fitness: Vec<f32>,
}

impl SwarmColumns {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            best_positions: Vec::with_capacity(capacity),
            best_fitness: Vec::with_capacity(capacity),
        }
    }

    /// Number of particles in the columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if there are no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a new particle row onto each column.
    ///
    /// The personal best starts at negative infinity so the first fitness
    /// evaluation always records.
    pub fn push(&mut self, position: Position, velocity: Velocity) {
        self.positions.push(position);
        self.velocities.push(velocity);
        self.best_positions.push(position);
        self.best_fitness.push(f32::NEG_INFINITY);
        self.debug_assert_coherent();
    }

    /// Record an improved personal best for the particle at `index`.
    pub fn record_best(&mut self, index: usize, position: Position, fitness: f32) {
        self.best_positions[index] = position;
        self.best_fitness[index] = fitness;
    }

    /// Immutable access to the positions column.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Mutable access to the positions column.
    #[must_use]
    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    /// Immutable access to the velocities column.
    #[must_use]
    pub fn velocities(&self) -> &[Velocity] {
        &self.velocities
    }

    /// Mutable access to the velocities column.
    #[must_use]
    pub fn velocities_mut(&mut self) -> &mut [Velocity] {
        &mut self.velocities
    }

    /// Immutable access to the personal-best positions column.
    #[must_use]
    pub fn best_positions(&self) -> &[Position] {
        &self.best_positions
    }

    /// Immutable access to the personal-best fitness column.
    #[must_use]
    pub fn best_fitness(&self) -> &[f32] {
        &self.best_fitness
    }

    #[inline]
    fn debug_assert_coherent(&self) {
        debug_assert_eq!(self.positions.len(), self.velocities.len());
        debug_assert_eq!(self.positions.len(), self.best_positions.len());
        debug_assert_eq!(self.positions.len(), self.best_fitness.len());
    }
}

/// Ordered particle collection plus the swarm-level best record.
///
/// Invariant maintained by the update engine: after every iteration the
/// global best equals the maximum personal-best fitness across all
/// particles, tie-broken toward the earliest index, and never decreases
/// over the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Swarm {
    columns: SwarmColumns,
    global_best_position: Position,
    global_best_fitness: f32,
    global_best_index: usize,
}

impl Swarm {
    /// Spawn `count` particles uniformly over `[0, extent)`.
    ///
    /// Every particle starts at exactly `max_speed`: the x component is a
    /// random share of the speed budget, the y component takes the rest,
    /// and each axis gets an independent random sign.
    pub fn spawn(
        count: usize,
        extent: f32,
        max_speed: f32,
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::Invalid("particle count must be non-zero"));
        }
        if !extent.is_finite() || extent <= 0.0 {
            return Err(ConfigError::Invalid("extent must be finite and positive"));
        }
        if !max_speed.is_finite() || max_speed <= 0.0 {
            return Err(ConfigError::Invalid(
                "max_speed must be finite and positive",
            ));
        }

        let mut columns = SwarmColumns::with_capacity(count);
        for _ in 0..count {
            let position = Position::new(
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
            );
            let vx = rng.random::<f32>() * max_speed;
            let vy = (max_speed * max_speed - vx * vx).max(0.0).sqrt();
            let sx = if rng.random::<bool>() { 1.0 } else { -1.0 };
            let sy = if rng.random::<bool>() { 1.0 } else { -1.0 };
            columns.push(position, Velocity::new(vx * sx, vy * sy));
        }

        Ok(Self {
            columns,
            global_best_position: Position::default(),
            global_best_fitness: f32::NEG_INFINITY,
            global_best_index: 0,
        })
    }

    /// Build a swarm from explicit particle state.
    ///
    /// Used by tests and replay tooling; personal bests start unset.
    pub fn from_parts(
        positions: Vec<Position>,
        velocities: Vec<Velocity>,
    ) -> Result<Self, ConfigError> {
        if positions.is_empty() {
            return Err(ConfigError::Invalid("particle count must be non-zero"));
        }
        if positions.len() != velocities.len() {
            return Err(ConfigError::Invalid(
                "positions and velocities must have equal length",
            ));
        }
        let mut columns = SwarmColumns::with_capacity(positions.len());
        for (position, velocity) in positions.into_iter().zip(velocities) {
            columns.push(position, velocity);
        }
        Ok(Self {
            columns,
            global_best_position: Position::default(),
            global_best_fitness: f32::NEG_INFINITY,
            global_best_index: 0,
        })
    }

    /// Number of particles in the swarm.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the swarm holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Borrow the underlying column storage.
    #[must_use]
    pub fn columns(&self) -> &SwarmColumns {
        &self.columns
    }

    /// Mutably borrow the underlying column storage.
    #[must_use]
    pub fn columns_mut(&mut self) -> &mut SwarmColumns {
        &mut self.columns
    }

    /// Best position found by any particle so far.
    #[must_use]
    pub const fn global_best_position(&self) -> Position {
        self.global_best_position
    }

    /// Best fitness found by any particle so far.
    #[must_use]
    pub const fn global_best_fitness(&self) -> f32 {
        self.global_best_fitness
    }

    /// Index of the particle holding the global best record.
    #[must_use]
    pub const fn global_best_index(&self) -> usize {
        self.global_best_index
    }

    /// Recompute the global best from the personal-best column.
    ///
    /// Strict comparison keeps the earliest-indexed particle's record on
    /// ties, so repeated refreshes are deterministic.
    pub fn refresh_global_best(&mut self) {
        let fitness = self.columns.best_fitness();
        let mut best_index = 0;
        let mut best_value = OrderedFloat(fitness[0]);
        for (index, &value) in fitness.iter().enumerate().skip(1) {
            if OrderedFloat(value) > best_value {
                best_index = index;
                best_value = OrderedFloat(value);
            }
        }
        self.global_best_index = best_index;
        self.global_best_fitness = best_value.into_inner();
        self.global_best_position = self.columns.best_positions()[best_index];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn spawn_places_particles_inside_extent_at_full_speed() {
        let mut rng = SmallRng::seed_from_u64(7);
        let swarm = Swarm::spawn(32, 50.0, 2.0, &mut rng).expect("swarm");
        assert_eq!(swarm.len(), 32);
        for position in swarm.columns().positions() {
            assert!((0.0..50.0).contains(&position.x));
            assert!((0.0..50.0).contains(&position.y));
        }
        for velocity in swarm.columns().velocities() {
            let speed = (velocity.vx * velocity.vx + velocity.vy * velocity.vy).sqrt();
            assert!((speed - 2.0).abs() < 1e-4, "spawn speed {speed} != max");
        }
    }

    #[test]
    fn spawn_is_deterministic_per_seed() {
        let mut a = SmallRng::seed_from_u64(11);
        let mut b = SmallRng::seed_from_u64(11);
        let left = Swarm::spawn(8, 50.0, 2.0, &mut a).expect("swarm");
        let right = Swarm::spawn(8, 50.0, 2.0, &mut b).expect("swarm");
        assert_eq!(left, right);
    }

    #[test]
    fn spawn_rejects_invalid_parameters() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(Swarm::spawn(0, 50.0, 2.0, &mut rng).is_err());
        assert!(Swarm::spawn(4, 0.0, 2.0, &mut rng).is_err());
        assert!(Swarm::spawn(4, 50.0, -1.0, &mut rng).is_err());
    }

    #[test]
    fn from_parts_requires_matching_lengths() {
        let err = Swarm::from_parts(vec![Position::default()], Vec::new());
        assert!(err.is_err());
        assert!(Swarm::from_parts(Vec::new(), Vec::new()).is_err());

        let swarm = Swarm::from_parts(
            vec![Position::new(1.0, 2.0)],
            vec![Velocity::new(0.5, -0.5)],
        )
        .expect("swarm");
        assert_eq!(swarm.len(), 1);
        assert_eq!(swarm.columns().best_fitness()[0], f32::NEG_INFINITY);
    }

    #[test]
    fn refresh_keeps_earliest_record_on_ties() {
        let mut swarm = Swarm::from_parts(
            vec![
                Position::new(1.0, 1.0),
                Position::new(2.0, 2.0),
                Position::new(3.0, 3.0),
            ],
            vec![Velocity::default(); 3],
        )
        .expect("swarm");

        swarm.columns_mut().record_best(0, Position::new(1.0, 1.0), 0.8);
        swarm.columns_mut().record_best(1, Position::new(2.0, 2.0), 0.8);
        swarm.columns_mut().record_best(2, Position::new(3.0, 3.0), 0.5);
        swarm.refresh_global_best();

        assert_eq!(swarm.global_best_index(), 0);
        assert_eq!(swarm.global_best_fitness(), 0.8);
        assert_eq!(swarm.global_best_position(), Position::new(1.0, 1.0));
    }
}
