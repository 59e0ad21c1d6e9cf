//! Plateau-driven coefficient schedule.
//!
//! As the global best stops improving, the flock should trade
//! exploration for exploitation: damp the inertia and random impulse,
//! strengthen the pull toward the global best.

use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::engine::Coefficients;

/// Adjusts behavioral coefficients between iterations.
///
/// Every adjustment clamps into the documented ranges, so tuned
/// coefficients are always finite and non-negative: inertia never drops
/// below `inertia_floor`, the random weight never drops below zero, and
/// the social weight never exceeds `social_ceiling`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AutoTuner {
    /// Multiplicative decay applied to inertia on plateau iterations.
    pub inertia_decay: f32,
    /// Lowest inertia the tuner will produce.
    pub inertia_floor: f32,
    /// Multiplicative decay applied to the random weight on plateaus.
    pub random_decay: f32,
    /// Multiplicative growth applied to the social weight on plateaus.
    pub social_growth: f32,
    /// Highest social weight the tuner will produce.
    pub social_ceiling: f32,
}

impl Default for AutoTuner {
    fn default() -> Self {
        Self {
            inertia_decay: 0.99,
            inertia_floor: 0.4,
            random_decay: 0.95,
            social_growth: 1.01,
            social_ceiling: 2.5,
        }
    }
}

impl AutoTuner {
    /// Validates decay factors, growth factors, and clamp bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.inertia_decay.is_finite()
            || self.inertia_decay <= 0.0
            || self.inertia_decay > 1.0
        {
            return Err(ConfigError::Invalid("inertia_decay must be in (0, 1]"));
        }
        if !self.random_decay.is_finite() || self.random_decay <= 0.0 || self.random_decay > 1.0 {
            return Err(ConfigError::Invalid("random_decay must be in (0, 1]"));
        }
        if !self.social_growth.is_finite() || self.social_growth < 1.0 {
            return Err(ConfigError::Invalid("social_growth must be at least 1.0"));
        }
        if !self.inertia_floor.is_finite() || self.inertia_floor < 0.0 {
            return Err(ConfigError::Invalid(
                "inertia_floor must be finite and non-negative",
            ));
        }
        if !self.social_ceiling.is_finite() || self.social_ceiling <= 0.0 {
            return Err(ConfigError::Invalid(
                "social_ceiling must be finite and positive",
            ));
        }
        Ok(())
    }

    /// Adjust `coefficients` given whether the last iteration improved
    /// the global best. Improvements leave the weights untouched.
    pub fn adjust(&self, coefficients: &mut Coefficients, improved: bool) {
        if improved {
            return;
        }
        coefficients.inertia =
            (coefficients.inertia * self.inertia_decay).max(self.inertia_floor);
        coefficients.random_weight = (coefficients.random_weight * self.random_decay).max(0.0);
        coefficients.social =
            (coefficients.social * self.social_growth).min(self.social_ceiling);
    }
}
