//! Noise-generated elevation landscape the swarm searches.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const OCTAVE_GAIN: f64 = 0.5;
const OCTAVE_LACUNARITY: f64 = 2.0;

/// Parameters controlling terrain generation.
///
/// `scale` is the number of base-octave noise cycles across the map, so
/// larger values produce more, smaller hills. `exponent` reshapes the
/// normalized elevation (values above 1.0 flatten valleys and sharpen
/// peaks). `fallback` is the elevation reported for samples outside the
/// grid domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TerrainConfig {
    /// Side length of the square elevation grid, in cells.
    pub size: u32,
    /// Noise seed; the same seed always reproduces the same landscape.
    pub seed: u64,
    /// Base noise frequency expressed as cycles across the map.
    pub scale: f32,
    /// Redistribution exponent applied to the normalized elevation.
    pub exponent: f32,
    /// Number of fBm octaves summed per cell.
    pub octaves: u32,
    /// Elevation returned for out-of-domain samples.
    pub fallback: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 50,
            seed: 0,
            scale: 3.0,
            exponent: 2.0,
            octaves: 4,
            fallback: 0.25,
        }
    }
}

impl TerrainConfig {
    /// Validates the configuration without generating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::Invalid("terrain size must be non-zero"));
        }
        if self.octaves == 0 {
            return Err(ConfigError::Invalid("terrain octaves must be non-zero"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::Invalid(
                "terrain scale must be finite and positive",
            ));
        }
        if !self.exponent.is_finite() || self.exponent <= 0.0 {
            return Err(ConfigError::Invalid(
                "terrain exponent must be finite and positive",
            ));
        }
        if !self.fallback.is_finite() {
            return Err(ConfigError::Invalid("terrain fallback must be finite"));
        }
        Ok(())
    }
}

/// Immutable square height field with continuous-coordinate sampling.
///
/// Elevations are normalized to `[0, 1]`. Grid points sit at integer
/// coordinates `0..size`; queries between them are bilinearly
/// interpolated, and queries outside `[0, size - 1]` on either axis
/// return the configured fallback instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    size: u32,
    fallback: f32,
    cells: Vec<f32>,
}

impl Terrain {
    /// Generate a landscape from fBm-summed Perlin octaves.
    ///
    /// Deterministic: the same configuration always yields the same grid.
    pub fn generate(config: &TerrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.size as usize;
        let perlin = Perlin::new(config.seed as u32);
        let base_freq = f64::from(config.scale) / f64::from(config.size);
        let amp_sum: f64 = (0..config.octaves)
            .map(|i| OCTAVE_GAIN.powi(i as i32))
            .sum();
        let exponent = f64::from(config.exponent);

        let mut cells = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let mut value = 0.0_f64;
                let mut amp = 1.0_f64;
                let mut freq = base_freq;
                for _ in 0..config.octaves {
                    value += amp * perlin.get([x as f64 * freq, y as f64 * freq]);
                    amp *= OCTAVE_GAIN;
                    freq *= OCTAVE_LACUNARITY;
                }
                // Normalize [-1, 1] noise into [0, 1], then redistribute.
                let normalized = ((value / amp_sum) + 1.0) * 0.5;
                let shaped = normalized.clamp(0.0, 1.0).powf(exponent);
                cells.push(shaped as f32);
            }
        }

        Ok(Self {
            size: config.size,
            fallback: config.fallback,
            cells,
        })
    }

    /// Side length of the grid in cells.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Extent of the continuous domain particles move within.
    #[must_use]
    pub fn extent(&self) -> f32 {
        self.size as f32
    }

    /// Elevation reported for out-of-domain samples.
    #[must_use]
    pub const fn fallback(&self) -> f32 {
        self.fallback
    }

    /// Row-major view of the raw elevation cells.
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Returns the flat index for `(x, y)` without bounds checks.
    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.size as usize) + (x as usize)
    }

    /// Elevation at a specific grid cell.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x < self.size && y < self.size {
            Some(self.cells[self.offset(x, y)])
        } else {
            None
        }
    }

    /// Bilinearly interpolated elevation at continuous coordinates.
    ///
    /// Queries outside `[0, size - 1]` on either axis (including
    /// non-finite coordinates) return the fallback elevation.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let max = (self.size - 1) as f32;
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 || x > max || y > max {
            return self.fallback;
        }

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.size - 1);
        let y1 = (y0 + 1).min(self.size - 1);
        let tx = x - x0 as f32;
        let ty = y - y0 as f32;

        let c00 = self.cells[self.offset(x0, y0)];
        let c10 = self.cells[self.offset(x1, y0)];
        let c01 = self.cells[self.offset(x0, y1)];
        let c11 = self.cells[self.offset(x1, y1)];

        let top = c00 + (c10 - c00) * tx;
        let bottom = c01 + (c11 - c01) * tx;
        top + (bottom - top) * ty
    }

    /// Location and value of the highest grid cell.
    ///
    /// Ties resolve toward the lowest flat index, keeping the result
    /// deterministic.
    #[must_use]
    pub fn max_cell(&self) -> (u32, u32, f32) {
        let mut best_idx = 0;
        let mut best_value = self.cells[0];
        for (idx, &value) in self.cells.iter().enumerate().skip(1) {
            if value > best_value {
                best_idx = idx;
                best_value = value;
            }
        }
        let x = (best_idx % self.size as usize) as u32;
        let y = (best_idx / self.size as usize) as u32;
        (x, y, best_value)
    }
}
