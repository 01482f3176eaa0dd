//! Parameter sweep grid.
//!
//! Densities form an evenly spaced grid from `density_start` to `density_end`
//! inclusive; every density is run once per slow-down probability.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = validation::validate_density_range))]
pub struct SweepConfig {
    #[serde(default = "default_density_start")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub density_start: f64,

    #[serde(default = "default_density_end")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub density_end: f64,

    #[serde(default = "default_density_points")]
    #[validate(range(min = 1))]
    pub density_points: usize,

    #[serde(default = "default_probabilities")]
    #[validate(custom(function = validation::validate_probabilities))]
    pub probabilities: Vec<f64>,

    /// Worker threads; one per CPU when unset.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub workers: Option<usize>,
}

fn default_density_start() -> f64 {
    0.05
}

fn default_density_end() -> f64 {
    0.6
}

fn default_density_points() -> usize {
    20
}

fn default_probabilities() -> Vec<f64> {
    vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            density_start: default_density_start(),
            density_end: default_density_end(),
            density_points: default_density_points(),
            probabilities: default_probabilities(),
            workers: None,
        }
    }
}

impl SweepConfig {
    /// The density grid, endpoints included. A single point sits at
    /// `density_start`.
    pub fn densities(&self) -> Vec<f64> {
        if self.density_points == 1 {
            return vec![self.density_start];
        }
        let span = self.density_end - self.density_start;
        let last = (self.density_points - 1) as f64;
        (0..self.density_points)
            .map(|i| self.density_start + span * i as f64 / last)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let densities = SweepConfig::default().densities();
        assert_eq!(densities.len(), 20);
        assert!((densities[0] - 0.05).abs() < 1e-12);
        assert!((densities[19] - 0.6).abs() < 1e-12);
        assert!(densities.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_point_grid() {
        let sweep = SweepConfig {
            density_points: 1,
            ..SweepConfig::default()
        };
        assert_eq!(sweep.densities(), vec![0.05]);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let sweep = SweepConfig {
            density_start: 0.5,
            density_end: 0.1,
            ..SweepConfig::default()
        };
        assert!(sweep.validate().is_err());
    }
}
