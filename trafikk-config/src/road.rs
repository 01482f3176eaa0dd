//! Road and update-rule parameters shared by every run mode.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct RoadConfig {
    /// Number of cells on the ring.
    #[serde(default = "default_length")]
    #[validate(range(min = 1))]
    pub length: usize,

    /// Fraction of cells occupied at start.
    #[serde(default = "default_density")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub density: f64,

    #[serde(default = "default_max_speed")]
    #[validate(range(min = 1))]
    pub max_speed: u16,

    /// Chance that a vehicle slows down by one in a step.
    #[serde(default = "default_slowdown_probability")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub slowdown_probability: f64,

    /// Seed of the run's random source.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_length() -> usize {
    200
}

fn default_density() -> f64 {
    0.2
}

fn default_max_speed() -> u16 {
    5
}

fn default_slowdown_probability() -> f64 {
    0.3
}

fn default_seed() -> u64 {
    42
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            density: default_density(),
            max_speed: default_max_speed(),
            slowdown_probability: default_slowdown_probability(),
            seed: default_seed(),
        }
    }
}
