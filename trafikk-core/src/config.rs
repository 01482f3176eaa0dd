//! Per-run simulation parameters.

use crate::error::SimulationError;
use crate::road::{validate_density, Speed};
use crate::update::Rules;

/// Immutable parameters of one run, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    length: usize,
    density: f64,
    rules: Rules,
    steps: usize,
    transient: usize,
}

impl SimulationConfig {
    /// Fails with [`SimulationError::Configuration`] on a zero length, a
    /// density or probability outside `[0, 1]`, a zero max speed, zero steps,
    /// or a transient that leaves no step to sample.
    pub fn new(
        length: usize,
        density: f64,
        max_speed: Speed,
        slowdown_probability: f64,
        steps: usize,
        transient: usize,
    ) -> Result<Self, SimulationError> {
        if length == 0 {
            return Err(SimulationError::config("road length must be positive"));
        }
        validate_density(density)?;
        let rules = Rules::new(max_speed, slowdown_probability)?;
        if steps == 0 {
            return Err(SimulationError::config("step count must be positive"));
        }
        if transient >= steps {
            return Err(SimulationError::config(format!(
                "transient ({transient}) must be smaller than steps ({steps})"
            )));
        }
        Ok(Self {
            length,
            density,
            rules,
            steps,
            transient,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn max_speed(&self) -> Speed {
        self.rules.max_speed()
    }

    pub fn slowdown_probability(&self) -> f64 {
        self.rules.slowdown_probability()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn transient(&self) -> usize {
        self.transient
    }

    /// Number of steps that contribute to flow statistics.
    pub fn sampled_steps(&self) -> usize {
        self.steps - self.transient
    }

    /// Same run with a different density and slow-down probability, as used
    /// by parameter sweeps.
    pub fn with_point(&self, density: f64, slowdown_probability: f64) -> Result<Self, SimulationError> {
        Self::new(
            self.length,
            density,
            self.max_speed(),
            slowdown_probability,
            self.steps,
            self.transient,
        )
    }
}
