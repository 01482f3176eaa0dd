//! Custom validation functions for configuration.

use validator::ValidationError;

use crate::run::RunConfig;
use crate::sweep::SweepConfig;

/// Every probability must lie in `[0, 1]`, and there must be at least one.
pub fn validate_probabilities(values: &[f64]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::new("empty_probability_list"));
    }
    if values.iter().all(|p| (0.0..=1.0).contains(p)) {
        Ok(())
    } else {
        Err(ValidationError::new("probability_out_of_range"))
    }
}

/// Validate log level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Flow measurement needs at least one step after the transient.
pub fn validate_run_window(run: &RunConfig) -> Result<(), ValidationError> {
    if run.transient < run.steps {
        Ok(())
    } else {
        Err(ValidationError::new("transient_not_below_steps"))
    }
}

pub fn validate_density_range(sweep: &SweepConfig) -> Result<(), ValidationError> {
    if sweep.density_start <= sweep.density_end {
        Ok(())
    } else {
        Err(ValidationError::new("density_range_reversed"))
    }
}
