use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    /// A run parameter is out of range. Raised before any step executes.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The update rules produced an impossible road. Always fatal for the run.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl SimulationError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimulationError::Configuration(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SimulationError::InvariantViolation(msg.into())
    }
}
