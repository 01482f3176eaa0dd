use thiserror::Error;
use trafikk_core::SimulationError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("Road has {actual} cells but the run is configured for {expected}")]
    RoadLength { expected: usize, actual: usize },

    #[error("Space-time checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Sweep worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
