//! # trafikk-core
//!
//! Simulation core for single-lane ring-road traffic following the
//! Nagel–Schreckenberg cellular automaton.
//!
//! ### Key Submodules:
//! - `road`: circular road of cells, each empty or holding one vehicle
//! - `update`: the four synchronous update rules
//! - `random`: injected random sources (seeded and scripted)
//! - `config`: validated per-run parameters
//!
//! The core performs no I/O and keeps no global state. A run is fully
//! determined by its initial road, its rules and the draws of its random
//! source.

pub mod config;
pub mod error;
pub mod random;
pub mod road;
pub mod update;

pub mod prelude {
    pub use crate::config::SimulationConfig;
    pub use crate::error::SimulationError;
    pub use crate::random::{RandomSource, ScriptedSource, SeededSource};
    pub use crate::road::{Cell, Road, Speed, SpeedBand, Vehicle};
    pub use crate::update::{advance, step, Rules, StepOutcome};
}

pub use config::SimulationConfig;
pub use error::SimulationError;
