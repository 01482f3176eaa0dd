//! # Trafikk Configuration System
//!
//! Layered configuration for simulation runs.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files and `TRAFIKK_*` environment variables
//! - **Validation**: range and cross-field checks before any run starts
//! - **Core hand-off**: [`TrafikkConfig::simulation`] builds the core's per-run
//!   parameters, which the core validates again

#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use trafikk_core::SimulationConfig;
use validator::Validate;

mod error;
mod road;
mod run;
mod sweep;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use road::RoadConfig;
pub use run::RunConfig;
pub use sweep::SweepConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/trafikk.yaml";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct TrafikkConfig {
    /// Road and update-rule parameters.
    #[serde(default)]
    #[validate(nested)]
    pub road: RoadConfig,

    /// Step counts for trace and flow mode.
    #[serde(default)]
    #[validate(nested)]
    pub run: RunConfig,

    /// Density/probability grid for parameter sweeps.
    #[serde(default)]
    #[validate(nested)]
    pub sweep: SweepConfig,

    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl TrafikkConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/trafikk.yaml`, if present.
    /// 3. `config/<TRAFIKK_ENV>.yaml`, if present.
    /// 4. `TRAFIKK_*` environment variables, `__` separating nested keys.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TrafikkConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            tracing::debug!("{BASE_FILE} not found, using default configuration");
        }

        if let Ok(env) = std::env::var("TRAFIKK_ENV") {
            let env_file = format!("config/{}.yaml", env);
            if Path::new(&env_file).exists() {
                figment = figment.merge(Yaml::file(env_file));
            }
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, then environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(TrafikkConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .merge(Env::prefixed("TRAFIKK_").ignore(&["env"]).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Per-run parameters for the simulation core.
    pub fn simulation(&self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig::new(
            self.road.length,
            self.road.density,
            self.road.max_speed,
            self.road.slowdown_probability,
            self.run.steps,
            self.run.transient,
        )?)
    }
}
