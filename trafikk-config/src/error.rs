//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;
use trafikk_core::SimulationError;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration validation error.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] Box<figment::Error>),

    /// Parameters rejected by the simulation core.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.errors() {
        let _ = writeln!(output, "Field '{}':", field);
        match errors {
            validator::ValidationErrorsKind::Field(errors) => {
                for error in errors {
                    let message = match &error.message {
                        Some(msg) => msg.to_string(),
                        None => error.code.to_string(),
                    };
                    let _ = writeln!(output, "  - {}", message);
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                for line in format_validation_errors(nested).lines() {
                    let _ = writeln!(output, "  {}", line);
                }
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let _ = writeln!(output, "  [{}]:", index);
                    for line in format_validation_errors(nested).lines() {
                        let _ = writeln!(output, "    {}", line);
                    }
                }
            }
        }
    }
    output
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Parsing(Box::new(error))
    }
}
