//! ## trafikk-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! `RUST_LOG` wins over the configured level when set.

use thiserror::Error;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{0}'")]
    Filter(String),

    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `level` is used when `RUST_LOG` is
    /// unset; `json` switches to one JSON object per line.
    pub fn init(level: &str, json: bool) -> Result<(), LoggingError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                EnvFilter::try_new(level).map_err(|_| LoggingError::Filter(level.to_owned()))?
            }
        };

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr);

        let installed = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        installed.map_err(|_| LoggingError::AlreadyInitialized)
    }

    /// Records a named run event with its key/value metadata.
    #[inline]
    pub fn log_event(event_type: &str, metadata: &[(&str, String)]) {
        let span = info_span!("run_event", event_type = event_type);
        let _guard = span.enter();
        tracing::info!(metadata = ?metadata, "Run event recorded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        EventLogger::log_event("flow_complete", &[("flow", "0.31".to_string())]);
        assert!(logs_contain("Run event recorded"));
        assert!(logs_contain("flow_complete"));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(
                EventLogger::init("trafikk=loud", false),
                Err(LoggingError::Filter(_))
            ));
        }
    }
}
