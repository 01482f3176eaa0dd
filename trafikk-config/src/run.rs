//! Run lengths for trace and flow mode.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = validation::validate_run_window))]
pub struct RunConfig {
    /// Updates performed in flow mode.
    #[serde(default = "default_steps")]
    #[validate(range(min = 1))]
    pub steps: usize,

    /// Leading flow-mode steps left out of the statistics.
    #[serde(default = "default_transient")]
    pub transient: usize,

    /// Rows recorded in trace mode, the initial road included.
    #[serde(default = "default_trace_steps")]
    #[validate(range(min = 1))]
    pub trace_steps: usize,
}

fn default_steps() -> usize {
    500
}

fn default_transient() -> usize {
    200
}

fn default_trace_steps() -> usize {
    300
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            transient: default_transient(),
            trace_steps: default_trace_steps(),
        }
    }
}
