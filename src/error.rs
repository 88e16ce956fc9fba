//! Error types for projections and scenario comparison

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// A scenario parameter is outside its allowed range
    #[error("invalid scenario: `{field}` {reason}")]
    InvalidScenario {
        field: &'static str,
        reason: String,
    },

    /// The principal correction did not reach the loan amount within its iteration cap
    #[error("schedule did not converge after {iterations} correction steps (residual {residual:.6})")]
    ScheduleDidNotConverge {
        iterations: usize,
        residual: f64,
    },

    #[error("at least 2 scenarios must be selected for comparison, got {selected}")]
    InsufficientScenarios { selected: usize },

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidScenario {
            field,
            reason: reason.into(),
        }
    }
}
