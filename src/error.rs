//! Error types.
//!
//! Every fallible operation in the crate returns [`ScheduleError`]. Input
//! problems are reported all at once (see [`crate::validation`]); run-time
//! failures carry enough context to tell which tasks were left behind.

use thiserror::Error;

use crate::validation::ValidationError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors produced while loading, configuring, or running the dispatcher.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The scenario document is malformed or inconsistent.
    #[error("invalid scenario: {}", summarize(.0))]
    InvalidScenario(Vec<ValidationError>),

    /// A parameter set failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The dispatcher could not find any task to commit.
    #[error("no dispatchable task at t={horizon} with {remaining} task(s) unscheduled (first stuck task id {first_task_id})")]
    Infeasible {
        /// Horizon at which the run got stuck.
        horizon: f64,
        /// Number of tasks still unscheduled.
        remaining: usize,
        /// Scenario id of the lowest-index unscheduled task.
        first_task_id: i64,
    },

    /// A solution was written twice for the same task.
    #[error("task index {0} already has a solution")]
    DuplicateSolution(usize),

    /// Results were requested before a run completed.
    #[error("dispatcher has not completed a run")]
    NotSolved,

    /// Filesystem failure while reading or writing scenario files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
