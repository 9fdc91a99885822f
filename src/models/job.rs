//! Job model and priority classes.
//!
//! A job is a linear chain of tasks with a single deadline. Its priority
//! class is mapped to a numeric weight through a [`PriorityWeights`] table;
//! the instance and the dispatcher each carry their own table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TaskIndex;

/// Priority class of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityClass {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

impl PriorityClass {
    /// Scenario-file spelling (`LOW`, `MEDIUM`, `HIGH`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Low => "LOW",
            PriorityClass::Medium => "MEDIUM",
            PriorityClass::High => "HIGH",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(PriorityClass::Low),
            "MEDIUM" => Ok(PriorityClass::Medium),
            "HIGH" => Ok(PriorityClass::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Numeric weight per priority class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    /// Weight of [`PriorityClass::High`].
    pub high: f64,
    /// Weight of [`PriorityClass::Medium`].
    pub medium: f64,
    /// Weight of [`PriorityClass::Low`].
    pub low: f64,
}

impl PriorityWeights {
    /// Creates a weight table.
    pub fn new(high: f64, medium: f64, low: f64) -> Self {
        Self { high, medium, low }
    }

    /// Weight for a priority class.
    #[inline]
    pub fn weight(&self, class: PriorityClass) -> f64 {
        match class {
            PriorityClass::High => self.high,
            PriorityClass::Medium => self.medium,
            PriorityClass::Low => self.low,
        }
    }
}

/// Instance-level table: LOW=1, MEDIUM=4, HIGH=16.
impl Default for PriorityWeights {
    fn default() -> Self {
        Self::new(16.0, 4.0, 1.0)
    }
}

/// A job: an ordered chain of tasks sharing one deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Scenario identifier.
    pub id: i64,
    /// Latest desired completion time of the last task.
    pub deadline: f64,
    /// Priority class.
    pub priority: PriorityClass,
    /// Tasks in chain order (head first).
    pub tasks: Vec<TaskIndex>,
}

impl Job {
    /// Creates a job with no tasks.
    pub fn new(id: i64, deadline: f64, priority: PriorityClass) -> Self {
        Self {
            id,
            deadline,
            priority,
            tasks: Vec::new(),
        }
    }

    /// First task of the chain.
    pub fn first_task(&self) -> Option<TaskIndex> {
        self.tasks.first().copied()
    }

    /// Last task of the chain (its completion is the job's completion).
    pub fn last_task(&self) -> Option<TaskIndex> {
        self.tasks.last().copied()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
