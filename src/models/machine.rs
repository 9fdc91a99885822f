//! Machine model.
//!
//! A machine services one task type and scales every task's nominal
//! processing time by its own constant (slower machines > 1.0, faster < 1.0).

use serde::{Deserialize, Serialize};

use super::TaskIndex;

/// A machine that can process tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Scenario identifier.
    pub id: i64,
    /// Human-readable name.
    pub name: String,
    /// Task type this machine undertakes.
    pub task_type: String,
    /// Multiplier applied to nominal processing times (1.0 = nominal).
    pub processing_time_constant: f64,
    /// Tasks that list this machine as eligible, in task index order.
    ///
    /// Filled in by [`ProblemBuilder::build`](super::ProblemBuilder::build).
    pub tasks: Vec<TaskIndex>,
}

impl Machine {
    /// Creates a machine with a nominal processing-time constant.
    pub fn new(id: i64, task_type: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            task_type: task_type.into(),
            processing_time_constant: 1.0,
            tasks: Vec::new(),
        }
    }

    /// Sets the machine name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the processing-time constant.
    pub fn with_processing_time_constant(mut self, constant: f64) -> Self {
        self.processing_time_constant = constant;
        self
    }

    /// Processing time of a task with the given nominal duration on this machine.
    #[inline]
    pub fn processing_time_for(&self, nominal: f64) -> f64 {
        nominal * self.processing_time_constant
    }

    /// Whether any task is eligible on this machine.
    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_builder() {
        let m = Machine::new(3, "CUTTING")
            .with_name("Saw 3")
            .with_processing_time_constant(1.2);

        assert_eq!(m.id, 3);
        assert_eq!(m.name, "Saw 3");
        assert_eq!(m.task_type, "CUTTING");
        assert!((m.processing_time_constant - 1.2).abs() < 1e-10);
        assert!(!m.has_tasks());
    }

    #[test]
    fn test_processing_time_scaling() {
        let fast = Machine::new(1, "A").with_processing_time_constant(0.8);
        let slow = Machine::new(2, "A").with_processing_time_constant(1.25);

        assert!((fast.processing_time_for(10.0) - 8.0).abs() < 1e-10);
        assert!((slow.processing_time_for(10.0) - 12.5).abs() < 1e-10);
    }
}
