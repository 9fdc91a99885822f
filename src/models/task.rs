//! Task model.
//!
//! A task is one operation of a job. It runs on exactly one of its eligible
//! machines, and its processing time depends on which one.

use serde::{Deserialize, Serialize};

use super::{JobIndex, MachineIndex, TaskIndex};

/// A task (operation) to be dispatched.
///
/// `eligible` and `processing_times` are parallel: `processing_times[k]`
/// is the duration on machine `eligible[k]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Scenario identifier.
    pub id: i64,
    /// Task type (informational; eligibility is explicit).
    pub task_type: String,
    /// Nominal processing time.
    pub processing_time: f64,
    /// Machines allowed to run this task, in ascending index order.
    pub eligible: Vec<MachineIndex>,
    /// Scaled processing time per eligible machine.
    pub processing_times: Vec<f64>,
    /// Owning job.
    pub job: JobIndex,
    /// Instance-level priority weight of the owning job.
    pub priority_weight: f64,
    /// Immediate predecessor within the job.
    pub predecessor: Option<TaskIndex>,
    /// Immediate successor within the job.
    pub successor: Option<TaskIndex>,
    /// Start time in a previously committed plan.
    pub earlier_plan_start: Option<f64>,
    /// Sum of average processing times of every task after this one in the chain.
    pub required_remaining_time: f64,
}

impl Task {
    /// Processing time on `machine`, or `None` if the machine is not eligible.
    pub fn processing_time_on(&self, machine: MachineIndex) -> Option<f64> {
        self.eligible
            .iter()
            .position(|&m| m == machine)
            .map(|k| self.processing_times[k])
    }

    /// Whether `machine` may run this task.
    pub fn is_eligible(&self, machine: MachineIndex) -> bool {
        self.eligible.contains(&machine)
    }

    /// Mean processing time over eligible machines (0 if none).
    pub fn average_processing_time(&self) -> f64 {
        if self.processing_times.is_empty() {
            return 0.0;
        }
        self.processing_times.iter().sum::<f64>() / self.processing_times.len() as f64
    }

    /// Whether the task heads its job chain.
    pub fn is_first(&self) -> bool {
        self.predecessor.is_none()
    }

    /// Whether the task ends its job chain.
    pub fn is_last(&self) -> bool {
        self.successor.is_none()
    }
}
