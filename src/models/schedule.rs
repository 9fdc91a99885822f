//! Schedule (solution) model.
//!
//! A schedule holds at most one [`Solution`] per task, written once by the
//! dispatcher and never revised during a run. Commit order is preserved.

use serde::{Deserialize, Serialize};

use super::{MachineIndex, TaskIndex};
use crate::error::{Result, ScheduleError};

/// A committed task-machine-time assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Scheduled task.
    pub task: TaskIndex,
    /// Assigned machine.
    pub machine: MachineIndex,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
    /// Dispatch score that won the assignment.
    pub score: f64,
}

impl Solution {
    /// Creates a solution.
    pub fn new(task: TaskIndex, machine: MachineIndex, start: f64, end: f64, score: f64) -> Self {
        Self {
            task,
            machine,
            start,
            end,
            score,
        }
    }

    /// Occupied duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Append-only set of solutions keyed by task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    slots: Vec<Option<Solution>>,
    order: Vec<TaskIndex>,
}

impl Schedule {
    /// Creates an empty schedule sized for `task_count` tasks.
    pub fn with_task_count(task_count: usize) -> Self {
        Self {
            slots: vec![None; task_count],
            order: Vec::with_capacity(task_count),
        }
    }

    /// Records a solution.
    ///
    /// Fails with [`ScheduleError::DuplicateSolution`] if the task already has one.
    pub fn insert(&mut self, solution: Solution) -> Result<()> {
        if solution.task >= self.slots.len() {
            self.slots.resize(solution.task + 1, None);
        }
        let slot = &mut self.slots[solution.task];
        if slot.is_some() {
            return Err(ScheduleError::DuplicateSolution(solution.task));
        }
        *slot = Some(solution);
        self.order.push(solution.task);
        Ok(())
    }

    /// Solution for a task.
    pub fn get(&self, task: TaskIndex) -> Option<&Solution> {
        self.slots.get(task).and_then(|s| s.as_ref())
    }

    /// Whether a task has been scheduled.
    pub fn contains(&self, task: TaskIndex) -> bool {
        self.get(task).is_some()
    }

    /// Solutions in commit order.
    pub fn iter(&self) -> impl Iterator<Item = &Solution> + '_ {
        self.order.iter().filter_map(|&t| self.slots[t].as_ref())
    }

    /// Task indices in commit order.
    pub fn commit_order(&self) -> &[TaskIndex] {
        &self.order
    }

    /// Number of solutions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no solution has been written.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether every one of `task_count` tasks has a solution.
    pub fn is_complete(&self, task_count: usize) -> bool {
        self.order.len() == task_count && (0..task_count).all(|t| self.contains(t))
    }

    /// Solutions on one machine, sorted by start time.
    pub fn for_machine(&self, machine: MachineIndex) -> Vec<&Solution> {
        let mut on_machine: Vec<&Solution> =
            self.iter().filter(|s| s.machine == machine).collect();
        on_machine.sort_by(|a, b| a.start.total_cmp(&b.start));
        on_machine
    }

    /// Latest end time (0 if empty).
    pub fn makespan(&self) -> f64 {
        self.iter().map(|s| s.end).fold(0.0, f64::max)
    }

    /// Removes every solution, keeping capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.order.clear();
    }
}

/// A constraint violation found in a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Scenario id of the task, machine, or job concerned.
    pub entity_id: i64,
    /// Human-readable description.
    pub message: String,
}

/// Classification of violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Task started before its predecessor ended.
    PrecedenceViolation,
    /// Two tasks overlap on one machine.
    MachineOverlap,
    /// Task assigned to a machine outside its eligibility set.
    IneligibleMachine,
    /// Task has no solution.
    MissingSolution,
    /// Job finished after its deadline (soft).
    DeadlineMiss,
}

impl Violation {
    /// Creates a violation.
    pub fn new(violation_type: ViolationType, entity_id: i64, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            entity_id,
            message: message.into(),
        }
    }

    /// Whether the violation breaks feasibility (deadline misses do not).
    pub fn is_hard(&self) -> bool {
        self.violation_type != ViolationType::DeadlineMiss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::with_task_count(3);
        s.insert(Solution::new(2, 0, 0.0, 5.0, 1.0)).unwrap();
        s.insert(Solution::new(0, 1, 1.0, 4.0, 0.5)).unwrap();
        s.insert(Solution::new(1, 0, 5.0, 8.0, -2.0)).unwrap();
        s
    }

    #[test]
    fn test_commit_order_preserved() {
        let s = sample_schedule();
        assert_eq!(s.commit_order(), &[2, 0, 1]);
        let tasks: Vec<_> = s.iter().map(|sol| sol.task).collect();
        assert_eq!(tasks, vec![2, 0, 1]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut s = sample_schedule();
        let err = s.insert(Solution::new(0, 0, 9.0, 10.0, 0.0)).unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateSolution(0)));
        assert!((s.get(0).unwrap().start - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_completeness() {
        let mut s = Schedule::with_task_count(2);
        assert!(!s.is_complete(2));
        s.insert(Solution::new(1, 0, 0.0, 1.0, 0.0)).unwrap();
        assert!(!s.is_complete(2));
        s.insert(Solution::new(0, 0, 1.0, 2.0, 0.0)).unwrap();
        assert!(s.is_complete(2));
    }

    #[test]
    fn test_for_machine_sorted() {
        let s = sample_schedule();
        let m0 = s.for_machine(0);
        assert_eq!(m0.len(), 2);
        assert_eq!(m0[0].task, 2);
        assert_eq!(m0[1].task, 1);
    }

    #[test]
    fn test_makespan_and_clear() {
        let mut s = sample_schedule();
        assert!((s.makespan() - 8.0).abs() < 1e-10);
        s.clear();
        assert!(s.is_empty());
        assert!((s.makespan() - 0.0).abs() < 1e-10);
        assert!(s.get(2).is_none());
    }

    #[test]
    fn test_insert_grows() {
        let mut s = Schedule::default();
        s.insert(Solution::new(4, 0, 0.0, 1.0, 0.0)).unwrap();
        assert!(s.contains(4));
        assert!(!s.contains(3));
    }

    #[test]
    fn test_violation_hardness() {
        let late = Violation::new(ViolationType::DeadlineMiss, 1, "late by 3");
        let overlap = Violation::new(ViolationType::MachineOverlap, 2, "overlap");
        assert!(!late.is_hard());
        assert!(overlap.is_hard());
    }
}
