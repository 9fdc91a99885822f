//! Moves a solved scenario to a later time origin for replanning.
//!
//! After a disruption at time `shift`, the solved plan becomes the earlier
//! plan of a new instance whose clock starts at zero:
//! - tasks that ended by `shift` are dropped;
//! - tasks running at `shift` keep only their remaining work and are planned
//!   to start at 0;
//! - later tasks keep their planned start, moved back by `shift`;
//! - deadlines move back by `shift` and never go below zero.
//!
//! Chain links are rebuilt around dropped tasks, and jobs left without tasks
//! are removed.

use std::collections::HashMap;
use tracing::debug;

use super::document::{ScenarioDocument, TaskRecord, NO_ID};
use crate::error::{Result, ScheduleError};
use crate::models::PriorityClass;
use crate::validation::{chain_order, validate_scenario};

/// Shift amount and per-job adjustments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftOptions {
    /// New time origin, in the units of the source scenario.
    pub shift: f64,
    /// Extra deadline reduction per job id.
    pub deadline_reductions: HashMap<i64, f64>,
    /// Priority class overrides per job id.
    pub priority_overrides: HashMap<i64, PriorityClass>,
}

impl ShiftOptions {
    /// Options shifting by `shift` with no per-job changes.
    pub fn new(shift: f64) -> Self {
        Self {
            shift,
            ..Self::default()
        }
    }

    /// Additionally pulls job `job_id`'s deadline forward by `amount`.
    pub fn reduce_deadline(mut self, job_id: i64, amount: f64) -> Self {
        self.deadline_reductions.insert(job_id, amount);
        self
    }

    /// Replaces job `job_id`'s priority class.
    pub fn override_priority(mut self, job_id: i64, priority: PriorityClass) -> Self {
        self.priority_overrides.insert(job_id, priority);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.shift.is_finite() || self.shift < 0.0 {
            return Err(ScheduleError::InvalidParameters(format!(
                "shift must be finite and >= 0, got {}",
                self.shift
            )));
        }
        if let Some((id, r)) = self
            .deadline_reductions
            .iter()
            .find(|(_, r)| !r.is_finite())
        {
            return Err(ScheduleError::InvalidParameters(format!(
                "deadline reduction for job {id} is not finite: {r}"
            )));
        }
        Ok(())
    }
}

/// What happens to one task at the shift point.
enum Fate {
    Drop,
    Keep(TaskRecord),
}

fn shift_task(task: &TaskRecord, shift: f64) -> Fate {
    let Some(start) = task.earlier_plan_start() else {
        return Fate::Keep(clear_outputs(task.clone()));
    };
    let end = task
        .scheduled_end_time
        .unwrap_or(start + task.processing_time);

    if end <= shift {
        return Fate::Drop;
    }
    let mut out = clear_outputs(task.clone());
    if start < shift {
        // Remaining nominal work in proportion to the remaining wall time.
        let fraction = (end - shift) / (end - start);
        out.processing_time = task.processing_time * fraction;
        out.scheduled_start_time = 0.0;
    } else {
        out.scheduled_start_time = start - shift;
    }
    Fate::Keep(out)
}

fn clear_outputs(mut task: TaskRecord) -> TaskRecord {
    task.scheduled_end_time = None;
    task.scheduled_machine = None;
    task.score = None;
    task
}

/// Produces the replanning input for `doc` at time `options.shift`.
///
/// The source document must be a valid scenario; its task start times are
/// read as the plan being executed.
pub fn shift_scenario(doc: &ScenarioDocument, options: &ShiftOptions) -> Result<ScenarioDocument> {
    options.validate()?;
    validate_scenario(doc).map_err(ScheduleError::InvalidScenario)?;

    let mut out = ScenarioDocument {
        machines: doc.machines.clone(),
        jobs: Vec::with_capacity(doc.jobs.len()),
        extra: doc.extra.clone(),
    };
    let mut dropped = 0usize;

    for job in &doc.jobs {
        let head = job
            .tasks
            .iter()
            .find(|t| t.preceding_task == NO_ID)
            .map(|t| t.id)
            .unwrap_or(NO_ID);
        let order = chain_order(job, head).unwrap_or_else(|| (0..job.tasks.len()).collect());

        let mut tasks: Vec<TaskRecord> = Vec::with_capacity(order.len());
        for pos in order {
            match shift_task(&job.tasks[pos], options.shift) {
                Fate::Drop => dropped += 1,
                Fate::Keep(task) => tasks.push(task),
            }
        }
        if tasks.is_empty() {
            continue;
        }
        relink(&mut tasks);

        let mut shifted = job.clone();
        shifted.tasks = tasks;
        let reduction = options.deadline_reductions.get(&job.id).copied().unwrap_or(0.0);
        shifted.deadline = (job.deadline - options.shift - reduction).max(0.0);
        if let Some(priority) = options.priority_overrides.get(&job.id) {
            shifted.priority = priority.to_string();
        }
        out.jobs.push(shifted);
    }

    debug!(
        shift = options.shift,
        dropped_tasks = dropped,
        jobs = out.jobs.len(),
        "shifted scenario"
    );
    Ok(out)
}

fn relink(chain: &mut [TaskRecord]) {
    let ids: Vec<i64> = chain.iter().map(|t| t.id).collect();
    for (i, task) in chain.iter_mut().enumerate() {
        task.preceding_task = if i == 0 { NO_ID } else { ids[i - 1] };
        task.succeeding_task = ids.get(i + 1).copied().unwrap_or(NO_ID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{JobRecord, MachineRecord, NO_TIME};

    fn planned(id: i64, pt: f64, start: f64, end: f64) -> TaskRecord {
        let mut t = TaskRecord::new(id, pt, vec![1]);
        t.scheduled_start_time = start;
        t.scheduled_end_time = Some(end);
        t.scheduled_machine = Some(1);
        t.score = Some(1.5);
        t
    }

    fn solved() -> ScenarioDocument {
        let mut doc = ScenarioDocument::new();
        doc.machines.push(MachineRecord::new(1, "CUT", 2.0));

        let mut j1 = JobRecord::new(1, 50.0, "LOW");
        j1.tasks = vec![planned(1, 5.0, 0.0, 10.0), planned(2, 5.0, 10.0, 20.0), planned(3, 5.0, 30.0, 40.0)];
        let mut j2 = JobRecord::new(2, 10.0, "MEDIUM");
        j2.tasks = vec![planned(4, 2.0, 20.0, 24.0)];
        relink(&mut j1.tasks);
        doc.jobs = vec![j1, j2];
        doc
    }

    #[test]
    fn test_finished_dropped_running_truncated() {
        let out = shift_scenario(&solved(), &ShiftOptions::new(15.0)).unwrap();
        assert!(validate_scenario(&out).is_ok());

        let j1 = &out.jobs[0];
        let ids: Vec<i64> = j1.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, [2, 3]);

        let running = &j1.tasks[0];
        assert!((running.processing_time - 2.5).abs() < 1e-9);
        assert_eq!(running.scheduled_start_time, 0.0);
        assert_eq!(running.preceding_task, NO_ID);
        assert_eq!(running.succeeding_task, 3);
        assert!(running.scheduled_end_time.is_none());
        assert!(running.scheduled_machine.is_none());
        assert!(running.score.is_none());

        let later = &j1.tasks[1];
        assert!((later.scheduled_start_time - 15.0).abs() < 1e-9);
        assert_eq!(later.preceding_task, 2);
        assert!((later.processing_time - 5.0).abs() < 1e-9);

        assert!((j1.deadline - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadline_clamped_and_empty_job_removed() {
        let out = shift_scenario(&solved(), &ShiftOptions::new(25.0)).unwrap();
        assert_eq!(out.jobs.len(), 1);
        assert_eq!(out.jobs[0].id, 1);

        let out = shift_scenario(&solved(), &ShiftOptions::new(12.0)).unwrap();
        assert_eq!(out.jobs[1].deadline, 0.0);
        assert!((out.jobs[1].tasks[0].scheduled_start_time - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_job_options() {
        let options = ShiftOptions::new(5.0)
            .reduce_deadline(1, 30.0)
            .override_priority(1, PriorityClass::High);
        let out = shift_scenario(&solved(), &options).unwrap();
        assert!((out.jobs[0].deadline - 15.0).abs() < 1e-9);
        assert_eq!(out.jobs[0].priority, "HIGH");
        assert_eq!(out.jobs[1].priority, "MEDIUM");
    }

    #[test]
    fn test_unplanned_tasks_kept() {
        let mut doc = solved();
        doc.jobs[1].tasks[0].scheduled_start_time = NO_TIME;
        doc.jobs[1].tasks[0].scheduled_end_time = None;
        let out = shift_scenario(&doc, &ShiftOptions::new(100.0)).unwrap();
        assert_eq!(out.jobs.len(), 1);
        assert_eq!(out.jobs[0].id, 2);
        assert!(out.jobs[0].tasks[0].earlier_plan_start().is_none());
    }

    #[test]
    fn test_zero_shift_keeps_plan() {
        let out = shift_scenario(&solved(), &ShiftOptions::new(0.0)).unwrap();
        assert_eq!(out.task_count(), 4);
        assert!((out.jobs[0].tasks[2].scheduled_start_time - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(shift_scenario(&solved(), &ShiftOptions::new(-1.0)).is_err());
        let mut doc = solved();
        doc.jobs[0].tasks[1].preceding_task = 99;
        assert!(matches!(
            shift_scenario(&doc, &ShiftOptions::new(1.0)),
            Err(ScheduleError::InvalidScenario(_))
        ));
    }
}
