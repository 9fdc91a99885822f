//! Problem instance (index arena).
//!
//! Machines, tasks, and jobs live in flat vectors; every cross-reference is
//! an index into one of them. A [`Problem`] is immutable during dispatch and
//! may be shared read-only across concurrent runs.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{Job, JobIndex, Machine, MachineIndex, PriorityClass, PriorityWeights, Task, TaskIndex};
use crate::error::{Result, ScheduleError};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Instance-level objective coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Weight of total weighted completion time.
    pub alpha_completion_time: f64,
    /// Weight of total weighted (squared) tardiness.
    pub alpha_tardiness: f64,
    /// Weight of total squared deviation from the earlier plan.
    pub alpha_robust: f64,
}

impl ObjectiveWeights {
    /// Creates a weight set.
    pub fn new(alpha_completion_time: f64, alpha_tardiness: f64, alpha_robust: f64) -> Self {
        Self {
            alpha_completion_time,
            alpha_tardiness,
            alpha_robust,
        }
    }
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self::new(1.0, 10.0, 0.1)
    }
}

/// Input description of a task for [`ProblemBuilder::add_task`].
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Scenario identifier.
    pub id: i64,
    /// Task type.
    pub task_type: String,
    /// Nominal processing time.
    pub processing_time: f64,
    /// Eligible machines.
    pub machines: Vec<MachineIndex>,
    /// Start time in a previously committed plan.
    pub earlier_plan_start: Option<f64>,
}

impl TaskSpec {
    /// Creates a spec with no eligible machines yet.
    pub fn new(id: i64, processing_time: f64) -> Self {
        Self {
            id,
            task_type: String::new(),
            processing_time,
            machines: Vec::new(),
            earlier_plan_start: None,
        }
    }

    /// Sets the task type.
    pub fn of_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Sets the eligible machines.
    pub fn on(mut self, machines: impl IntoIterator<Item = MachineIndex>) -> Self {
        self.machines = machines.into_iter().collect();
        self
    }

    /// Sets the earlier-plan start time.
    pub fn with_earlier_plan(mut self, start: f64) -> Self {
        self.earlier_plan_start = Some(start);
        self
    }
}

/// Incremental constructor for [`Problem`].
///
/// Tasks are appended to their job's chain in call order: the first task
/// added to a job has no predecessor, each later one follows the previous.
///
/// # Example
/// ```
/// use u_dispatch::models::{Machine, PriorityClass, ProblemBuilder, TaskSpec};
///
/// let mut b = ProblemBuilder::new();
/// let m1 = b.add_machine(Machine::new(1, "CUT"));
/// let m2 = b.add_machine(Machine::new(2, "WELD"));
/// let job = b.add_job(1, 100.0, PriorityClass::High);
/// b.add_task(job, TaskSpec::new(1, 5.0).on([m1]));
/// b.add_task(job, TaskSpec::new(2, 3.0).on([m2]));
/// let problem = b.build().unwrap();
/// assert_eq!(problem.task_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    machines: Vec<Machine>,
    jobs: Vec<Job>,
    specs: Vec<(JobIndex, TaskSpec)>,
    priority_weights: PriorityWeights,
    objective_weights: ObjectiveWeights,
}

impl ProblemBuilder {
    /// Creates an empty builder with default weight tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance-level priority table.
    pub fn with_priority_weights(mut self, weights: PriorityWeights) -> Self {
        self.priority_weights = weights;
        self
    }

    /// Sets the instance-level objective weights.
    pub fn with_objective_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.objective_weights = weights;
        self
    }

    /// Adds a machine and returns its index.
    pub fn add_machine(&mut self, mut machine: Machine) -> MachineIndex {
        machine.tasks.clear();
        self.machines.push(machine);
        self.machines.len() - 1
    }

    /// Adds a job and returns its index.
    pub fn add_job(&mut self, id: i64, deadline: f64, priority: PriorityClass) -> JobIndex {
        self.jobs.push(Job::new(id, deadline, priority));
        self.jobs.len() - 1
    }

    /// Appends a task to the end of `job`'s chain and returns its index.
    pub fn add_task(&mut self, job: JobIndex, spec: TaskSpec) -> TaskIndex {
        self.specs.push((job, spec));
        self.specs.len() - 1
    }

    /// Resolves links and derived fields.
    ///
    /// Fails with [`ScheduleError::InvalidScenario`] listing every structural
    /// problem found (duplicate ids, dangling indices, empty eligibility,
    /// empty jobs, invalid durations).
    pub fn build(self) -> Result<Problem> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(ScheduleError::InvalidScenario(errors));
        }

        let ProblemBuilder {
            mut machines,
            mut jobs,
            specs,
            priority_weights,
            objective_weights,
        } = self;

        let mut tasks = Vec::with_capacity(specs.len());
        for (index, (job_idx, spec)) in specs.into_iter().enumerate() {
            let mut eligible = spec.machines;
            eligible.sort_unstable();
            eligible.dedup();

            let processing_times = eligible
                .iter()
                .map(|&m| machines[m].processing_time_for(spec.processing_time))
                .collect();
            for &m in &eligible {
                machines[m].tasks.push(index);
            }

            let job = &mut jobs[job_idx];
            let predecessor = job.last_task();
            job.tasks.push(index);

            tasks.push(Task {
                id: spec.id,
                task_type: spec.task_type,
                processing_time: spec.processing_time,
                eligible,
                processing_times,
                job: job_idx,
                priority_weight: priority_weights.weight(job.priority),
                predecessor,
                successor: None,
                earlier_plan_start: spec.earlier_plan_start,
                required_remaining_time: 0.0,
            });
            if let Some(pred) = predecessor {
                tasks[pred].successor = Some(index);
            }
        }

        for job in &jobs {
            let mut remaining = 0.0;
            for &t in job.tasks.iter().rev() {
                tasks[t].required_remaining_time = remaining;
                remaining += tasks[t].average_processing_time();
            }
        }

        Ok(Problem::from_parts(
            machines,
            tasks,
            jobs,
            priority_weights,
            objective_weights,
        ))
    }

    fn check(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut machine_ids = HashSet::new();
        for m in &self.machines {
            if !machine_ids.insert(m.id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate machine ID: {}", m.id),
                ));
            }
            if !m.processing_time_constant.is_finite() || m.processing_time_constant <= 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!(
                        "Machine {} has invalid processing time constant {}",
                        m.id, m.processing_time_constant
                    ),
                ));
            }
        }

        let mut job_ids = HashSet::new();
        for job in &self.jobs {
            if !job_ids.insert(job.id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate job ID: {}", job.id),
                ));
            }
            if !job.deadline.is_finite() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!("Job {} has a non-finite deadline", job.id),
                ));
            }
        }

        let mut task_ids = HashSet::new();
        let mut job_has_tasks = vec![false; self.jobs.len()];
        for (job_idx, spec) in &self.specs {
            if !task_ids.insert(spec.id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task ID: {}", spec.id),
                ));
            }
            match job_has_tasks.get_mut(*job_idx) {
                Some(flag) => *flag = true,
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    format!("Task {} references unknown job index {}", spec.id, job_idx),
                )),
            }
            if spec.machines.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::EmptyEligibility,
                    format!("Task {} has no eligible machines", spec.id),
                ));
            }
            for &m in &spec.machines {
                if m >= self.machines.len() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidReference,
                        format!("Task {} references unknown machine index {}", spec.id, m),
                    ));
                }
            }
            if !spec.processing_time.is_finite() || spec.processing_time < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!(
                        "Task {} has invalid processing time {}",
                        spec.id, spec.processing_time
                    ),
                ));
            }
            if spec.earlier_plan_start.is_some_and(|s| !s.is_finite()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!("Task {} has a non-finite earlier-plan start", spec.id),
                ));
            }
        }

        for (job, has_tasks) in self.jobs.iter().zip(&job_has_tasks) {
            if !has_tasks {
                errors.push(ValidationError::new(
                    ValidationErrorKind::EmptyJob,
                    format!("Job {} has no tasks", job.id),
                ));
            }
        }

        errors
    }
}

/// A fully resolved scheduling instance.
#[derive(Debug, Clone)]
pub struct Problem {
    machines: Vec<Machine>,
    tasks: Vec<Task>,
    jobs: Vec<Job>,
    priority_weights: PriorityWeights,
    objective_weights: ObjectiveWeights,
    task_lookup: HashMap<i64, TaskIndex>,
    machine_lookup: HashMap<i64, MachineIndex>,
    job_lookup: HashMap<i64, JobIndex>,
}

impl Problem {
    fn from_parts(
        machines: Vec<Machine>,
        tasks: Vec<Task>,
        jobs: Vec<Job>,
        priority_weights: PriorityWeights,
        objective_weights: ObjectiveWeights,
    ) -> Self {
        let task_lookup = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        let machine_lookup = machines.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        let job_lookup = jobs.iter().enumerate().map(|(i, j)| (j.id, i)).collect();
        Self {
            machines,
            tasks,
            jobs,
            priority_weights,
            objective_weights,
            task_lookup,
            machine_lookup,
            job_lookup,
        }
    }

    /// All machines.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// All tasks.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// All jobs.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Machine by index.
    #[inline]
    pub fn machine(&self, index: MachineIndex) -> &Machine {
        &self.machines[index]
    }

    /// Task by index.
    #[inline]
    pub fn task(&self, index: TaskIndex) -> &Task {
        &self.tasks[index]
    }

    /// Job by index.
    #[inline]
    pub fn job(&self, index: JobIndex) -> &Job {
        &self.jobs[index]
    }

    /// Owning job of a task.
    #[inline]
    pub fn job_of(&self, task: TaskIndex) -> &Job {
        &self.jobs[self.tasks[task].job]
    }

    /// Task index for a scenario id.
    pub fn task_index(&self, id: i64) -> Option<TaskIndex> {
        self.task_lookup.get(&id).copied()
    }

    /// Machine index for a scenario id.
    pub fn machine_index(&self, id: i64) -> Option<MachineIndex> {
        self.machine_lookup.get(&id).copied()
    }

    /// Job index for a scenario id.
    pub fn job_index(&self, id: i64) -> Option<JobIndex> {
        self.job_lookup.get(&id).copied()
    }

    /// Last task of every job, in job order.
    pub fn last_tasks(&self) -> impl Iterator<Item = TaskIndex> + '_ {
        self.jobs.iter().filter_map(|j| j.last_task())
    }

    /// Number of machines.
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Instance-level priority table.
    pub fn priority_weights(&self) -> &PriorityWeights {
        &self.priority_weights
    }

    /// Instance-level objective weights.
    pub fn objective_weights(&self) -> &ObjectiveWeights {
        &self.objective_weights
    }

    /// Replaces the objective weights.
    pub fn set_objective_weights(&mut self, weights: ObjectiveWeights) {
        self.objective_weights = weights;
    }

    /// Replaces the priority table and re-derives every task's weight.
    pub fn set_priority_weights(&mut self, weights: PriorityWeights) {
        self.priority_weights = weights;
        for task in &mut self.tasks {
            task.priority_weight = weights.weight(self.jobs[task.job].priority);
        }
    }

    /// Changes a job's deadline.
    ///
    /// Fails on an unknown job index or a non-finite deadline; the problem
    /// is left unchanged in both cases.
    pub fn set_job_deadline(&mut self, job: JobIndex, deadline: f64) -> Result<()> {
        if !deadline.is_finite() {
            let id = self.job_entry(job)?.id;
            return Err(ScheduleError::InvalidScenario(vec![ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Job {id} has a non-finite deadline"),
            )]));
        }
        self.job_entry_mut(job)?.deadline = deadline;
        Ok(())
    }

    /// Changes a job's priority class and re-derives its tasks' weights.
    pub fn set_job_priority(&mut self, job: JobIndex, priority: PriorityClass) -> Result<()> {
        let weight = self.priority_weights.weight(priority);
        let entry = self.job_entry_mut(job)?;
        entry.priority = priority;
        for &t in &self.jobs[job].tasks {
            self.tasks[t].priority_weight = weight;
        }
        Ok(())
    }

    fn job_entry(&self, job: JobIndex) -> Result<&Job> {
        self.jobs.get(job).ok_or_else(|| unknown_job(job))
    }

    fn job_entry_mut(&mut self, job: JobIndex) -> Result<&mut Job> {
        self.jobs.get_mut(job).ok_or_else(|| unknown_job(job))
    }
}

fn unknown_job(job: JobIndex) -> ScheduleError {
    ScheduleError::InvalidScenario(vec![ValidationError::new(
        ValidationErrorKind::InvalidReference,
        format!("Unknown job index {job}"),
    )])
}
