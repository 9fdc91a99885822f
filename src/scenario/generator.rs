//! Seeded random scenario generator.
//!
//! Produces benchmark instances: one group of machines per task type, jobs
//! split evenly across priority classes, and tasks whose types appear in a
//! fixed ascending order within each job. Deadlines scale with the total
//! expected workload so tighter classes get earlier due dates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::document::{JobRecord, MachineRecord, ScenarioDocument, TaskRecord, NO_ID};
use crate::error::{Result, ScheduleError};
use crate::models::PriorityClass;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of jobs.
    pub job_count: usize,
    /// Task types, in processing order.
    pub task_types: Vec<String>,
    /// Machines created for each task type.
    pub machines_per_type: usize,
    /// Possible task counts per job, drawn uniformly.
    pub task_count_choices: Vec<usize>,
    /// Mean nominal processing time.
    pub processing_mean: f64,
    /// Standard deviation of nominal processing time.
    pub processing_std: f64,
    /// Relative standard deviation of deadline noise.
    pub deadline_noise: f64,
    /// Seed for machine constants.
    pub machine_seed: u64,
    /// Seed for jobs and tasks.
    pub instance_seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            job_count: 10,
            task_types: ["CUTTING", "DRILLING", "WELDING", "PAINTING"]
                .into_iter()
                .map(String::from)
                .collect(),
            machines_per_type: 1,
            task_count_choices: vec![2, 3, 4],
            processing_mean: 10.0,
            processing_std: 4.0,
            deadline_noise: 0.1,
            machine_seed: 0,
            instance_seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Sets the number of jobs.
    pub fn with_job_count(mut self, n: usize) -> Self {
        self.job_count = n;
        self
    }

    /// Sets the task types.
    pub fn with_task_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the machine count per task type.
    pub fn with_machines_per_type(mut self, n: usize) -> Self {
        self.machines_per_type = n;
        self
    }

    /// Sets the possible task counts per job.
    pub fn with_task_count_choices(mut self, choices: Vec<usize>) -> Self {
        self.task_count_choices = choices;
        self
    }

    /// Sets mean and standard deviation of processing times.
    pub fn with_processing(mut self, mean: f64, std: f64) -> Self {
        self.processing_mean = mean;
        self.processing_std = std;
        self
    }

    /// Sets the relative deadline noise.
    pub fn with_deadline_noise(mut self, noise: f64) -> Self {
        self.deadline_noise = noise;
        self
    }

    /// Sets both seeds.
    pub fn with_seeds(mut self, machine_seed: u64, instance_seed: u64) -> Self {
        self.machine_seed = machine_seed;
        self.instance_seed = instance_seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.task_types.is_empty() {
            return Err(invalid("task_types must not be empty"));
        }
        let distinct: HashSet<&str> = self.task_types.iter().map(String::as_str).collect();
        if distinct.len() != self.task_types.len() {
            return Err(invalid("task_types must be distinct"));
        }
        if self.machines_per_type == 0 {
            return Err(invalid("machines_per_type must be at least 1"));
        }
        if self.task_count_choices.is_empty() {
            return Err(invalid("task_count_choices must not be empty"));
        }
        if let Some(&n) = self
            .task_count_choices
            .iter()
            .find(|&&n| n == 0 || n > self.task_types.len())
        {
            return Err(ScheduleError::InvalidParameters(format!(
                "task count {n} must be between 1 and {}",
                self.task_types.len()
            )));
        }
        if !self.processing_mean.is_finite() {
            return Err(invalid("processing_mean must be finite"));
        }
        if !self.processing_std.is_finite() || self.processing_std < 0.0 {
            return Err(invalid("processing_std must be finite and >= 0"));
        }
        if !self.deadline_noise.is_finite() || self.deadline_noise < 0.0 {
            return Err(invalid("deadline_noise must be finite and >= 0"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ScheduleError {
    ScheduleError::InvalidParameters(msg.into())
}

/// Deadline factor relative to the per-type workload.
fn deadline_factor(priority: PriorityClass) -> f64 {
    match priority {
        PriorityClass::High => 0.5,
        PriorityClass::Medium => 0.9,
        PriorityClass::Low => 1.3,
    }
}

/// Random scenario generator.
///
/// # Example
///
/// ```
/// use u_dispatch::scenario::{GeneratorConfig, ScenarioGenerator};
///
/// let config = GeneratorConfig::default().with_job_count(6).with_seeds(1, 2);
/// let doc = ScenarioGenerator::new(config).unwrap().generate().unwrap();
/// assert_eq!(doc.jobs.len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    config: GeneratorConfig,
}

impl ScenarioGenerator {
    /// Creates a generator; fails if `config` is invalid.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a scenario. Equal configurations give equal documents.
    pub fn generate(&self) -> Result<ScenarioDocument> {
        let machines = self.generate_machines();

        let mut by_type: HashMap<&str, Vec<&MachineRecord>> = HashMap::new();
        for m in &machines {
            by_type.entry(m.task_type_undertakes.as_str()).or_default().push(m);
        }

        let mut rng = StdRng::seed_from_u64(self.config.instance_seed);
        let processing = Normal::new(self.config.processing_mean, self.config.processing_std)
            .map_err(|e| ScheduleError::InvalidParameters(e.to_string()))?;

        let classes = self.priorities();
        let mut jobs = Vec::with_capacity(classes.len());
        let mut next_task_id = 1i64;
        let mut workload = 0.0;

        for (i, priority) in classes.iter().enumerate() {
            let mut job = JobRecord::new(i as i64 + 1, 0.0, priority.to_string());
            let choices = &self.config.task_count_choices;
            let n_tasks = choices[rng.random_range(0..choices.len())];

            let mut types =
                rand::seq::index::sample(&mut rng, self.config.task_types.len(), n_tasks).into_vec();
            types.sort_unstable();

            for (k, &t) in types.iter().enumerate() {
                let task_type = &self.config.task_types[t];
                let eligible = by_type.get(task_type.as_str()).map(Vec::as_slice).unwrap_or(&[]);

                let processing_time = processing.sample(&mut rng).round().max(1.0);
                let mean_constant = eligible
                    .iter()
                    .map(|m| m.processing_time_constant)
                    .sum::<f64>()
                    / eligible.len().max(1) as f64;
                workload += mean_constant * processing_time;

                let mut task =
                    TaskRecord::new(next_task_id, processing_time, eligible.iter().map(|m| m.id).collect());
                task.task_type = Some(task_type.clone());
                if k > 0 {
                    task.preceding_task = next_task_id - 1;
                }
                task.succeeding_task = if k + 1 < types.len() { next_task_id + 1 } else { NO_ID };
                job.tasks.push(task);
                next_task_id += 1;
            }
            jobs.push(job);
        }

        let per_type = workload / self.config.task_types.len() as f64;
        for (job, &class) in jobs.iter_mut().zip(&classes) {
            let base = deadline_factor(class) * per_type;
            let noise = Normal::new(0.0, base * self.config.deadline_noise)
                .map_err(|e| ScheduleError::InvalidParameters(e.to_string()))?;
            job.deadline = (base + noise.sample(&mut rng)).max(0.0);
        }

        debug!(
            machines = machines.len(),
            jobs = jobs.len(),
            tasks = next_task_id - 1,
            "generated scenario"
        );

        let mut doc = ScenarioDocument::new();
        doc.machines = machines;
        doc.jobs = jobs;
        Ok(doc)
    }

    fn generate_machines(&self) -> Vec<MachineRecord> {
        let mut rng = StdRng::seed_from_u64(self.config.machine_seed);
        let mut machines = Vec::with_capacity(self.config.task_types.len() * self.config.machines_per_type);
        let mut next_id = 1i64;
        for task_type in &self.config.task_types {
            for _ in 0..self.config.machines_per_type {
                let constant = rng.random_range(0.8..=1.2);
                machines.push(MachineRecord::new(next_id, task_type.clone(), constant));
                next_id += 1;
            }
        }
        machines
    }

    /// Thirds HIGH, MEDIUM, LOW; the remainder is LOW.
    fn priorities(&self) -> Vec<PriorityClass> {
        let n = self.config.job_count;
        let third = n / 3;
        let mut out = Vec::with_capacity(n);
        out.extend(std::iter::repeat(PriorityClass::High).take(third));
        out.extend(std::iter::repeat(PriorityClass::Medium).take(third));
        out.extend(std::iter::repeat(PriorityClass::Low).take(n - 2 * third));
        out
    }
}
