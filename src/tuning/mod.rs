//! Parameter tuning for the dispatcher.
//!
//! The dispatcher's 11 tunables (see [`PARAM_NAMES`]) are searched as a
//! real vector inside a box [`SearchSpace`]. Each candidate vector is scored
//! by [`HeuristicObjective`]: a fresh [`Dispatcher`] run against the shared
//! problem, returning the instance objective (lower is better) or `+∞` if
//! the vector is invalid or the run fails.
//!
//! Two searches are provided:
//! - [`ga`]: elitist genetic algorithm on `u_metaheur`'s runner
//! - [`pso`]: particle swarm with bounce-back at the box walls
//!
//! Both draw every random number from one seeded RNG before evaluating a
//! batch, so results do not depend on thread scheduling. Every new global
//! best is handed to an [`ImprovementSink`].

pub mod ga;
pub mod pso;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::dispatching::{DeviationMode, Dispatcher, HeuristicParams, PARAM_COUNT, PARAM_NAMES};
use crate::error::{Result, ScheduleError};
use crate::evaluation::ScheduleStats;
use crate::models::{Problem, Schedule};
use crate::scenario::{export_schedule, ScenarioDocument};

/// Box bounds for the parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    lower: [f64; PARAM_COUNT],
    upper: [f64; PARAM_COUNT],
}

impl Default for SearchSpace {
    /// Bounds that bracket the dispatcher defaults.
    fn default() -> Self {
        Self {
            lower: [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5],
            upper: [20.0, 1.0, 5.0, 60.0, 3.0, 3.0, 3.0, 10.0, 20.0, 20.0, 20.0],
        }
    }
}

impl SearchSpace {
    /// Creates a search space; every bound must be finite with `lower <= upper`.
    pub fn new(lower: [f64; PARAM_COUNT], upper: [f64; PARAM_COUNT]) -> Result<Self> {
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(ScheduleError::InvalidParameters(format!(
                    "bad bounds for {}: [{lo}, {hi}]",
                    PARAM_NAMES[i]
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Lower bounds.
    pub fn lower(&self) -> &[f64; PARAM_COUNT] {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &[f64; PARAM_COUNT] {
        &self.upper
    }

    /// Uniform value for dimension `i`.
    pub fn sample_dim<R: Rng>(&self, i: usize, rng: &mut R) -> f64 {
        rng.random_range(self.lower[i]..=self.upper[i])
    }

    /// Uniform point in the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..PARAM_COUNT).map(|i| self.sample_dim(i, rng)).collect()
    }

    /// Clamps `point` into the box in place.
    pub fn clamp(&self, point: &mut [f64]) {
        for (i, x) in point.iter_mut().enumerate().take(PARAM_COUNT) {
            *x = x.clamp(self.lower[i], self.upper[i]);
        }
    }

    /// Whether `point` lies in the box.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == PARAM_COUNT
            && point
                .iter()
                .enumerate()
                .all(|(i, x)| *x >= self.lower[i] && *x <= self.upper[i])
    }
}

/// Black-box objective: parameter vector → dispatcher objective.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicObjective<'a> {
    problem: &'a Problem,
    deviation_mode: DeviationMode,
}

impl<'a> HeuristicObjective<'a> {
    /// Creates an objective over `problem`.
    pub fn new(problem: &'a Problem) -> Self {
        Self {
            problem,
            deviation_mode: DeviationMode::default(),
        }
    }

    /// Sets the deviation convention used for every evaluation.
    pub fn with_deviation_mode(mut self, mode: DeviationMode) -> Self {
        self.deviation_mode = mode;
        self
    }

    /// Problem being tuned against.
    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Converts a vector to validated parameters.
    pub fn params(&self, vector: &[f64]) -> Result<HeuristicParams> {
        Ok(HeuristicParams::from_vector(vector)?.with_deviation_mode(self.deviation_mode))
    }

    /// Runs the dispatcher and returns its schedule and statistics.
    pub fn solve(&self, vector: &[f64]) -> Result<(Schedule, ScheduleStats)> {
        let mut dispatcher = Dispatcher::new(self.problem).with_params(self.params(vector)?)?;
        dispatcher.run()?;
        let stats = dispatcher.stats()?;
        Ok((dispatcher.into_schedule()?, stats))
    }

    /// Objective value, or `+∞` if the vector is invalid or the run fails.
    pub fn evaluate(&self, vector: &[f64]) -> f64 {
        match self.solve(vector) {
            Ok((_, stats)) => stats.objective(self.problem.objective_weights()),
            Err(err) => {
                warn!(error = %err, "candidate rejected");
                f64::INFINITY
            }
        }
    }

    /// Evaluates a batch, in parallel when enabled.
    pub fn evaluate_batch(&self, vectors: &[Vec<f64>], parallel: bool) -> Vec<f64> {
        #[cfg(feature = "parallel")]
        if parallel {
            use rayon::prelude::*;
            return vectors.par_iter().map(|v| self.evaluate(v)).collect();
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;
        vectors.iter().map(|v| self.evaluate(v)).collect()
    }
}

/// A new global best found during tuning.
#[derive(Debug, Clone, Copy)]
pub struct Improvement<'a> {
    /// Generation or iteration at which it was found (PSO reports its
    /// initial swarm as 0).
    pub iteration: usize,
    /// Winning parameters.
    pub params: &'a HeuristicParams,
    /// Objective value.
    pub objective: f64,
    /// Problem tuned against.
    pub problem: &'a Problem,
    /// Winning schedule.
    pub schedule: &'a Schedule,
    /// Statistics of the winning schedule.
    pub stats: &'a ScheduleStats,
}

/// Receives every new global best.
///
/// Sinks are `Send` so a search can report from its worker threads.
pub trait ImprovementSink: Send {
    /// Called once per improvement, in the order found.
    fn on_improvement(&mut self, improvement: &Improvement<'_>) -> Result<()>;
}

/// Sink that ignores improvements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardImprovements;

impl ImprovementSink for DiscardImprovements {
    fn on_improvement(&mut self, _improvement: &Improvement<'_>) -> Result<()> {
        Ok(())
    }
}

/// Writes each improvement as a solved scenario file and a stats file.
///
/// Both files are overwritten on every improvement, so after tuning they
/// hold the best result.
#[derive(Debug, Clone)]
pub struct ScenarioFileSink {
    document: ScenarioDocument,
    solution_path: PathBuf,
    stats_path: PathBuf,
    writes: usize,
}

impl ScenarioFileSink {
    /// Creates a sink that annotates copies of `document`.
    pub fn new(
        document: ScenarioDocument,
        solution_path: impl Into<PathBuf>,
        stats_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            document,
            solution_path: solution_path.into(),
            stats_path: stats_path.into(),
            writes: 0,
        }
    }

    /// Number of improvements written.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ImprovementSink for ScenarioFileSink {
    fn on_improvement(&mut self, improvement: &Improvement<'_>) -> Result<()> {
        let mut doc = self.document.clone();
        export_schedule(improvement.problem, improvement.schedule, &mut doc);
        doc.write_to(&self.solution_path)?;
        std::fs::write(
            &self.stats_path,
            serde_json::to_string_pretty(improvement.stats)?,
        )?;
        self.writes += 1;
        Ok(())
    }
}

/// Outcome of a tuning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningResult {
    /// Best parameter vector.
    pub best_vector: Vec<f64>,
    /// Best parameters, if the best vector is valid.
    pub best_params: Option<HeuristicParams>,
    /// Objective of the best vector (`+∞` if nothing valid was found).
    ///
    /// JSON has no infinity; it is written as `null` and read back as `+∞`.
    #[serde(deserialize_with = "infinite_if_null")]
    pub best_objective: f64,
    /// Generations or iterations completed.
    pub iterations: usize,
    /// Dispatcher runs performed.
    pub evaluations: usize,
    /// Best objective after the initial batch and after each iteration.
    #[serde(deserialize_with = "infinite_if_null_each")]
    pub history: Vec<f64>,
}

fn infinite_if_null<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
}

fn infinite_if_null_each<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(d)?;
    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::INFINITY))
        .collect())
}

/// Re-solves the new best and reports it to `sink`.
pub(crate) fn report_improvement(
    objective: &HeuristicObjective<'_>,
    sink: &mut dyn ImprovementSink,
    iteration: usize,
    vector: &[f64],
    value: f64,
) -> Result<()> {
    let params = objective.params(vector)?;
    let (schedule, stats) = objective.solve(vector)?;
    info!(iteration, objective = value, "new best parameters");
    sink.on_improvement(&Improvement {
        iteration,
        params: &params,
        objective: value,
        problem: objective.problem(),
        schedule: &schedule,
        stats: &stats,
    })
}

/// Index of the smallest value; the first wins ties.
pub(crate) fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}
