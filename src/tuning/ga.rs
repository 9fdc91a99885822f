//! Genetic algorithm over dispatcher parameters.
//!
//! The evolutionary loop is [`u_metaheur::ga::GaRunner`]; this module
//! supplies the [`GaProblem`] for weight vectors and maps [`GaConfig`] onto
//! the runner's configuration.
//!
//! # Operators
//!
//! - **Selection**: tournament of `tournament_size` individuals
//! - **Crossover**: each gene comes from either parent with equal probability
//! - **Mutation**: each gene is redrawn uniformly from its bounds with
//!   probability `1 - 2 * inherit_probability`
//!
//! Crossover and mutation are applied to every child, so a child gene comes
//! from each parent with probability `inherit_probability` and is fresh
//! otherwise.

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicBool, AtomicUsize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use u_metaheur::ga::{GaConfig as RunnerConfig, GaProblem, GaRunner, Individual, Selection};

use super::{report_improvement, HeuristicObjective, ImprovementSink, SearchSpace, TuningResult};
use crate::error::{Result, ScheduleError};

/// GA configuration.
///
/// # Defaults
///
/// ```
/// use u_dispatch::tuning::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.tournament_size, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of individuals per generation.
    pub population_size: usize,
    /// Generations after the initial population.
    pub max_generations: usize,
    /// Fraction of the population copied unchanged (0.0–1.0).
    pub elite_ratio: f64,
    /// Individuals compared per parent selection.
    pub tournament_size: usize,
    /// Probability of inheriting a gene from each parent (0.0–0.5).
    ///
    /// The remaining `1 - 2p` is the probability of a fresh random gene.
    pub inherit_probability: f64,
    /// Generations without improvement before stopping (0 disables).
    pub stagnation_limit: usize,
    /// Whether to evaluate children in parallel.
    pub parallel: bool,
    /// Random seed.
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            elite_ratio: 0.1,
            tournament_size: 3,
            inherit_probability: 0.45,
            stagnation_limit: 0,
            parallel: true,
            seed: 42,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Sets the per-parent inheritance probability.
    pub fn with_inherit_probability(mut self, p: f64) -> Self {
        self.inherit_probability = p.clamp(0.0, 0.5);
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of elites kept per generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio) as usize
    }

    /// Probability that mutation redraws a gene.
    pub fn resample_probability(&self) -> f64 {
        1.0 - 2.0 * self.inherit_probability
    }

    /// Runner configuration with this config's operators and limits.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_population_size(self.population_size)
            .with_max_generations(self.max_generations)
            .with_selection(Selection::Tournament(self.tournament_size))
            .with_elite_ratio(self.elite_ratio)
            .with_crossover_rate(1.0)
            .with_mutation_rate(1.0)
            .with_stagnation_limit(self.stagnation_limit)
            .with_parallel(self.parallel)
            .with_seed(self.seed)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.tournament_size == 0 {
            return Err(ScheduleError::InvalidParameters(
                "tournament_size must be at least 1".into(),
            ));
        }
        if !(0.0..=0.5).contains(&self.inherit_probability) {
            return Err(ScheduleError::InvalidParameters(
                "inherit_probability must be in [0, 0.5]".into(),
            ));
        }
        self.runner_config()
            .validate()
            .map_err(ScheduleError::InvalidParameters)
    }
}

/// A candidate parameter vector and its objective.
#[derive(Debug, Clone)]
struct WeightVector {
    genes: Vec<f64>,
    fitness: f64,
}

impl WeightVector {
    fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: f64::INFINITY,
        }
    }

    /// Lower fitness wins; equal fitness falls back to the smaller genes so
    /// the result does not depend on evaluation order.
    fn beats(&self, other: &WeightVector) -> bool {
        let by_genes = || {
            self.genes
                .iter()
                .zip(&other.genes)
                .map(|(a, b)| a.total_cmp(b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        };
        match self.fitness.total_cmp(&other.fitness) {
            Ordering::Less => true,
            Ordering::Equal => by_genes() == Ordering::Less,
            Ordering::Greater => false,
        }
    }
}

impl Individual for WeightVector {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

struct Reporter<'s> {
    sink: &'s mut dyn ImprovementSink,
    last: f64,
    error: Option<ScheduleError>,
}

/// Weight-vector search handed to the runner.
struct WeightProblem<'o, 'p, 's> {
    objective: &'o HeuristicObjective<'p>,
    space: &'o SearchSpace,
    resample_probability: f64,
    evaluations: AtomicUsize,
    incumbent: Mutex<Option<WeightVector>>,
    reporter: Mutex<Reporter<'s>>,
    cancel: Arc<AtomicBool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'o, 'p, 's> WeightProblem<'o, 'p, 's> {
    fn new(
        objective: &'o HeuristicObjective<'p>,
        space: &'o SearchSpace,
        resample_probability: f64,
        sink: &'s mut dyn ImprovementSink,
    ) -> Self {
        Self {
            objective,
            space,
            resample_probability,
            evaluations: AtomicUsize::new(0),
            incumbent: Mutex::new(None),
            reporter: Mutex::new(Reporter {
                sink,
                last: f64::INFINITY,
                error: None,
            }),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    fn track(&self, candidate: &WeightVector) {
        let mut incumbent = lock(&self.incumbent);
        if incumbent.as_ref().map_or(true, |best| candidate.beats(best)) {
            *incumbent = Some(candidate.clone());
        }
    }
}

impl GaProblem for WeightProblem<'_, '_, '_> {
    type Individual = WeightVector;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> WeightVector {
        WeightVector::new(self.space.sample(rng))
    }

    fn evaluate(&self, individual: &WeightVector) -> f64 {
        let fitness = self.objective.evaluate(&individual.genes);
        self.evaluations.fetch_add(1, atomic::Ordering::Relaxed);
        self.track(&WeightVector {
            genes: individual.genes.clone(),
            fitness,
        });
        fitness
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &WeightVector,
        parent2: &WeightVector,
        rng: &mut R,
    ) -> Vec<WeightVector> {
        let genes = parent1
            .genes
            .iter()
            .zip(&parent2.genes)
            .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
            .collect();
        vec![WeightVector::new(genes)]
    }

    fn mutate<R: Rng>(&self, individual: &mut WeightVector, rng: &mut R) {
        for (i, gene) in individual.genes.iter_mut().enumerate() {
            if rng.random::<f64>() < self.resample_probability {
                *gene = self.space.sample_dim(i, rng);
            }
        }
    }

    fn on_generation(&self, generation: usize, best_fitness: f64) {
        info!(generation, best = best_fitness, "ga generation");
        let Some(best) = lock(&self.incumbent).clone() else {
            return;
        };

        let mut reporter = lock(&self.reporter);
        let improved = best.fitness < reporter.last;
        if reporter.error.is_some() || !improved {
            return;
        }
        reporter.last = best.fitness;
        let result = report_improvement(
            self.objective,
            &mut *reporter.sink,
            generation,
            &best.genes,
            best.fitness,
        );
        if let Err(err) = result {
            reporter.error = Some(err);
            self.cancel.store(true, atomic::Ordering::Relaxed);
        }
    }
}

/// Genetic-algorithm tuner.
#[derive(Debug, Clone)]
pub struct GaTuner {
    config: GaConfig,
    space: SearchSpace,
}

impl GaTuner {
    /// Creates a tuner; fails if `config` is invalid.
    pub fn new(config: GaConfig, space: SearchSpace) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, space })
    }

    /// Configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Runs the search.
    ///
    /// After each generation a new global best is reported to `sink`; the
    /// initial population's best is reported with generation 1. A sink
    /// error stops the run and is returned.
    pub fn run(
        &self,
        objective: &HeuristicObjective<'_>,
        sink: &mut dyn ImprovementSink,
    ) -> Result<TuningResult> {
        let problem = WeightProblem::new(
            objective,
            &self.space,
            self.config.resample_probability(),
            sink,
        );
        let cancel = Arc::clone(&problem.cancel);
        let result =
            GaRunner::run_with_cancel(&problem, &self.config.runner_config(), Some(cancel));

        let WeightProblem {
            evaluations,
            reporter,
            ..
        } = problem;
        let reporter = reporter.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = reporter.error {
            return Err(err);
        }

        let result = result.map_err(ScheduleError::InvalidParameters)?;
        let best = result.best;
        Ok(TuningResult {
            best_params: objective.params(&best.genes).ok(),
            best_vector: best.genes,
            best_objective: result.best_fitness,
            iterations: result.generations,
            evaluations: evaluations.into_inner(),
            history: result.fitness_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::HeuristicParams;
    use crate::tuning::tests::{contested_problem, RecordingSink};
    use crate::tuning::{DiscardImprovements, Improvement};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FailingSink {
        calls: usize,
    }

    impl ImprovementSink for FailingSink {
        fn on_improvement(&mut self, _improvement: &Improvement<'_>) -> Result<()> {
            self.calls += 1;
            Err(ScheduleError::InvalidParameters("disk full".into()))
        }
    }

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.elite_count(), 10);
        assert!((config.inherit_probability - 0.45).abs() < 1e-10);
        assert!((config.resample_probability() - 0.1).abs() < 1e-10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_runner_config_mapping() {
        let runner = GaConfig::default()
            .with_population_size(20)
            .with_max_generations(7)
            .with_tournament_size(4)
            .with_stagnation_limit(3)
            .with_parallel(false)
            .with_seed(9)
            .runner_config();
        assert_eq!(runner.population_size, 20);
        assert_eq!(runner.max_generations, 7);
        assert_eq!(runner.selection, Selection::Tournament(4));
        assert_eq!(runner.stagnation_limit, 3);
        assert!(!runner.parallel);
        assert_eq!(runner.seed, Some(9));
        assert!((runner.crossover_rate - 1.0).abs() < 1e-10);
        assert!((runner.mutation_rate - 1.0).abs() < 1e-10);
        assert!(runner.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(GaConfig::default().with_population_size(1).validate().is_err());
        assert!(GaConfig::default()
            .with_population_size(10)
            .with_elite_ratio(1.0)
            .validate()
            .is_err());
        assert!(GaConfig::default().with_tournament_size(0).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaTuner::new(GaConfig::default().with_population_size(0), SearchSpace::default())
            .is_err());
    }

    #[test]
    fn test_history_monotone_and_sink_called() {
        let p = contested_problem();
        let objective = HeuristicObjective::new(&p);
        let config = GaConfig::default()
            .with_population_size(12)
            .with_max_generations(6)
            .with_seed(7);
        let tuner = GaTuner::new(config, SearchSpace::default()).unwrap();

        let mut sink = RecordingSink::default();
        let result = tuner.run(&objective, &mut sink).unwrap();

        assert_eq!(result.iterations, 6);
        assert_eq!(result.history.len(), 7);
        for w in result.history.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(!sink.objectives.is_empty());
        for w in sink.objectives.windows(2) {
            assert!(w[1] < w[0]);
        }
        assert_eq!(*sink.objectives.last().unwrap(), result.best_objective);
        // elites are not re-evaluated
        assert_eq!(result.evaluations, 12 + 6 * (12 - 1));
        assert!((objective.evaluate(&result.best_vector) - result.best_objective).abs() < 1e-9);
        assert!(result.best_params.is_some());
    }

    #[test]
    fn test_deterministic_for_seed() {
        let p = contested_problem();
        let objective = HeuristicObjective::new(&p);
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(4)
            .with_seed(11);
        let a = GaTuner::new(config.clone().with_parallel(true), SearchSpace::default())
            .unwrap()
            .run(&objective, &mut DiscardImprovements)
            .unwrap();
        let b = GaTuner::new(config.with_parallel(false), SearchSpace::default())
            .unwrap()
            .run(&objective, &mut DiscardImprovements)
            .unwrap();
        assert_eq!(a.best_vector, b.best_vector);
        assert_eq!(a.history, b.history);
        assert_eq!(a.evaluations, b.evaluations);
    }

    #[test]
    fn test_sink_error_stops_run() {
        let p = contested_problem();
        let objective = HeuristicObjective::new(&p);
        let config = GaConfig::default()
            .with_population_size(8)
            .with_max_generations(5)
            .with_seed(3);
        let tuner = GaTuner::new(config, SearchSpace::default()).unwrap();

        let mut sink = FailingSink { calls: 0 };
        let err = tuner.run(&objective, &mut sink).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidParameters(_)));
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_children_stay_in_bounds() {
        let p = contested_problem();
        let objective = HeuristicObjective::new(&p);
        let space = SearchSpace::default();
        let mut sink = DiscardImprovements;
        let problem = WeightProblem::new(&objective, &space, 0.1, &mut sink);

        let mut rng = StdRng::seed_from_u64(1);
        let p1 = problem.create_individual(&mut rng);
        let p2 = WeightVector::new(HeuristicParams::default().to_vector().to_vec());
        for _ in 0..50 {
            let mut child = problem.crossover(&p1, &p2, &mut rng).remove(0);
            problem.mutate(&mut child, &mut rng);
            assert!(space.contains(&child.genes));
            assert_eq!(child.fitness, f64::INFINITY);
        }
    }

    #[test]
    fn test_full_inheritance_never_resamples() {
        let p = contested_problem();
        let objective = HeuristicObjective::new(&p);
        let space = SearchSpace::default();
        let mut sink = DiscardImprovements;
        let problem = WeightProblem::new(&objective, &space, 0.0, &mut sink);

        let mut rng = StdRng::seed_from_u64(5);
        let p1 = problem.create_individual(&mut rng);
        let p2 = problem.create_individual(&mut rng);
        let mut child = problem.crossover(&p1, &p2, &mut rng).remove(0);
        problem.mutate(&mut child, &mut rng);
        for (i, gene) in child.genes.iter().enumerate() {
            assert!(*gene == p1.genes[i] || *gene == p2.genes[i]);
        }
    }

    #[test]
    fn test_incumbent_tie_break_is_order_free() {
        let a = WeightVector {
            genes: vec![1.0, 2.0],
            fitness: 5.0,
        };
        let b = WeightVector {
            genes: vec![1.0, 3.0],
            fitness: 5.0,
        };
        let c = WeightVector {
            genes: vec![9.0, 9.0],
            fitness: 4.0,
        };
        assert!(a.beats(&b));
        assert!(!b.beats(&a));
        assert!(c.beats(&a));
        assert!(!a.beats(&a));
    }
}
