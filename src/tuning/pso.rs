//! Particle swarm over dispatcher parameters.
//!
//! # Algorithm
//!
//! Each particle keeps a position `x`, velocity `v`, and personal best `p`;
//! the swarm keeps a global best `g`. Per iteration and particle, with two
//! uniform draws `r1, r2` in `[0, 1)`:
//!
//! ```text
//! v ← w·v + c1·r1·(p − x) + c2·r2·(g − x)
//! ```
//!
//! In every dimension where `x + v` would leave the search box the velocity
//! bounces: `v ← −v / 2`. The particle then moves to `x + v`, clamped to the
//! box. All particles move before the batch is evaluated.
//!
//! # Reference
//! Kennedy & Eberhart (1995), "Particle Swarm Optimization"

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{argmin, report_improvement, HeuristicObjective, ImprovementSink, SearchSpace, TuningResult};
use crate::dispatching::PARAM_COUNT;
use crate::error::{Result, ScheduleError};

/// PSO configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    /// Number of particles.
    pub swarm_size: usize,
    /// Iterations after the initial evaluation.
    pub max_iterations: usize,
    /// Velocity inertia `w`.
    pub inertia: f64,
    /// Attraction to the personal best `c1`.
    pub cognitive: f64,
    /// Attraction to the global best `c2`.
    pub social: f64,
    /// Whether to evaluate particles in parallel.
    pub parallel: bool,
    /// Random seed.
    pub seed: u64,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            max_iterations: 100,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            parallel: true,
            seed: 42,
        }
    }
}

impl PsoConfig {
    /// Sets the swarm size.
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    /// Sets the number of iterations.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets inertia and both attraction coefficients.
    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
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

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size == 0 {
            return Err(ScheduleError::InvalidParameters(
                "swarm_size must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("inertia", self.inertia),
            ("cognitive", self.cognitive),
            ("social", self.social),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScheduleError::InvalidParameters(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Particle {
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    best_score: f64,
}

/// Particle-swarm tuner.
#[derive(Debug, Clone)]
pub struct PsoTuner {
    config: PsoConfig,
    space: SearchSpace,
}

impl PsoTuner {
    /// Creates a tuner; fails if `config` is invalid.
    pub fn new(config: PsoConfig, space: SearchSpace) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, space })
    }

    /// Configuration.
    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// Runs the search. Every new global best is reported to `sink`.
    pub fn run(
        &self,
        objective: &HeuristicObjective<'_>,
        sink: &mut dyn ImprovementSink,
    ) -> Result<TuningResult> {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let positions: Vec<Vec<f64>> = (0..config.swarm_size)
            .map(|_| self.space.sample(&mut rng))
            .collect();
        let scores = objective.evaluate_batch(&positions, config.parallel);
        let mut evaluations = positions.len();

        let mut swarm: Vec<Particle> = positions
            .into_iter()
            .zip(&scores)
            .map(|(position, &score)| Particle {
                velocity: vec![0.0; PARAM_COUNT],
                best_position: position.clone(),
                position,
                best_score: score,
            })
            .collect();

        let first = argmin(&scores).unwrap_or(0);
        let mut best_position = swarm[first].position.clone();
        let mut best_score = scores[first];
        if best_score.is_finite() {
            report_improvement(objective, sink, 0, &best_position, best_score)?;
        }
        let mut history = Vec::with_capacity(config.max_iterations + 1);
        history.push(best_score);

        for iteration in 1..=config.max_iterations {
            for particle in &mut swarm {
                self.step(particle, &best_position, &mut rng);
            }
            let positions: Vec<Vec<f64>> = swarm.iter().map(|p| p.position.clone()).collect();
            let scores = objective.evaluate_batch(&positions, config.parallel);
            evaluations += positions.len();

            let mut improved = None;
            for (i, (particle, &score)) in swarm.iter_mut().zip(&scores).enumerate() {
                if score < particle.best_score {
                    particle.best_score = score;
                    particle.best_position = particle.position.clone();
                }
                if score < best_score {
                    best_score = score;
                    best_position = particle.position.clone();
                    improved = Some(i);
                }
            }
            if improved.is_some() {
                report_improvement(objective, sink, iteration, &best_position, best_score)?;
            }
            history.push(best_score);
            info!(iteration, best = best_score, "pso iteration");
        }

        Ok(TuningResult {
            best_params: objective.params(&best_position).ok(),
            best_vector: best_position,
            best_objective: best_score,
            iterations: config.max_iterations,
            evaluations,
            history,
        })
    }

    /// Moves one particle.
    fn step<R: Rng>(&self, particle: &mut Particle, global_best: &[f64], rng: &mut R) {
        let c = &self.config;
        let r1: f64 = rng.random();
        let r2: f64 = rng.random();
        let (lower, upper) = (self.space.lower(), self.space.upper());

        for i in 0..particle.position.len() {
            let x = particle.position[i];
            let mut v = c.inertia * particle.velocity[i]
                + c.cognitive * r1 * (particle.best_position[i] - x)
                + c.social * r2 * (global_best[i] - x);
            if x + v > upper[i] || x + v < lower[i] {
                v = -v / 2.0;
            }
            particle.velocity[i] = v;
            particle.position[i] = (x + v).clamp(lower[i], upper[i]);
        }
    }
}
