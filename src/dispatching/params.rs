//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::PriorityWeights;

/// Number of tunable scalars in [`HeuristicParams`].
pub const PARAM_COUNT: usize = 11;

/// Names of the tunables, in vector order.
pub const PARAM_NAMES: [&str; PARAM_COUNT] = [
    "alpha_tardiness",
    "alpha_deviation",
    "alpha_completion",
    "tightness_window",
    "tardiness_pow",
    "deviation_pow",
    "time_pow",
    "slack",
    "priority_high",
    "priority_medium",
    "priority_low",
];

/// How the deviation term treats early versus late starts.
///
/// With `d = earlier_plan_start - start`:
/// - `Signed`: `sign(d) * |d|^p`. Starting before the earlier plan scores
///   positively, starting after it negatively.
/// - `Symmetric`: `-|d|^p`. Any departure from the plan is penalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationMode {
    /// Odd-power behaviour (default).
    #[default]
    Signed,
    /// Penalize departure in either direction.
    Symmetric,
}

/// Weights and shape parameters of the dispatch score.
///
/// # Example
/// ```
/// use u_dispatch::dispatching::HeuristicParams;
///
/// let params = HeuristicParams::default()
///     .with_slack(5.0)
///     .with_tightness_window(45.0);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.to_vector()[7], 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicParams {
    /// Weight of the tardiness-risk term.
    pub alpha_tardiness: f64,
    /// Weight of the plan-deviation term.
    pub alpha_deviation: f64,
    /// Weight of the throughput term.
    pub alpha_completion: f64,
    /// Deadline slack below which the tardiness penalty starts.
    pub tightness_window: f64,
    /// Exponent of the tardiness penalty.
    pub tardiness_pow: f64,
    /// Exponent of the deviation term.
    pub deviation_pow: f64,
    /// Exponent of the throughput term.
    pub time_pow: f64,
    /// Window tolerance around the horizon.
    pub slack: f64,
    /// Dispatch-time priority table.
    pub priority: PriorityWeights,
    /// Sign convention of the deviation term.
    pub deviation_mode: DeviationMode,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            alpha_tardiness: 10.0,
            alpha_deviation: 0.1,
            alpha_completion: 1.0,
            tightness_window: 30.0,
            tardiness_pow: 2.0,
            deviation_pow: 1.0,
            time_pow: 1.0,
            slack: 2.0,
            priority: PriorityWeights::new(4.0, 4.0, 1.0),
            deviation_mode: DeviationMode::Signed,
        }
    }
}

impl HeuristicParams {
    /// Sets the tardiness weight.
    pub fn with_alpha_tardiness(mut self, value: f64) -> Self {
        self.alpha_tardiness = value;
        self
    }

    /// Sets the deviation weight.
    pub fn with_alpha_deviation(mut self, value: f64) -> Self {
        self.alpha_deviation = value;
        self
    }

    /// Sets the throughput weight.
    pub fn with_alpha_completion(mut self, value: f64) -> Self {
        self.alpha_completion = value;
        self
    }

    /// Sets the tightness window.
    pub fn with_tightness_window(mut self, value: f64) -> Self {
        self.tightness_window = value;
        self
    }

    /// Sets the tardiness exponent.
    pub fn with_tardiness_pow(mut self, value: f64) -> Self {
        self.tardiness_pow = value;
        self
    }

    /// Sets the deviation exponent.
    pub fn with_deviation_pow(mut self, value: f64) -> Self {
        self.deviation_pow = value;
        self
    }

    /// Sets the throughput exponent.
    pub fn with_time_pow(mut self, value: f64) -> Self {
        self.time_pow = value;
        self
    }

    /// Sets the window slack.
    pub fn with_slack(mut self, value: f64) -> Self {
        self.slack = value;
        self
    }

    /// Sets the dispatch priority table.
    pub fn with_priority(mut self, priority: PriorityWeights) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the deviation convention.
    pub fn with_deviation_mode(mut self, mode: DeviationMode) -> Self {
        self.deviation_mode = mode;
        self
    }

    /// Checks that every value is usable by the engine.
    ///
    /// Rejects non-finite values, negative slack, non-positive exponents,
    /// and negative priority weights.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in PARAM_NAMES.iter().zip(self.to_vector()) {
            if !value.is_finite() {
                return Err(ScheduleError::InvalidParameters(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.slack < 0.0 {
            return Err(ScheduleError::InvalidParameters(format!(
                "slack must be >= 0, got {}",
                self.slack
            )));
        }
        for (name, value) in [
            ("tardiness_pow", self.tardiness_pow),
            ("deviation_pow", self.deviation_pow),
            ("time_pow", self.time_pow),
        ] {
            if value <= 0.0 {
                return Err(ScheduleError::InvalidParameters(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("priority_high", self.priority.high),
            ("priority_medium", self.priority.medium),
            ("priority_low", self.priority.low),
        ] {
            if value < 0.0 {
                return Err(ScheduleError::InvalidParameters(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Flattens the tunables in [`PARAM_NAMES`] order.
    pub fn to_vector(&self) -> [f64; PARAM_COUNT] {
        [
            self.alpha_tardiness,
            self.alpha_deviation,
            self.alpha_completion,
            self.tightness_window,
            self.tardiness_pow,
            self.deviation_pow,
            self.time_pow,
            self.slack,
            self.priority.high,
            self.priority.medium,
            self.priority.low,
        ]
    }

    /// Builds validated parameters from an 11-vector.
    ///
    /// The deviation mode is the default; use [`Self::with_deviation_mode`]
    /// to change it.
    pub fn from_vector(values: &[f64]) -> Result<Self> {
        let &[alpha_tardiness, alpha_deviation, alpha_completion, tightness_window, tardiness_pow, deviation_pow, time_pow, slack, high, medium, low] =
            values
        else {
            return Err(ScheduleError::InvalidParameters(format!(
                "expected {PARAM_COUNT} values, got {}",
                values.len()
            )));
        };
        let params = Self {
            alpha_tardiness,
            alpha_deviation,
            alpha_completion,
            tightness_window,
            tardiness_pow,
            deviation_pow,
            time_pow,
            slack,
            priority: PriorityWeights::new(high, medium, low),
            deviation_mode: DeviationMode::default(),
        };
        params.validate()?;
        Ok(params)
    }
}
