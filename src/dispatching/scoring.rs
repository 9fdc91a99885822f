//! Dispatch score terms.
//!
//! Each term is a pure function of a candidate `(task, machine, start)`.
//! The combined score is higher for better candidates.
//!
//! | Term | Value |
//! |------|-------|
//! | Tardiness risk | `max(0, tightness - slack_to_deadline)^p` |
//! | Throughput | `-(end)^p` |
//! | Deviation | `f(earlier_plan_start - start)`, see [`DeviationMode`] |

use super::params::{DeviationMode, HeuristicParams};
use crate::models::{MachineIndex, Problem, TaskIndex};

/// Tardiness-risk term.
///
/// `slack_to_deadline = deadline - end - required_remaining`, where
/// `required_remaining` is the average processing time still ahead of the
/// task in its job.
#[inline]
pub fn tardiness_score(
    deadline: f64,
    end: f64,
    required_remaining: f64,
    tightness_window: f64,
    pow: f64,
) -> f64 {
    let slack = deadline - end - required_remaining;
    let penalty = (tightness_window - slack).max(0.0);
    penalty.powf(pow)
}

/// Throughput term.
#[inline]
pub fn throughput_score(end: f64, pow: f64) -> f64 {
    -end.powf(pow)
}

/// Plan-deviation term; zero when the task has no earlier plan.
#[inline]
pub fn deviation_score(earlier_plan: Option<f64>, start: f64, pow: f64, mode: DeviationMode) -> f64 {
    let Some(earlier) = earlier_plan else {
        return 0.0;
    };
    let d = earlier - start;
    if d == 0.0 {
        return 0.0;
    }
    let magnitude = d.abs().powf(pow);
    match mode {
        DeviationMode::Signed => d.signum() * magnitude,
        DeviationMode::Symmetric => -magnitude,
    }
}

/// Combined score of starting `task` on `machine` at `start`.
///
/// The priority multiplier comes from the dispatch table in `params`, not
/// from the instance table used by the objective.
pub fn candidate_score(
    problem: &Problem,
    params: &HeuristicParams,
    task: TaskIndex,
    machine: MachineIndex,
    start: f64,
) -> f64 {
    let t = problem.task(task);
    let job = problem.job(t.job);
    let Some(duration) = t.processing_time_on(machine) else {
        return f64::NEG_INFINITY;
    };
    let end = start + duration;

    let tardiness = tardiness_score(
        job.deadline,
        end,
        t.required_remaining_time,
        params.tightness_window,
        params.tardiness_pow,
    );
    let throughput = throughput_score(end, params.time_pow);
    let deviation = deviation_score(
        t.earlier_plan_start,
        start,
        params.deviation_pow,
        params.deviation_mode,
    );

    params.priority.weight(job.priority)
        * (params.alpha_tardiness * tardiness
            + params.alpha_completion * throughput
            + params.alpha_deviation * deviation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, PriorityClass, ProblemBuilder, TaskSpec};

    #[test]
    fn test_tardiness_zero_when_loose() {
        // slack to deadline = 100 - 10 - 0 = 90 > 30
        assert_eq!(tardiness_score(100.0, 10.0, 0.0, 30.0, 2.0), 0.0);
    }

    #[test]
    fn test_tardiness_penalty() {
        // slack = 40 - 20 - 5 = 15, penalty = 30 - 15 = 15
        assert!((tardiness_score(40.0, 20.0, 5.0, 30.0, 2.0) - 225.0).abs() < 1e-10);
        assert!((tardiness_score(40.0, 20.0, 5.0, 30.0, 1.0) - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_throughput() {
        assert!((throughput_score(6.0, 1.0) + 6.0).abs() < 1e-10);
        assert!((throughput_score(3.0, 2.0) + 9.0).abs() < 1e-10);
        assert_eq!(throughput_score(0.0, 1.5), 0.0);
    }

    #[test]
    fn test_deviation_absent_plan() {
        assert_eq!(deviation_score(None, 5.0, 1.0, DeviationMode::Signed), 0.0);
        assert_eq!(deviation_score(None, 5.0, 2.0, DeviationMode::Symmetric), 0.0);
    }

    #[test]
    fn test_deviation_zero_on_plan() {
        for pow in [0.5, 1.0, 2.0, 3.0] {
            for mode in [DeviationMode::Signed, DeviationMode::Symmetric] {
                assert_eq!(deviation_score(Some(7.5), 7.5, pow, mode), 0.0);
            }
        }
    }

    #[test]
    fn test_deviation_signed() {
        // planned 10, start 7: d = 3
        assert!((deviation_score(Some(10.0), 7.0, 2.0, DeviationMode::Signed) - 9.0).abs() < 1e-10);
        // planned 10, start 12: d = -2
        assert!((deviation_score(Some(10.0), 12.0, 3.0, DeviationMode::Signed) + 8.0).abs() < 1e-10);
        assert!((deviation_score(Some(10.0), 12.0, 1.0, DeviationMode::Signed) + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_deviation_symmetric() {
        assert!(
            (deviation_score(Some(10.0), 7.0, 2.0, DeviationMode::Symmetric) + 9.0).abs() < 1e-10
        );
        assert!(
            (deviation_score(Some(10.0), 12.0, 2.0, DeviationMode::Symmetric) + 4.0).abs() < 1e-10
        );
    }

    #[test]
    fn test_candidate_score_combines_terms() {
        let mut b = ProblemBuilder::new();
        let m = b.add_machine(Machine::new(1, "A").with_processing_time_constant(2.0));
        let j = b.add_job(1, 40.0, PriorityClass::Low);
        b.add_task(j, TaskSpec::new(1, 5.0).on([m]).with_earlier_plan(4.0));
        let problem = b.build().unwrap();

        let params = HeuristicParams::default();
        // end = 2 + 10 = 12; slack = 28; penalty = 2; tardiness = 4
        // throughput = -12; deviation = 4 - 2 = 2
        // low weight 1 * (10*4 - 12 + 0.1*2)
        let score = candidate_score(&problem, &params, 0, m, 2.0);
        assert!((score - 28.2).abs() < 1e-9);
    }
}
