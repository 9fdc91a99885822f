//! Objective and schedule statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Weighted completion | Σ over each job's last task of `end × w` |
//! | Weighted tardiness | Σ over each job's last task of `max(0, end - deadline)² × w` |
//! | Deviation | Σ over tasks with an earlier plan of `(start - planned)²` |
//! | Makespan | Latest end time |
//! | Tardy jobs / on-time rate | Jobs finishing after their deadline |
//! | Max tardiness | Largest single job delay |
//! | Avg utilization | Mean machine busy time / makespan |
//!
//! `w` is the task's weight from the instance-level priority table.

use serde::{Deserialize, Serialize};

use crate::models::{ObjectiveWeights, Problem, Schedule};

/// Aggregate statistics of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStats {
    /// Weighted completion time over jobs.
    pub total_weighted_completion_time: f64,
    /// Squared deviation from the earlier plan.
    pub deviation_from_earlier_plan: f64,
    /// Weighted squared tardiness over jobs.
    pub total_tardiness: f64,
    /// Number of jobs.
    pub n_jobs: usize,
    /// Number of tasks.
    pub n_tasks: usize,
    /// Number of machines.
    pub n_machines: usize,
    /// Latest end time.
    pub makespan: f64,
    /// Jobs finishing after their deadline.
    pub tardy_jobs: usize,
    /// Fraction of jobs finishing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Largest unweighted job tardiness.
    pub max_tardiness: f64,
    /// Mean machine utilization over the makespan (0.0..1.0).
    pub avg_utilization: f64,
}

impl ScheduleStats {
    /// Computes statistics of `schedule` against `problem`.
    ///
    /// Jobs whose last task has no solution are left out of the job sums.
    pub fn calculate(problem: &Problem, schedule: &Schedule) -> Self {
        let mut completion = 0.0;
        let mut tardiness = 0.0;
        let mut max_tardiness: f64 = 0.0;
        let mut tardy_jobs = 0;
        let mut finished_jobs = 0;

        for last in problem.last_tasks() {
            let Some(solution) = schedule.get(last) else {
                continue;
            };
            finished_jobs += 1;
            let task = problem.task(last);
            let late = (solution.end - problem.job(task.job).deadline).max(0.0);
            completion += solution.end * task.priority_weight;
            tardiness += late * late * task.priority_weight;
            if late > 0.0 {
                tardy_jobs += 1;
                max_tardiness = max_tardiness.max(late);
            }
        }

        let deviation = problem
            .tasks()
            .iter()
            .enumerate()
            .filter_map(|(i, task)| {
                let planned = task.earlier_plan_start?;
                let solution = schedule.get(i)?;
                let d = solution.start - planned;
                Some(d * d)
            })
            .sum();

        let makespan = schedule.makespan();
        let avg_utilization = if makespan > 0.0 && problem.machine_count() > 0 {
            let mut busy = vec![0.0; problem.machine_count()];
            for solution in schedule.iter() {
                busy[solution.machine] += solution.duration();
            }
            busy.iter().map(|b| b / makespan).sum::<f64>() / problem.machine_count() as f64
        } else {
            0.0
        };

        let on_time_rate = if finished_jobs == 0 {
            1.0
        } else {
            (finished_jobs - tardy_jobs) as f64 / finished_jobs as f64
        };

        Self {
            total_weighted_completion_time: completion,
            deviation_from_earlier_plan: deviation,
            total_tardiness: tardiness,
            n_jobs: problem.job_count(),
            n_tasks: problem.task_count(),
            n_machines: problem.machine_count(),
            makespan,
            tardy_jobs,
            on_time_rate,
            max_tardiness,
            avg_utilization,
        }
    }

    /// Weighted objective (lower is better).
    pub fn objective(&self, weights: &ObjectiveWeights) -> f64 {
        weights.alpha_completion_time * self.total_weighted_completion_time
            + weights.alpha_tardiness * self.total_tardiness
            + weights.alpha_robust * self.deviation_from_earlier_plan
    }
}

/// Objective of `schedule` under the problem's own objective weights.
pub fn objective_value(problem: &Problem, schedule: &Schedule) -> f64 {
    ScheduleStats::calculate(problem, schedule).objective(problem.objective_weights())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, PriorityClass, ProblemBuilder, Solution, TaskSpec};

    fn sample() -> (Problem, Schedule) {
        let mut b = ProblemBuilder::new();
        let m1 = b.add_machine(Machine::new(1, "A"));
        let m2 = b.add_machine(Machine::new(2, "B"));
        let j1 = b.add_job(1, 10.0, PriorityClass::High);
        let j2 = b.add_job(2, 4.0, PriorityClass::Low);
        b.add_task(j1, TaskSpec::new(1, 3.0).on([m1]).with_earlier_plan(1.0));
        b.add_task(j1, TaskSpec::new(2, 4.0).on([m2]));
        b.add_task(j2, TaskSpec::new(3, 5.0).on([m1]).with_earlier_plan(3.0));
        let p = b.build().unwrap();

        let mut s = Schedule::with_task_count(3);
        s.insert(Solution::new(0, m1, 0.0, 3.0, 0.0)).unwrap();
        s.insert(Solution::new(1, m2, 3.0, 7.0, 0.0)).unwrap();
        s.insert(Solution::new(2, m1, 3.0, 8.0, 0.0)).unwrap();
        (p, s)
    }

    #[test]
    fn test_stats_basic() {
        let (p, s) = sample();
        let stats = ScheduleStats::calculate(&p, &s);
        // job1 ends 7 (weight 16), job2 ends 8 (weight 1)
        assert!((stats.total_weighted_completion_time - (7.0 * 16.0 + 8.0)).abs() < 1e-10);
        // job2 late by 4 -> 16 * 1
        assert!((stats.total_tardiness - 16.0).abs() < 1e-10);
        // task1: (0-1)^2 = 1, task3: (3-3)^2 = 0
        assert!((stats.deviation_from_earlier_plan - 1.0).abs() < 1e-10);
        assert_eq!(stats.n_jobs, 2);
        assert_eq!(stats.n_tasks, 3);
        assert_eq!(stats.n_machines, 2);
    }

    #[test]
    fn test_stats_kpis() {
        let (p, s) = sample();
        let stats = ScheduleStats::calculate(&p, &s);
        assert!((stats.makespan - 8.0).abs() < 1e-10);
        assert_eq!(stats.tardy_jobs, 1);
        assert!((stats.on_time_rate - 0.5).abs() < 1e-10);
        assert!((stats.max_tardiness - 4.0).abs() < 1e-10);
        // m1 busy 8/8, m2 busy 4/8
        assert!((stats.avg_utilization - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_objective() {
        let (p, s) = sample();
        let stats = ScheduleStats::calculate(&p, &s);
        let expected = 120.0 + 10.0 * 16.0 + 0.1 * 1.0;
        assert!((stats.objective(p.objective_weights()) - expected).abs() < 1e-9);
        assert!((objective_value(&p, &s) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty_schedule() {
        let (p, _) = sample();
        let stats = ScheduleStats::calculate(&p, &Schedule::default());
        assert_eq!(stats.total_weighted_completion_time, 0.0);
        assert_eq!(stats.avg_utilization, 0.0);
        assert!((stats.on_time_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_stats_json_keys() {
        let (p, s) = sample();
        let value = serde_json::to_value(ScheduleStats::calculate(&p, &s)).unwrap();
        for key in [
            "total_weighted_completion_time",
            "deviation_from_earlier_plan",
            "total_tardiness",
            "n_jobs",
            "n_tasks",
            "n_machines",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
