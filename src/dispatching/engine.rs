//! Windowed list-scheduling engine.
//!
//! # Algorithm
//!
//! The engine keeps a horizon `t` and, at every step, the sets
//! - `H`: committed tasks,
//! - `C`: committed tasks ending by `t + slack`,
//! - `M`: machines that still have unscheduled eligible tasks,
//! - `W`: machines of `M` whose idle time lies in `[t - slack, t + slack]`,
//! - `D`: unscheduled tasks whose predecessor is absent or in `C` and which
//!   have an eligible machine in `W`.
//!
//! 1. Score every `(task in D, machine in W)` pair at its earliest feasible
//!    start and commit the best one.
//! 2. Prune machines with nothing left to do, move `t` to the earliest idle
//!    time over `M`, and recompute `W`, `C`, `D`.
//! 3. While `D` is empty, widen the window: pull in the machines of `M \ W`
//!    with the earliest idle time or, if every machine is already in the
//!    window, move `t` to the next committed end time beyond it.
//!
//! All sets are rebuilt from the canonical state (unscheduled mask, committed
//! solutions, idle times) on every step.
//!
//! # Complexity
//! O(n · (n + m·k)) per run, where n = tasks, m = machines and k = tasks per
//! machine.

use tracing::debug;

use super::params::HeuristicParams;
use super::scoring::candidate_score;
use crate::error::{Result, ScheduleError};
use crate::evaluation::ScheduleStats;
use crate::models::{MachineIndex, Problem, Schedule, Solution, TaskIndex};
use crate::scenario::{export_schedule, ScenarioDocument};

/// Best candidate found during selection.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    task: TaskIndex,
    machine: MachineIndex,
    start: f64,
    end: f64,
    score: f64,
}

/// Per-run mutable state.
#[derive(Debug, Clone)]
struct RunState {
    unscheduled: Vec<bool>,
    remaining: usize,
    schedule: Schedule,
    /// Earliest free time per machine; `None` once pruned from `M`.
    idle: Vec<Option<f64>>,
    /// Unscheduled eligible tasks per machine.
    pending: Vec<usize>,
    in_window: Vec<bool>,
    completed: Vec<bool>,
    dispatchable: Vec<bool>,
    t: f64,
}

impl RunState {
    fn new(problem: &Problem) -> Self {
        let n = problem.task_count();
        let pending: Vec<usize> = problem.machines().iter().map(|m| m.tasks.len()).collect();
        let idle = pending
            .iter()
            .map(|&count| (count > 0).then_some(0.0))
            .collect();
        Self {
            unscheduled: vec![true; n],
            remaining: n,
            schedule: Schedule::with_task_count(n),
            idle,
            in_window: vec![false; problem.machine_count()],
            pending,
            completed: vec![false; n],
            dispatchable: vec![false; n],
            t: 0.0,
        }
    }
}

/// Deadline- and plan-stability-aware dispatcher.
///
/// Borrows a [`Problem`] read-only; each dispatcher owns its own run state,
/// so several may run concurrently against one problem.
///
/// # Example
/// ```
/// use u_dispatch::dispatching::Dispatcher;
/// use u_dispatch::models::{Machine, PriorityClass, ProblemBuilder, TaskSpec};
///
/// let mut b = ProblemBuilder::new();
/// let m1 = b.add_machine(Machine::new(1, "CUT"));
/// let m2 = b.add_machine(Machine::new(2, "WELD"));
/// let job = b.add_job(1, 100.0, PriorityClass::High);
/// b.add_task(job, TaskSpec::new(1, 5.0).on([m1]));
/// b.add_task(job, TaskSpec::new(2, 3.0).on([m2]));
/// let problem = b.build().unwrap();
///
/// let mut dispatcher = Dispatcher::new(&problem);
/// let schedule = dispatcher.run().unwrap();
/// assert_eq!(schedule.get(1).unwrap().start, 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher<'a> {
    problem: &'a Problem,
    params: HeuristicParams,
    state: RunState,
    solved: bool,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher with default parameters.
    pub fn new(problem: &'a Problem) -> Self {
        Self {
            problem,
            params: HeuristicParams::default(),
            state: RunState::new(problem),
            solved: false,
        }
    }

    /// Replaces the parameters (validated).
    pub fn with_params(mut self, params: HeuristicParams) -> Result<Self> {
        self.set_params(params)?;
        Ok(self)
    }

    /// Replaces the parameters (validated) and discards any previous run.
    pub fn set_params(&mut self, params: HeuristicParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.reset();
        Ok(())
    }

    /// Applies `change` to a copy of the parameters and keeps it if valid.
    ///
    /// ```
    /// # use u_dispatch::dispatching::Dispatcher;
    /// # use u_dispatch::models::ProblemBuilder;
    /// # let problem = ProblemBuilder::new().build().unwrap();
    /// let mut d = Dispatcher::new(&problem);
    /// assert!(d.update_params(|p| p.slack = 4.0).is_ok());
    /// assert!(d.update_params(|p| p.slack = -1.0).is_err());
    /// assert_eq!(d.params().slack, 4.0);
    /// ```
    pub fn update_params(&mut self, change: impl FnOnce(&mut HeuristicParams)) -> Result<()> {
        let mut params = self.params;
        change(&mut params);
        self.set_params(params)
    }

    /// Current parameters.
    pub fn params(&self) -> &HeuristicParams {
        &self.params
    }

    /// Problem being scheduled.
    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Discards run state so the next [`run`](Self::run) starts fresh.
    pub fn reset(&mut self) {
        self.state = RunState::new(self.problem);
        self.solved = false;
    }

    /// Whether the last run completed.
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Dispatches every task.
    ///
    /// Any previous result is discarded first, so repeated calls give the
    /// same schedule. Fails with [`ScheduleError::Infeasible`] if the run
    /// gets stuck with tasks left.
    pub fn run(&mut self) -> Result<&Schedule> {
        self.params.validate()?;
        self.reset();

        if self.state.remaining > 0 {
            self.refresh_window();
            self.refresh_sets();
            loop {
                self.expand_window()?;
                let candidate = self.select().ok_or_else(|| self.infeasible())?;
                self.commit(candidate)?;
                if self.state.remaining == 0 {
                    break;
                }
                self.advance();
            }
        }

        self.solved = true;
        debug!(
            tasks = self.problem.task_count(),
            makespan = self.state.schedule.makespan(),
            "dispatch run complete"
        );
        Ok(&self.state.schedule)
    }

    /// Schedule of the last completed run.
    pub fn schedule(&self) -> Result<&Schedule> {
        if self.solved {
            Ok(&self.state.schedule)
        } else {
            Err(ScheduleError::NotSolved)
        }
    }

    /// Consumes the dispatcher, returning the schedule of the last run.
    pub fn into_schedule(self) -> Result<Schedule> {
        if self.solved {
            Ok(self.state.schedule)
        } else {
            Err(ScheduleError::NotSolved)
        }
    }

    /// Statistics of the last completed run.
    pub fn stats(&self) -> Result<ScheduleStats> {
        Ok(ScheduleStats::calculate(self.problem, self.schedule()?))
    }

    /// Objective of the last completed run under the problem's weights.
    pub fn objective(&self) -> Result<f64> {
        Ok(self.stats()?.objective(self.problem.objective_weights()))
    }

    /// Writes the last run's solutions into `doc`; returns the task count written.
    pub fn export_solutions(&self, doc: &mut ScenarioDocument) -> Result<usize> {
        Ok(export_schedule(self.problem, self.schedule()?, doc))
    }

    /// Highest-scoring `(task, machine)` pair over `D × W`.
    fn select(&self) -> Option<Candidate> {
        let state = &self.state;
        let mut best: Option<Candidate> = None;

        for (m, machine) in self.problem.machines().iter().enumerate() {
            if !state.in_window[m] {
                continue;
            }
            let Some(idle) = state.idle[m] else {
                continue;
            };
            for &t in &machine.tasks {
                if !state.dispatchable[t] {
                    continue;
                }
                let task = self.problem.task(t);
                let Some(duration) = task.processing_time_on(m) else {
                    continue;
                };
                let ready = task
                    .predecessor
                    .and_then(|p| state.schedule.get(p))
                    .map_or(0.0, |s| s.end);
                let start = ready.max(idle);
                let mut score = candidate_score(self.problem, &self.params, t, m, start);
                if score.is_nan() {
                    score = f64::NEG_INFINITY;
                }
                let candidate = Candidate {
                    task: t,
                    machine: m,
                    start,
                    end: start + duration,
                    score,
                };
                if best.map_or(true, |b| self.beats(&candidate, &b)) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Higher score wins; ties go to the lower task id, then machine id.
    fn beats(&self, a: &Candidate, b: &Candidate) -> bool {
        if a.score != b.score {
            return a.score > b.score;
        }
        let key = |c: &Candidate| {
            (
                self.problem.task(c.task).id,
                self.problem.machine(c.machine).id,
            )
        };
        key(a) < key(b)
    }

    fn commit(&mut self, c: Candidate) -> Result<()> {
        let state = &mut self.state;
        state
            .schedule
            .insert(Solution::new(c.task, c.machine, c.start, c.end, c.score))?;
        state.unscheduled[c.task] = false;
        state.dispatchable[c.task] = false;
        state.remaining -= 1;
        state.idle[c.machine] = Some(c.end);

        for &m in &self.problem.task(c.task).eligible {
            state.pending[m] -= 1;
            if state.pending[m] == 0 {
                state.idle[m] = None;
                state.in_window[m] = false;
            }
        }

        debug!(
            task = self.problem.task(c.task).id,
            machine = self.problem.machine(c.machine).id,
            start = c.start,
            end = c.end,
            score = c.score,
            "committed"
        );
        Ok(())
    }

    /// Moves the horizon to the earliest idle time and rebuilds the sets.
    fn advance(&mut self) {
        if let Some(t) = min_idle(&self.state.idle, |_| true) {
            self.state.t = t;
        }
        self.refresh_window();
        self.refresh_sets();
    }

    /// Widens the window until `D` is non-empty.
    fn expand_window(&mut self) -> Result<()> {
        while !self.state.dispatchable.iter().any(|&d| d) {
            let state = &mut self.state;
            let outside = |m: usize| !state.in_window[m];
            let before = state.t;

            match min_idle(&state.idle, outside) {
                Some(t) => {
                    state.t = t;
                    let slack = self.params.slack;
                    for m in 0..state.idle.len() {
                        if state.in_window[m] {
                            continue;
                        }
                        if let Some(idle) = state.idle[m] {
                            if (idle - t).abs() <= slack {
                                state.in_window[m] = true;
                            }
                        }
                    }
                }
                None => {
                    let next_end = state
                        .schedule
                        .iter()
                        .filter(|s| !state.completed[s.task] && s.end > state.t)
                        .map(|s| s.end)
                        .min_by(f64::total_cmp);
                    match next_end {
                        Some(end) => state.t = end,
                        None => return Err(self.infeasible()),
                    }
                }
            }
            if !self.state.t.is_finite() {
                return Err(self.infeasible());
            }
            debug!(from = before, to = self.state.t, "window expanded");
            self.refresh_sets();
        }
        Ok(())
    }

    /// Rebuilds `W` over `M` from the idle times.
    fn refresh_window(&mut self) {
        let state = &mut self.state;
        let (t, slack) = (state.t, self.params.slack);
        for (flag, idle) in state.in_window.iter_mut().zip(&state.idle) {
            *flag = idle.is_some_and(|i| (i - t).abs() <= slack);
        }
    }

    /// Rebuilds `C` and `D`.
    fn refresh_sets(&mut self) {
        let state = &mut self.state;
        let limit = state.t + self.params.slack;
        for s in state.schedule.iter() {
            state.completed[s.task] = s.end <= limit;
        }
        for (t, task) in self.problem.tasks().iter().enumerate() {
            state.dispatchable[t] = state.unscheduled[t]
                && task.predecessor.map_or(true, |p| state.completed[p])
                && task.eligible.iter().any(|&m| state.in_window[m]);
        }
    }

    fn infeasible(&self) -> ScheduleError {
        let first = self.state.unscheduled.iter().position(|&u| u);
        ScheduleError::Infeasible {
            horizon: self.state.t,
            remaining: self.state.remaining,
            first_task_id: first.map_or(-1, |t| self.problem.task(t).id),
        }
    }
}

/// Smallest idle time among unpruned machines accepted by `filter`.
fn min_idle(idle: &[Option<f64>], filter: impl Fn(usize) -> bool) -> Option<f64> {
    idle.iter()
        .enumerate()
        .filter(|&(m, _)| filter(m))
        .filter_map(|(_, i)| *i)
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::DeviationMode;
    use crate::evaluation::{objective_value, verify_schedule};
    use crate::models::{Machine, PriorityClass, ProblemBuilder, TaskSpec};
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_chain_on_disjoint_machines() {
        let mut b = ProblemBuilder::new();
        let m1 = b.add_machine(Machine::new(1, "A"));
        let m2 = b.add_machine(Machine::new(2, "B"));
        let j = b.add_job(1, 1000.0, PriorityClass::Medium);
        b.add_task(j, TaskSpec::new(1, 5.0).on([m1]));
        b.add_task(j, TaskSpec::new(2, 3.0).on([m2]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p);
        let s = d.run().unwrap();
        assert_close(s.get(0).unwrap().start, 0.0);
        assert_close(s.get(1).unwrap().start, 5.0);
        assert_close(s.get(1).unwrap().end, 8.0);
        assert_close(d.stats().unwrap().total_tardiness, 0.0);
    }

    #[test]
    fn test_higher_priority_first_on_shared_machine() {
        let mut b = ProblemBuilder::new();
        let m = b.add_machine(Machine::new(1, "A"));
        // Both deadlines inside the tightness window, so the urgency term
        // dominates and the priority multiplier decides. Far deadlines
        // invert the order (next test).
        let low = b.add_job(1, 10.0, PriorityClass::Low);
        let high = b.add_job(2, 10.0, PriorityClass::High);
        b.add_task(low, TaskSpec::new(1, 4.0).on([m]));
        b.add_task(high, TaskSpec::new(2, 4.0).on([m]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p).with_params(HeuristicParams::default()).unwrap();
        let s = d.run().unwrap();
        assert_close(s.get(1).unwrap().start, 0.0);
        assert_close(s.get(0).unwrap().start, 4.0);
        assert_eq!(s.commit_order(), &[1, 0]);
    }

    #[test]
    fn test_far_deadlines_put_high_priority_last() {
        // With no urgency the score is `weight * -end`, so the larger High
        // weight makes its candidate the most negative.
        let mut b = ProblemBuilder::new();
        let m = b.add_machine(Machine::new(1, "A"));
        let low = b.add_job(1, 1000.0, PriorityClass::Low);
        let high = b.add_job(2, 1000.0, PriorityClass::High);
        b.add_task(low, TaskSpec::new(1, 4.0).on([m]));
        b.add_task(high, TaskSpec::new(2, 4.0).on([m]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p);
        let s = d.run().unwrap();
        assert_eq!(s.commit_order(), &[0, 1]);
    }

    #[test]
    fn test_stuck_window_reports_infeasible() {
        let mut b = ProblemBuilder::new();
        let m = b.add_machine(Machine::new(1, "A"));
        let j = b.add_job(1, 100.0, PriorityClass::Low);
        b.add_task(j, TaskSpec::new(40, 2.0).on([m]));
        b.add_task(j, TaskSpec::new(41, 3.0).on([m]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p);
        d.state.unscheduled[0] = false;
        d.state.remaining = 1;
        d.state.t = 7.5;
        // every machine pruned and nothing running: no window can open
        d.state.idle = vec![None; p.machine_count()];
        d.refresh_window();
        d.refresh_sets();

        let err = d.expand_window().unwrap_err();
        let ScheduleError::Infeasible {
            horizon,
            remaining,
            first_task_id,
        } = err
        else {
            panic!("expected Infeasible");
        };
        assert_close(horizon, 7.5);
        assert_eq!(remaining, 1);
        assert_eq!(first_task_id, 41);
        assert!(!d.is_solved());
    }

    #[test]
    fn test_tie_break_lowest_task_id() {
        let mut b = ProblemBuilder::new();
        let m = b.add_machine(Machine::new(1, "A"));
        let j1 = b.add_job(1, 100.0, PriorityClass::Low);
        let j2 = b.add_job(2, 100.0, PriorityClass::Low);
        b.add_task(j1, TaskSpec::new(9, 2.0).on([m]));
        b.add_task(j2, TaskSpec::new(3, 2.0).on([m]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p);
        let s = d.run().unwrap();
        assert_eq!(s.commit_order(), &[1, 0]);
    }

    #[test]
    fn test_tie_break_lowest_machine_id() {
        let mut b = ProblemBuilder::new();
        let m_hi = b.add_machine(Machine::new(8, "A"));
        let m_lo = b.add_machine(Machine::new(2, "A"));
        let j = b.add_job(1, 100.0, PriorityClass::Low);
        b.add_task(j, TaskSpec::new(1, 2.0).on([m_hi, m_lo]));
        let p = b.build().unwrap();

        let mut d = Dispatcher::new(&p);
        let s = d.run().unwrap();
        assert_eq!(s.get(0).unwrap().machine, m_lo);
    }

    #[test]
    fn test_zero_deviation_when_on_plan() {
        for mode in [DeviationMode::Signed, DeviationMode::Symmetric] {
            for pow in [1.0, 2.0, 3.0] {
                let mut b = ProblemBuilder::new();
                let m = b.add_machine(Machine::new(1, "A"));
                let j = b.add_job(1, 100.0, PriorityClass::Low);
                b.add_task(j, TaskSpec::new(1, 3.0).on([m]).with_earlier_plan(0.0));
                let p = b.build().unwrap();

                let params = HeuristicParams::default()
                    .with_deviation_mode(mode)
                    .with_deviation_pow(pow);
                let mut d = Dispatcher::new(&p).with_params(params).unwrap();
                d.run().unwrap();
                assert_close(d.stats().unwrap().deviation_from_earlier_plan, 0.0);
            }
        }
    }

    #[test]
    fn test_window_expansion_reaches_late_machine() {
        // Task 2 waits for task 1 on another machine; its machine stays idle
        // at 0 while the horizon must move to 10 before it is dispatchable.
        let mut b = ProblemBuilder::new();
        let m1 = b.add_machine(Machine::new(1, "A"));
        let m2 = b.add_machine(Machine::new(2, "B"));
        let j = b.add_job(1, 1000.0, PriorityClass::Low);
        b.add_task(j, TaskSpec::new(1, 10.0).on([m1]));
        b.add_task(j, TaskSpec::new(2, 1.0).on([m2]));
        b.add_task(j, TaskSpec::new(3, 10.0).on([m1]));
        let p = b.build().unwrap();

        let params = HeuristicParams::default().with_slack(0.0);
        let mut d = Dispatcher::new(&p).with_params(params).unwrap();
        let s = d.run().unwrap();
        assert_close(s.get(1).unwrap().start, 10.0);
        assert_close(s.get(2).unwrap().start, 11.0);
    }

    #[test]
    fn test_empty_problem() {
        let p = ProblemBuilder::new().build().unwrap();
        let mut d = Dispatcher::new(&p);
        assert!(d.run().unwrap().is_empty());
        assert_close(d.objective().unwrap(), 0.0);
    }

    #[test]
    fn test_results_require_run() {
        let p = ProblemBuilder::new().build().unwrap();
        let d = Dispatcher::new(&p);
        assert!(matches!(d.schedule(), Err(ScheduleError::NotSolved)));
        assert!(matches!(d.objective(), Err(ScheduleError::NotSolved)));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let p = ProblemBuilder::new().build().unwrap();
        let mut d = Dispatcher::new(&p);
        assert!(d
            .set_params(HeuristicParams::default().with_deviation_pow(0.0))
            .is_err());
        assert_eq!(d.params(), &HeuristicParams::default());
    }

    #[test]
    fn test_export_after_run() {
        use crate::scenario::{load, JobRecord, MachineRecord, TaskRecord};

        let mut doc = ScenarioDocument::new();
        doc.machines.push(MachineRecord::new(4, "A", 1.5));
        let mut job = JobRecord::new(1, 50.0, "HIGH");
        job.tasks.push(TaskRecord::new(1, 2.0, vec![4]));
        doc.jobs.push(job);
        let p = load(&doc).unwrap();

        let mut d = Dispatcher::new(&p);
        assert!(d.export_solutions(&mut doc).is_err());
        d.run().unwrap();
        assert_eq!(d.export_solutions(&mut doc).unwrap(), 1);
        assert_eq!(doc.jobs[0].tasks[0].scheduled_machine, Some(4));
        assert_eq!(doc.jobs[0].tasks[0].scheduled_end_time, Some(3.0));
    }

    fn arb_problem() -> impl Strategy<Value = Problem> {
        let machines = 1usize..4;
        let jobs = prop::collection::vec(
            (
                0.0f64..80.0,
                0usize..3,
                prop::collection::vec(
                    (
                        0.5f64..10.0,
                        prop::collection::vec(any::<bool>(), 3),
                        prop::option::of(0.0f64..40.0),
                    ),
                    1..4,
                ),
            ),
            1..6,
        );
        (machines, jobs).prop_map(|(n_machines, jobs)| {
            let mut b = ProblemBuilder::new();
            let ms: Vec<_> = (0..n_machines)
                .map(|i| {
                    b.add_machine(
                        Machine::new(i as i64 + 1, "A")
                            .with_processing_time_constant(0.8 + 0.2 * i as f64),
                    )
                })
                .collect();
            let mut next_id = 1;
            for (j, (deadline, prio, tasks)) in jobs.into_iter().enumerate() {
                let priority = [PriorityClass::Low, PriorityClass::Medium, PriorityClass::High][prio];
                let job = b.add_job(j as i64 + 1, deadline, priority);
                for (pt, mask, plan) in tasks {
                    let mut eligible: Vec<_> = ms
                        .iter()
                        .zip(&mask)
                        .filter(|&(_, &on)| on)
                        .map(|(&m, _)| m)
                        .collect();
                    if eligible.is_empty() {
                        eligible.push(ms[next_id as usize % ms.len()]);
                    }
                    let mut spec = TaskSpec::new(next_id, pt).on(eligible);
                    if let Some(start) = plan {
                        spec = spec.with_earlier_plan(start);
                    }
                    b.add_task(job, spec);
                    next_id += 1;
                }
            }
            b.build().expect("generated problem is valid")
        })
    }

    proptest! {
        #[test]
        fn prop_schedule_is_feasible_and_complete(p in arb_problem(), slack in 0.0f64..6.0) {
            let params = HeuristicParams::default().with_slack(slack);
            let mut d = Dispatcher::new(&p).with_params(params).unwrap();
            let s = d.run().unwrap();
            prop_assert!(s.is_complete(p.task_count()));
            let hard: Vec<_> = verify_schedule(&p, s).into_iter().filter(|v| v.is_hard()).collect();
            prop_assert!(hard.is_empty(), "{:?}", hard);
        }

        #[test]
        fn prop_run_is_deterministic(p in arb_problem()) {
            let mut a = Dispatcher::new(&p);
            let mut b = Dispatcher::new(&p);
            let first: Vec<_> = a.run().unwrap().iter().copied().collect();
            let second: Vec<_> = b.run().unwrap().iter().copied().collect();
            prop_assert_eq!(&first, &second);

            a.reset();
            let again: Vec<_> = a.run().unwrap().iter().copied().collect();
            prop_assert_eq!(&first, &again);
        }

        #[test]
        fn prop_objective_matches_manual(p in arb_problem()) {
            let mut d = Dispatcher::new(&p);
            d.run().unwrap();
            let s = d.schedule().unwrap();
            let w = p.objective_weights();

            let mut completion = 0.0;
            let mut tardiness = 0.0;
            for job in p.jobs() {
                let last = job.last_task().unwrap();
                let sol = s.get(last).unwrap();
                let weight = p.task(last).priority_weight;
                let late = (sol.end - job.deadline).max(0.0);
                completion += sol.end * weight;
                tardiness += late * late * weight;
            }
            let mut deviation = 0.0;
            for (i, task) in p.tasks().iter().enumerate() {
                if let Some(plan) = task.earlier_plan_start {
                    let d = s.get(i).unwrap().start - plan;
                    deviation += d * d;
                }
            }
            let manual = w.alpha_completion_time * completion
                + w.alpha_tardiness * tardiness
                + w.alpha_robust * deviation;
            let reported = d.objective().unwrap();
            prop_assert!((manual - reported).abs() <= 1e-6 * manual.abs().max(1.0));
            prop_assert!((objective_value(&p, s) - reported).abs() <= 1e-9 * reported.abs().max(1.0));
        }
    }
}
