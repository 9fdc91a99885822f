//! Feasibility checks for a computed schedule.

use crate::models::{Problem, Schedule, Violation, ViolationType};

/// Tolerance for floating-point time comparisons.
const EPS: f64 = 1e-9;

/// Lists every constraint violation in `schedule`.
///
/// Hard violations are missing solutions, ineligible machines, precedence
/// breaches, and overlaps on a machine. Deadline misses are reported as
/// soft violations (see [`Violation::is_hard`]).
pub fn verify_schedule(problem: &Problem, schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, task) in problem.tasks().iter().enumerate() {
        let Some(solution) = schedule.get(index) else {
            violations.push(Violation::new(
                ViolationType::MissingSolution,
                task.id,
                format!("Task {} has no solution", task.id),
            ));
            continue;
        };

        if !task.is_eligible(solution.machine) {
            violations.push(Violation::new(
                ViolationType::IneligibleMachine,
                task.id,
                format!(
                    "Task {} assigned to machine {} outside its eligibility set",
                    task.id,
                    problem.machines().get(solution.machine).map_or(-1, |m| m.id)
                ),
            ));
        }

        if let Some(pred) = task.predecessor.and_then(|p| schedule.get(p)) {
            if solution.start + EPS < pred.end {
                violations.push(Violation::new(
                    ViolationType::PrecedenceViolation,
                    task.id,
                    format!(
                        "Task {} starts at {} before predecessor {} ends at {}",
                        task.id,
                        solution.start,
                        problem.task(pred.task).id,
                        pred.end
                    ),
                ));
            }
        }
    }

    for (m, machine) in problem.machines().iter().enumerate() {
        let on_machine = schedule.for_machine(m);
        for pair in on_machine.windows(2) {
            if pair[1].start + EPS < pair[0].end {
                violations.push(Violation::new(
                    ViolationType::MachineOverlap,
                    machine.id,
                    format!(
                        "Tasks {} and {} overlap on machine {}",
                        problem.task(pair[0].task).id,
                        problem.task(pair[1].task).id,
                        machine.id
                    ),
                ));
            }
        }
    }

    for job in problem.jobs() {
        let Some(end) = job.last_task().and_then(|t| schedule.get(t)).map(|s| s.end) else {
            continue;
        };
        if end > job.deadline + EPS {
            violations.push(Violation::new(
                ViolationType::DeadlineMiss,
                job.id,
                format!(
                    "Job {} finishes at {} after deadline {}",
                    job.id, end, job.deadline
                ),
            ));
        }
    }

    violations
}
