//! Writes a computed schedule back into a scenario document.

use std::collections::HashMap;

use super::document::ScenarioDocument;
use crate::models::{Problem, Schedule};

/// Annotates `doc` with the solutions in `schedule`.
///
/// Each task with a solution gets its start, end, machine id, and score;
/// each job known to `problem` gets its current deadline and priority.
/// Records for ids the problem does not know are left untouched, as are
/// tasks without a solution. Returns the number of tasks annotated.
pub fn export_schedule(problem: &Problem, schedule: &Schedule, doc: &mut ScenarioDocument) -> usize {
    let mut by_id = HashMap::with_capacity(schedule.len());
    for solution in schedule.iter() {
        by_id.insert(problem.task(solution.task).id, solution);
    }

    let mut annotated = 0;
    for job_record in &mut doc.jobs {
        if let Some(j) = problem.job_index(job_record.id) {
            let job = problem.job(j);
            job_record.deadline = job.deadline;
            job_record.priority = job.priority.as_str().to_string();
        }
        for task_record in &mut job_record.tasks {
            let Some(solution) = by_id.get(&task_record.id) else {
                continue;
            };
            task_record.scheduled_start_time = solution.start;
            task_record.scheduled_end_time = Some(solution.end);
            task_record.scheduled_machine = Some(problem.machine(solution.machine).id);
            task_record.score = Some(solution.score);
            annotated += 1;
        }
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriorityClass, Solution};
    use crate::scenario::{load, JobRecord, MachineRecord, TaskRecord};

    #[test]
    fn test_export_annotates_tasks_and_jobs() {
        let mut doc = ScenarioDocument::new();
        doc.machines.push(MachineRecord::new(5, "CUT", 1.0));
        let mut job = JobRecord::new(1, 20.0, "LOW");
        job.tasks.push(TaskRecord::new(100, 3.0, vec![5]));
        doc.jobs.push(job);

        let mut problem = load(&doc).unwrap();
        problem.set_job_deadline(0, 12.0).unwrap();
        problem.set_job_priority(0, PriorityClass::High).unwrap();

        let mut schedule = Schedule::with_task_count(1);
        schedule.insert(Solution::new(0, 0, 1.0, 4.0, -7.5)).unwrap();

        assert_eq!(export_schedule(&problem, &schedule, &mut doc), 1);
        let task = &doc.jobs[0].tasks[0];
        assert!((task.scheduled_start_time - 1.0).abs() < 1e-10);
        assert_eq!(task.scheduled_end_time, Some(4.0));
        assert_eq!(task.scheduled_machine, Some(5));
        assert_eq!(task.score, Some(-7.5));
        assert_eq!(doc.jobs[0].priority, "HIGH");
        assert!((doc.jobs[0].deadline - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_export_skips_unsolved() {
        let mut doc = ScenarioDocument::new();
        doc.machines.push(MachineRecord::new(1, "CUT", 1.0));
        let mut job = JobRecord::new(1, 20.0, "LOW");
        job.tasks.push(TaskRecord::new(1, 3.0, vec![1]));
        doc.jobs.push(job);
        let problem = load(&doc).unwrap();

        let schedule = Schedule::with_task_count(1);
        assert_eq!(export_schedule(&problem, &schedule, &mut doc), 0);
        assert!(doc.jobs[0].tasks[0].earlier_plan_start().is_none());
    }
}
