//! Builds a [`Problem`] from a [`ScenarioDocument`].

use std::collections::HashMap;
use tracing::debug;

use super::document::{ScenarioDocument, NO_ID};
use crate::error::{Result, ScheduleError};
use crate::models::{
    Machine, ObjectiveWeights, PriorityClass, PriorityWeights, Problem, ProblemBuilder, TaskSpec,
};
use crate::validation::{chain_order, validate_scenario, ValidationError, ValidationErrorKind};

/// Loads a problem with the default priority table and objective weights.
pub fn load(doc: &ScenarioDocument) -> Result<Problem> {
    load_with(doc, PriorityWeights::default(), ObjectiveWeights::default())
}

/// Loads a problem with explicit instance-level weight tables.
///
/// The document is validated first; every issue is returned at once as
/// [`ScheduleError::InvalidScenario`]. Tasks are added in chain order, so a
/// job's tasks may appear in any order in the file as long as their links
/// form a single path.
pub fn load_with(
    doc: &ScenarioDocument,
    priority_weights: PriorityWeights,
    objective_weights: ObjectiveWeights,
) -> Result<Problem> {
    validate_scenario(doc).map_err(ScheduleError::InvalidScenario)?;

    let mut builder = ProblemBuilder::new()
        .with_priority_weights(priority_weights)
        .with_objective_weights(objective_weights);

    let mut machine_index = HashMap::new();
    for record in &doc.machines {
        let mut machine = Machine::new(record.id, record.task_type_undertakes.clone())
            .with_processing_time_constant(record.processing_time_constant);
        if let Some(name) = &record.machine_name {
            machine = machine.with_name(name.clone());
        }
        machine_index.insert(record.id, builder.add_machine(machine));
    }

    for record in &doc.jobs {
        let priority: PriorityClass = record.priority.parse().map_err(|msg: String| {
            ScheduleError::InvalidScenario(vec![ValidationError::new(
                ValidationErrorKind::UnknownPriority,
                msg,
            )])
        })?;
        let job = builder.add_job(record.id, record.deadline, priority);

        let head = record
            .tasks
            .iter()
            .find(|t| t.preceding_task == NO_ID)
            .map(|t| t.id)
            .unwrap_or(NO_ID);
        let order = chain_order(record, head).ok_or_else(|| {
            ScheduleError::InvalidScenario(vec![ValidationError::new(
                ValidationErrorKind::BrokenChain,
                format!("Job {} chain is not a single path", record.id),
            )])
        })?;

        for pos in order {
            let task = &record.tasks[pos];
            let machines: Vec<_> = task
                .machines_can_undertake
                .iter()
                .filter_map(|id| machine_index.get(id).copied())
                .collect();
            let task_type = match &task.task_type {
                Some(t) => t.clone(),
                None => machines
                    .first()
                    .map(|&m| doc.machines[m].task_type_undertakes.clone())
                    .unwrap_or_default(),
            };
            let mut spec = TaskSpec::new(task.id, task.processing_time)
                .of_type(task_type)
                .on(machines);
            if let Some(start) = task.earlier_plan_start() {
                spec = spec.with_earlier_plan(start);
            }
            builder.add_task(job, spec);
        }
    }

    let problem = builder.build()?;
    debug!(
        machines = problem.machine_count(),
        jobs = problem.job_count(),
        tasks = problem.task_count(),
        "scenario loaded"
    );
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{JobRecord, MachineRecord, TaskRecord};

    fn doc_with_reversed_tasks() -> ScenarioDocument {
        let mut doc = ScenarioDocument::new();
        doc.machines.push(MachineRecord::new(7, "CUT", 1.0));
        doc.machines.push(MachineRecord::new(3, "WELD", 2.0));

        let mut job = JobRecord::new(1, 100.0, "MEDIUM");
        let mut second = TaskRecord::new(11, 4.0, vec![3]);
        second.preceding_task = 10;
        second.scheduled_start_time = 6.0;
        let mut first = TaskRecord::new(10, 6.0, vec![7, 3]);
        first.succeeding_task = 11;
        job.tasks.push(second);
        job.tasks.push(first);
        doc.jobs.push(job);
        doc
    }

    #[test]
    fn test_load_orders_by_chain() {
        let p = load(&doc_with_reversed_tasks()).unwrap();
        assert_eq!(p.task(0).id, 10);
        assert_eq!(p.task(1).id, 11);
        assert_eq!(p.task(1).predecessor, Some(0));
        assert_eq!(p.task(1).earlier_plan_start, Some(6.0));
        assert_eq!(p.task(0).earlier_plan_start, None);
    }

    #[test]
    fn test_load_resolves_machines() {
        let p = load(&doc_with_reversed_tasks()).unwrap();
        assert_eq!(p.machine_index(3), Some(1));
        assert_eq!(p.task(0).eligible, vec![0, 1]);
        assert_eq!(p.task(0).processing_time_on(1), Some(12.0));
        assert_eq!(p.task(0).task_type, "CUT");
        assert!((p.task(0).priority_weight - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_load_uses_custom_weights() {
        let p = load_with(
            &doc_with_reversed_tasks(),
            PriorityWeights::new(9.0, 5.0, 1.0),
            ObjectiveWeights::new(2.0, 3.0, 4.0),
        )
        .unwrap();
        assert!((p.task(0).priority_weight - 5.0).abs() < 1e-10);
        assert!((p.objective_weights().alpha_robust - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut doc = doc_with_reversed_tasks();
        doc.jobs[0].tasks[0].machines_can_undertake = vec![42];
        assert!(matches!(
            load(&doc),
            Err(ScheduleError::InvalidScenario(_))
        ));
    }
}
