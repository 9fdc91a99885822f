//! Input validation for scenario documents.
//!
//! Checks structural integrity of machines, jobs, and task chains before a
//! [`Problem`](crate::models::Problem) is built. Detects:
//! - Duplicate IDs
//! - Unknown machine references and empty eligibility lists
//! - Broken predecessor/successor links
//! - Chains that are cyclic or not a single linear path
//! - Unknown priority classes and invalid numeric values
//!
//! Every problem found is reported; validation does not stop at the first.

use crate::models::PriorityClass;
use crate::scenario::{JobRecord, ScenarioDocument, NO_ID};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A reference points to a machine or task that doesn't exist.
    InvalidReference,
    /// A task lists no machines.
    EmptyEligibility,
    /// A job has no tasks.
    EmptyJob,
    /// Predecessor/successor links disagree or cross jobs.
    BrokenChain,
    /// A job's chain loops back on itself.
    CyclicDependency,
    /// Priority string is not LOW, MEDIUM, or HIGH.
    UnknownPriority,
    /// Negative or non-finite numeric field.
    InvalidValue,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scenario document.
///
/// Checks:
/// 1. No duplicate machine, job, or task IDs
/// 2. Machine processing-time constants are positive and finite
/// 3. Job deadlines are finite and priorities are recognized
/// 4. Every job has at least one task
/// 5. Every task has a finite non-negative processing time and at least
///    one eligible machine, all of which exist
/// 6. Predecessor/successor ids exist, stay inside the job, and agree
/// 7. Each job's tasks form exactly one linear chain
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_scenario(doc: &ScenarioDocument) -> ValidationResult {
    let mut errors = Vec::new();

    let mut machine_ids = HashSet::new();
    for m in &doc.machines {
        if !machine_ids.insert(m.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate machine ID: {}", m.id),
            ));
        }
        if !m.processing_time_constant.is_finite() || m.processing_time_constant <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!(
                    "Machine {} has invalid processing time constant {}",
                    m.id, m.processing_time_constant
                ),
            ));
        }
    }

    let mut job_ids = HashSet::new();
    // task id -> owning job id
    let mut owner: HashMap<i64, i64> = HashMap::new();
    for job in &doc.jobs {
        if !job_ids.insert(job.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
        if !job.deadline.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Job {} has a non-finite deadline", job.id),
            ));
        }
        if job.priority.parse::<PriorityClass>().is_err() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownPriority,
                format!("Job {} has unknown priority '{}'", job.id, job.priority),
            ));
        }
        if job.tasks.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyJob,
                format!("Job {} has no tasks", job.id),
            ));
        }

        for task in &job.tasks {
            if owner.insert(task.id, job.id).is_some() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task ID: {}", task.id),
                ));
            }
            if !task.processing_time.is_finite() || task.processing_time < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!(
                        "Task {} has invalid processing time {}",
                        task.id, task.processing_time
                    ),
                ));
            }
            if task.machines_can_undertake.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::EmptyEligibility,
                    format!("Task {} has no eligible machines", task.id),
                ));
            }
            for m in &task.machines_can_undertake {
                if !machine_ids.contains(m) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidReference,
                        format!("Task {} references unknown machine {}", task.id, m),
                    ));
                }
            }
        }
    }

    for job in &doc.jobs {
        check_links(job, &owner, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks one job's predecessor/successor links, then walks its chain.
fn check_links(job: &JobRecord, owner: &HashMap<i64, i64>, errors: &mut Vec<ValidationError>) {
    let by_id: HashMap<i64, usize> = job
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, i))
        .collect();
    let mut links_ok = true;

    for task in &job.tasks {
        for (label, linked) in [
            ("predecessor", task.preceding_task),
            ("successor", task.succeeding_task),
        ] {
            if linked == NO_ID {
                continue;
            }
            match owner.get(&linked) {
                None => {
                    links_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidReference,
                        format!("Task {} references unknown {} {}", task.id, label, linked),
                    ));
                }
                Some(&other_job) if other_job != job.id => {
                    links_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::BrokenChain,
                        format!(
                            "Task {} has {} {} in job {}, expected job {}",
                            task.id, label, linked, other_job, job.id
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        if task.succeeding_task != NO_ID {
            if let Some(&next) = by_id.get(&task.succeeding_task) {
                if job.tasks[next].preceding_task != task.id {
                    links_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::BrokenChain,
                        format!(
                            "Task {} names successor {} which does not name it back",
                            task.id, task.succeeding_task
                        ),
                    ));
                }
            }
        }
        if task.preceding_task != NO_ID {
            if let Some(&prev) = by_id.get(&task.preceding_task) {
                if job.tasks[prev].succeeding_task != task.id {
                    links_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::BrokenChain,
                        format!(
                            "Task {} names predecessor {} which does not name it back",
                            task.id, task.preceding_task
                        ),
                    ));
                }
            }
        }
    }

    if !links_ok || job.tasks.is_empty() {
        return;
    }

    let heads: Vec<i64> = job
        .tasks
        .iter()
        .filter(|t| t.preceding_task == NO_ID)
        .map(|t| t.id)
        .collect();
    match heads.as_slice() {
        [] => errors.push(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            format!("Job {} has no first task (its chain is cyclic)", job.id),
        )),
        [head] => {
            if chain_order(job, *head).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::CyclicDependency,
                    format!(
                        "Job {} chain starting at task {} does not reach every task",
                        job.id, head
                    ),
                ));
            }
        }
        _ => errors.push(ValidationError::new(
            ValidationErrorKind::BrokenChain,
            format!(
                "Job {} has {} tasks without a predecessor: {:?}",
                job.id,
                heads.len(),
                heads
            ),
        )),
    }
}

/// Positions of a job's tasks in chain order, starting from `head`.
///
/// Returns `None` if the walk revisits a task, leaves the job, or does not
/// cover every task.
pub(crate) fn chain_order(job: &JobRecord, head: i64) -> Option<Vec<usize>> {
    let by_id: HashMap<i64, usize> = job
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, i))
        .collect();
    let mut order = Vec::with_capacity(job.tasks.len());
    let mut seen = vec![false; job.tasks.len()];
    let mut current = head;
    while current != NO_ID {
        let &pos = by_id.get(&current)?;
        if seen[pos] {
            return None;
        }
        seen[pos] = true;
        order.push(pos);
        current = job.tasks[pos].succeeding_task;
    }
    (order.len() == job.tasks.len()).then_some(order)
}
