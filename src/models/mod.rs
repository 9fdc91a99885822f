//! Scheduling domain models.
//!
//! Machines, tasks, and jobs are held in flat vectors inside a [`Problem`];
//! cross-references (task → job, task → machines, predecessor/successor)
//! are plain indices into those vectors.
//!
//! | Type | Role |
//! |------|------|
//! | [`Machine`] | Resource servicing one task type, with a speed constant |
//! | [`Task`] | One operation of a job, eligible on a subset of machines |
//! | [`Job`] | Linear chain of tasks with a deadline and priority class |
//! | [`Problem`] | Arena owning all of the above plus weight tables |
//! | [`Schedule`] | Per-task [`Solution`]s produced by a dispatch run |

mod job;
mod machine;
mod problem;
mod schedule;
mod task;

pub use job::{Job, PriorityClass, PriorityWeights};
pub use machine::Machine;
pub use problem::{ObjectiveWeights, Problem, ProblemBuilder, TaskSpec};
pub use schedule::{Schedule, Solution, Violation, ViolationType};
pub use task::Task;

/// Index of a machine in [`Problem::machines`].
pub type MachineIndex = usize;
/// Index of a task in [`Problem::tasks`].
pub type TaskIndex = usize;
/// Index of a job in [`Problem::jobs`].
pub type JobIndex = usize;
