//! Deadline- and plan-stability-aware dispatching for flexible job shops.
//!
//! Jobs are linear chains of tasks; each task runs on one of several
//! eligible machines whose speed constant scales its processing time. The
//! [`dispatching::Dispatcher`] builds a complete non-preemptive schedule by
//! repeatedly committing the best-scoring `(task, machine)` pair inside a
//! sliding time window, trading off deadline urgency, completion time, and
//! deviation from an earlier plan.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Machine`, `Task`, `Job`, `Problem`,
//!   `Schedule`, `Solution`, weight tables
//! - **`scenario`**: JSON scenario documents, loading, export, random
//!   generation, and time-shifting for replanning
//! - **`validation`**: Scenario integrity checks (duplicate IDs, broken
//!   chains, unknown machines)
//! - **`dispatching`**: Heuristic parameters, scoring functions, and the
//!   windowed dispatch engine
//! - **`evaluation`**: Objective, KPIs, and schedule verification
//! - **`tuning`**: GA and PSO searches over the dispatcher's parameters
//!
//! # Example
//!
//! ```
//! use u_dispatch::dispatching::Dispatcher;
//! use u_dispatch::scenario::{load, GeneratorConfig, ScenarioGenerator};
//!
//! let doc = ScenarioGenerator::new(GeneratorConfig::default().with_job_count(6))
//!     .unwrap()
//!     .generate()
//!     .unwrap();
//! let problem = load(&doc).unwrap();
//!
//! let mut dispatcher = Dispatcher::new(&problem);
//! let schedule = dispatcher.run().unwrap();
//! assert!(schedule.is_complete(problem.task_count()));
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod dispatching;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod scenario;
pub mod tuning;
pub mod validation;

pub use error::{Result, ScheduleError};
