//! Heuristic dispatcher.
//!
//! A windowed list scheduler: at each step it scores every dispatchable
//! `(task, machine)` pair with a weighted mix of deadline urgency, earliness
//! of completion, and closeness to an earlier plan, then commits the best.
//!
//! # Usage
//!
//! ```
//! use u_dispatch::dispatching::{DeviationMode, Dispatcher, HeuristicParams};
//! # use u_dispatch::models::{Machine, PriorityClass, ProblemBuilder, TaskSpec};
//! # let mut b = ProblemBuilder::new();
//! # let m = b.add_machine(Machine::new(1, "CUT"));
//! # let j = b.add_job(1, 20.0, PriorityClass::Low);
//! # b.add_task(j, TaskSpec::new(1, 4.0).on([m]));
//! # let problem = b.build().unwrap();
//!
//! let params = HeuristicParams::default()
//!     .with_slack(3.0)
//!     .with_deviation_mode(DeviationMode::Symmetric);
//! let mut dispatcher = Dispatcher::new(&problem).with_params(params).unwrap();
//! dispatcher.run().unwrap();
//! println!("objective = {}", dispatcher.objective().unwrap());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Vepsalainen & Morton (1987), "Priority Rules for Job Shops with
//!   Weighted Tardiness Costs"

mod engine;
mod params;
pub mod scoring;

pub use engine::Dispatcher;
pub use params::{DeviationMode, HeuristicParams, PARAM_COUNT, PARAM_NAMES};
