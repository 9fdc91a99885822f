//! Scenario files.
//!
//! JSON documents describing machines and jobs, how they become a
//! [`Problem`](crate::models::Problem), and how results are written back.
//! Also hosts the utilities that produce new scenarios: a seeded random
//! [`generator`] and the disruption [`shift`] transform.

mod document;
mod export;
pub mod generator;
mod loader;
pub mod shift;

pub use document::{JobRecord, MachineRecord, ScenarioDocument, TaskRecord, NO_ID, NO_TIME};
pub use export::export_schedule;
pub use generator::{GeneratorConfig, ScenarioGenerator};
pub use loader::{load, load_with};
pub use shift::{shift_scenario, ShiftOptions};
