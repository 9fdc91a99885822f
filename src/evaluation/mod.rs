//! Schedule evaluation.
//!
//! [`ScheduleStats`] computes the weighted objective and supporting KPIs of
//! a schedule; [`verify_schedule`] checks it against the hard constraints.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

mod stats;
mod verify;

pub use stats::{objective_value, ScheduleStats};
pub use verify::verify_schedule;
