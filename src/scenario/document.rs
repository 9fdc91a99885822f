//! Scenario file format.
//!
//! Mirrors the JSON layout consumed and produced by the scheduling tools:
//! a `machines` list and a `jobs` list whose tasks reference machines and
//! each other by numeric id, with `-1` meaning "none". Fields this crate
//! does not interpret are kept in `extra` and written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Sentinel for "no predecessor/successor/machine".
pub const NO_ID: i64 = -1;
/// Sentinel for "no earlier plan".
pub const NO_TIME: f64 = -1.0;

/// A complete scenario document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    /// Machines.
    pub machines: Vec<MachineRecord>,
    /// Jobs with their tasks.
    pub jobs: Vec<JobRecord>,
    /// Unrecognized top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A machine entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    /// Machine id.
    #[serde(deserialize_with = "flex_id")]
    pub id: i64,
    /// Task type serviced.
    pub task_type_undertakes: String,
    /// Processing-time multiplier.
    pub processing_time_constant: f64,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A job entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job id.
    #[serde(deserialize_with = "flex_id")]
    pub id: i64,
    /// Deadline.
    pub deadline: f64,
    /// Priority class spelling (`LOW`, `MEDIUM`, `HIGH`).
    pub priority: String,
    /// Tasks of this job.
    pub tasks: Vec<TaskRecord>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A task entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task id.
    #[serde(deserialize_with = "flex_id")]
    pub id: i64,
    /// Task type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Nominal processing time.
    pub processing_time: f64,
    /// Eligible machine ids.
    #[serde(deserialize_with = "flex_id_list")]
    pub machines_can_undertake: Vec<i64>,
    /// Predecessor id or [`NO_ID`].
    #[serde(default = "no_id", deserialize_with = "flex_id")]
    pub preceding_task: i64,
    /// Successor id or [`NO_ID`].
    #[serde(default = "no_id", deserialize_with = "flex_id")]
    pub succeeding_task: i64,
    /// Start time: earlier plan on input, new plan on output; [`NO_TIME`] if none.
    #[serde(default = "no_time")]
    pub scheduled_start_time: f64,
    /// End time of the plan, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_end_time: Option<f64>,
    /// Machine of the plan, if any.
    #[serde(
        default,
        deserialize_with = "flex_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_machine: Option<i64>,
    /// Dispatch score of the plan, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    /// Creates a record with no links and no plan.
    pub fn new(id: i64, processing_time: f64, machines: Vec<i64>) -> Self {
        Self {
            id,
            task_type: None,
            processing_time,
            machines_can_undertake: machines,
            preceding_task: NO_ID,
            succeeding_task: NO_ID,
            scheduled_start_time: NO_TIME,
            scheduled_end_time: None,
            scheduled_machine: None,
            score: None,
            extra: Map::new(),
        }
    }

    /// Earlier-plan start, if one is recorded.
    pub fn earlier_plan_start(&self) -> Option<f64> {
        (self.scheduled_start_time >= 0.0).then_some(self.scheduled_start_time)
    }
}

impl MachineRecord {
    /// Creates a machine record.
    pub fn new(id: i64, task_type: impl Into<String>, processing_time_constant: f64) -> Self {
        Self {
            id,
            task_type_undertakes: task_type.into(),
            processing_time_constant,
            machine_name: None,
            extra: Map::new(),
        }
    }
}

impl JobRecord {
    /// Creates a job record with no tasks.
    pub fn new(id: i64, deadline: f64, priority: impl Into<String>) -> Self {
        Self {
            id,
            deadline,
            priority: priority.into(),
            tasks: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl ScenarioDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self {
            machines: Vec::new(),
            jobs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Parses a document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Total number of tasks across jobs.
    pub fn task_count(&self) -> usize {
        self.jobs.iter().map(|j| j.tasks.len()).sum()
    }
}

impl Default for ScenarioDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn no_id() -> i64 {
    NO_ID
}

fn no_time() -> f64 {
    NO_TIME
}

/// Ids appear as integers, integral floats (`3.0`), or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    fn into_id<E: serde::de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            RawId::Int(v) => Ok(v),
            RawId::Float(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
            RawId::Float(v) => Err(E::custom(format!("id {v} is not an integer"))),
            RawId::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("id '{s}' is not an integer"))),
        }
    }
}

fn flex_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    RawId::deserialize(deserializer)?.into_id()
}

fn flex_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    Option::<RawId>::deserialize(deserializer)?
        .map(RawId::into_id)
        .transpose()
}

fn flex_id_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<i64>, D::Error> {
    Vec::<RawId>::deserialize(deserializer)?
        .into_iter()
        .map(RawId::into_id)
        .collect()
}
