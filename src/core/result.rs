//! Completion record for a task, keyed by the task's identifier.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of a task execution as reported by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Success,
    Failure,
}

impl ResultStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ResultStatus::Success => "SUCCESS",
            ResultStatus::Failure => "FAILURE",
        }
    }

    /// Parses a status name as written by [`ResultStatus::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUCCESS" => Some(ResultStatus::Success),
            "FAILURE" => Some(ResultStatus::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The stored outcome of one task, immutable after construction.
///
/// The timestamp is taken from the service's local clock at construction and
/// rendered as an ISO-8601 local date-time without a zone offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    task_id: Uuid,
    output: String,
    status: ResultStatus,
    timestamp: NaiveDateTime,
}

impl TaskResult {
    /// Creates a result for `task_id`, stamped with the current local time.
    pub fn new(task_id: Uuid, output: impl Into<String>, status: ResultStatus) -> Self {
        Self {
            task_id,
            output: output.into(),
            status,
            timestamp: Local::now().naive_local(),
        }
    }

    /// Rebuilds a result from persisted state with its original timestamp.
    pub fn restore(
        task_id: Uuid,
        output: impl Into<String>,
        status: ResultStatus,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            task_id,
            output: output.into(),
            status,
            timestamp,
        }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}
