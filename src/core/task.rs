//! Task entity: a unit of work carried by a queue.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Lifecycle states a task moves through.
///
/// `Pending` on creation, `InProgress` once handed to a worker. The terminal
/// states are informational: workers own execution, so the service records
/// whatever status a restored snapshot carries but never forces a transition
/// to `Completed` or `Failed` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Wire/snapshot name of the status.
    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// Parses a status name as written by [`TaskStatus::name`].
    ///
    /// Returns `None` for anything else; snapshot load uses this to skip
    /// records it cannot interpret.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A prioritized unit of work.
///
/// Identity, params and priority are fixed at construction; only the status
/// mutates, under its own mutex, so concurrent observers of a shared task
/// always read a complete value. Tasks are shared as `Arc<Task>` between the
/// pending collection and whoever dequeued them.
///
/// Equality and hashing are by identifier only. Priority ordering is
/// deliberately *not* implemented here; the pending collection carries its
/// own comparator (see `queue::PendingTask`), so a task can be located by
/// identity while the heap orders by urgency.
#[derive(Debug)]
pub struct Task {
    id: Uuid,
    params: String,
    priority: i32,
    status: Mutex<TaskStatus>,
}

impl Task {
    /// Creates a fresh task with a new identifier and `Pending` status.
    ///
    /// `params` is opaque to the service; workers parse it however their
    /// task type requires.
    pub fn new(params: impl Into<String>, priority: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            params: params.into(),
            priority,
            status: Mutex::new(TaskStatus::Pending),
        }
    }

    /// Rebuilds a task from persisted state, keeping its original identifier
    /// and status. Used by snapshot load; result correlation after a restart
    /// depends on the identifier surviving the round trip.
    pub fn restore(id: Uuid, params: impl Into<String>, priority: i32, status: TaskStatus) -> Self {
        Self {
            id,
            params: params.into(),
            priority,
            status: Mutex::new(status),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> &str {
        &self.params
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        *self.status.lock()
    }

    /// Atomic with respect to concurrent `status()` readers.
    pub fn set_status(&self, status: TaskStatus) {
        *self.status.lock() = status;
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
