//! A named task queue: a priority-ordered pending collection plus the
//! results submitted for tasks that were handed out from it.

use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::result::TaskResult;
use crate::core::task::Task;

/// Heap entry wrapping a shared task.
///
/// Carries the priority comparator so `Task` itself can keep identity-based
/// equality: entries with equal priorities compare `Equal` here even when the
/// tasks are distinct, and the heap is free to break such ties in any
/// deterministic order. Wrapped in `Reverse` below so the max-heap pops the
/// numerically smallest (most urgent) priority first.
#[derive(Debug)]
struct PendingTask(Arc<Task>);

impl PartialEq for PendingTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority() == other.0.priority()
    }
}

impl Eq for PendingTask {}

impl PartialOrd for PendingTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.priority().cmp(&other.0.priority())
    }
}

/// An in-memory task queue with priority-ordered dispatch.
///
/// The pending collection is a mutex-guarded binary min-heap: push and
/// pop-min are O(log N) and atomic, so two concurrent `dequeue` calls can
/// never obtain the same task. The results map has its own mutex, held for
/// the duration of every result operation, which also makes snapshot reads
/// of the map linearizable with submissions.
///
/// The heap may hold several entries for the same task identifier; nothing
/// deduplicates by equality. Fresh identifiers make this unreachable in
/// normal operation, but restore paths must not assume uniqueness.
#[derive(Debug)]
pub struct TaskQueue {
    id: Uuid,
    name: String,
    pending: Mutex<BinaryHeap<Reverse<PendingTask>>>,
    results: Mutex<HashMap<Uuid, TaskResult>>,
}

impl TaskQueue {
    /// Creates an empty queue with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::restore(Uuid::new_v4(), name)
    }

    /// Creates an empty queue under a caller-supplied identifier.
    /// Used by snapshot load to reinstall a persisted queue.
    pub fn restore(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pending: Mutex::new(BinaryHeap::new()),
            results: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a task into the pending collection.
    ///
    /// The task's status is left untouched; flipping it to in-progress on
    /// dispatch is the facade's job, not the collection's.
    pub fn enqueue(&self, task: Arc<Task>) {
        self.pending.lock().push(Reverse(PendingTask(task)));
    }

    /// Removes and returns the most urgent pending task, or `None` when the
    /// queue is empty. Never blocks waiting for work; workers poll.
    pub fn dequeue(&self) -> Option<Arc<Task>> {
        self.pending.lock().pop().map(|Reverse(entry)| entry.0)
    }

    /// Stores a result keyed by its task id, overwriting any earlier
    /// submission for the same task.
    ///
    /// A result may arrive for a task this queue no longer holds (it was
    /// dequeued by some worker); that is the normal flow, not an error.
    pub fn add_result(&self, result: TaskResult) {
        self.results.lock().insert(result.task_id(), result);
    }

    pub fn get_result(&self, task_id: Uuid) -> Option<TaskResult> {
        self.results.lock().get(&task_id).cloned()
    }

    pub fn task_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn result_count(&self) -> usize {
        self.results.lock().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Point-in-time view of the pending tasks, in no particular order.
    /// Taken under the heap lock so the snapshot cannot tear.
    pub fn snapshot_tasks(&self) -> Vec<Arc<Task>> {
        self.pending
            .lock()
            .iter()
            .map(|Reverse(entry)| Arc::clone(&entry.0))
            .collect()
    }

    /// Point-in-time view of the stored results.
    pub fn snapshot_results(&self) -> Vec<TaskResult> {
        self.results.lock().values().cloned().collect()
    }
}
