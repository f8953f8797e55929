//! Process-wide directory of queues.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::queue::TaskQueue;

/// [`QueueRegistry`] is the thread-safe directory mapping queue ids to live
/// queues.
///
/// There is one registry per process, constructed by the runtime and handed
/// to the facade and the snapshot engine as an `Arc` rather than reached for
/// through a global, so tests get a fresh registry each. Each queue is
/// reference-counted; removal drops the directory's reference while callers
/// already holding the queue keep a working handle.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: DashMap<Uuid, Arc<TaskQueue>>,
}

impl QueueRegistry {
    /// Creates a new empty [`QueueRegistry`].
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }

    /// Creates and registers a new queue with the given name.
    ///
    /// The name is stored trimmed but never rejected for content; name
    /// validation belongs to the facade.
    pub fn create(&self, name: &str) -> Arc<TaskQueue> {
        let queue = Arc::new(TaskQueue::new(name.trim()));
        self.queues.insert(queue.id(), Arc::clone(&queue));
        queue
    }

    /// Installs an already-built queue under its own identifier.
    /// Snapshot load uses this to reinstate persisted queues.
    pub fn install(&self, queue: Arc<TaskQueue>) {
        self.queues.insert(queue.id(), queue);
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<TaskQueue>> {
        self.queues.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes a queue by id. Returns `true` if a queue was removed.
    pub fn remove(&self, id: Uuid) -> bool {
        self.queues.remove(&id).is_some()
    }

    /// Empties the directory and returns how many queues were dropped.
    pub fn clear(&self) -> usize {
        let removed = self.queues.len();
        self.queues.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Point-in-time list of all registered queues, for enumeration by the
    /// snapshot engine and admin surfaces.
    pub fn all(&self) -> Vec<Arc<TaskQueue>> {
        self.queues
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
