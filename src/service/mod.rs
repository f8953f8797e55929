//! The validating facade between transport adapters and the queue core.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::ServiceError;
use crate::core::queue::TaskQueue;
use crate::core::registry::QueueRegistry;
use crate::core::result::{ResultStatus, TaskResult};
use crate::core::task::{Task, TaskStatus};

/// Aggregate view of one queue, polled by consumers to detect drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub id: Uuid,
    pub name: String,
    pub pending_task_count: usize,
    pub completed_result_count: usize,
    pub has_pending_tasks: bool,
}

/// [`QueueService`] validates inputs, resolves queue ids, and translates
/// absence into the [`ServiceError`] taxonomy for the transport layer.
///
/// It holds the registry by `Arc`; construct one per process (or per test)
/// and share it across request handlers.
#[derive(Debug, Clone)]
pub struct QueueService {
    registry: Arc<QueueRegistry>,
}

impl QueueService {
    pub fn new(registry: Arc<QueueRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    /// Creates a queue from a trimmed name. Whitespace-only and empty names
    /// are invalid.
    pub fn create_queue(&self, name: &str) -> Result<Arc<TaskQueue>, ServiceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::invalid_argument(
                "Queue name cannot be empty",
            ));
        }
        let queue = self.registry.create(trimmed);
        info!(queue_id = %queue.id(), name = %queue.name(), "create_queue");
        Ok(queue)
    }

    /// Builds a fresh pending task and inserts it into the queue.
    pub fn enqueue_task(
        &self,
        queue_id: Uuid,
        params: String,
        priority: i32,
    ) -> Result<Arc<Task>, ServiceError> {
        let queue = self.resolve(queue_id)?;
        let task = Arc::new(Task::new(params, priority));
        queue.enqueue(Arc::clone(&task));
        info!(queue_id = %queue_id, task_id = %task.id(), priority, "enqueue_task");
        Ok(task)
    }

    /// Removes the most urgent pending task and marks it in-progress.
    ///
    /// `Ok(None)` when the queue exists but is empty; the HTTP layer renders
    /// that as 204. The status flip happens here rather than in the queue so
    /// the collection itself stays free of lifecycle policy.
    pub fn dequeue_task(&self, queue_id: Uuid) -> Result<Option<Arc<Task>>, ServiceError> {
        let queue = self.resolve(queue_id)?;
        let task = queue.dequeue();
        if let Some(task) = &task {
            task.set_status(TaskStatus::InProgress);
            info!(queue_id = %queue_id, task_id = %task.id(), "dequeue_task");
        } else {
            info!(queue_id = %queue_id, "dequeue_task queue_empty");
        }
        Ok(task)
    }

    /// Stores a worker-reported result, overwriting any earlier submission
    /// for the same task id, and returns the stored record.
    pub fn submit_result(
        &self,
        queue_id: Uuid,
        task_id: Uuid,
        output: String,
        status: ResultStatus,
    ) -> Result<TaskResult, ServiceError> {
        let queue = self.resolve(queue_id)?;
        let result = TaskResult::new(task_id, output, status);
        queue.add_result(result.clone());
        info!(queue_id = %queue_id, task_id = %task_id, status = %status, "submit_result");
        Ok(result)
    }

    /// Fetches the stored result for a task, `Ok(None)` if none exists yet.
    pub fn get_result(
        &self,
        queue_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<TaskResult>, ServiceError> {
        let queue = self.resolve(queue_id)?;
        let result = queue.get_result(task_id);
        info!(queue_id = %queue_id, task_id = %task_id, found = result.is_some(), "get_result");
        Ok(result)
    }

    pub fn queue_status(&self, queue_id: Uuid) -> Result<QueueStatus, ServiceError> {
        let queue = self.resolve(queue_id)?;
        info!(queue_id = %queue_id, "queue_status");
        Ok(QueueStatus {
            id: queue.id(),
            name: queue.name().to_string(),
            pending_task_count: queue.task_count(),
            completed_result_count: queue.result_count(),
            has_pending_tasks: queue.has_pending(),
        })
    }

    /// Drops every queue. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let removed = self.registry.clear();
        info!(queues_cleared = removed, "clear_all");
        removed
    }

    fn resolve(&self, queue_id: Uuid) -> Result<Arc<TaskQueue>, ServiceError> {
        self.registry.get(queue_id).ok_or_else(|| {
            ServiceError::not_found(format!("Queue with ID '{queue_id}' does not exist"))
        })
    }
}
