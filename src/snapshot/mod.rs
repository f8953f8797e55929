//! Snapshot persistence for the queue registry.
//!
//! The whole registry is periodically serialized to a single JSON file so
//! queue state survives restarts. Saves go through a temp file followed by a
//! rename, so the primary file is never left half-written; loads tolerate
//! corruption per record, recovering everything that still parses.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::queue::TaskQueue;
use crate::core::registry::QueueRegistry;
use crate::core::result::{ResultStatus, TaskResult};
use crate::core::task::{Task, TaskStatus};

/// Primary snapshot file, relative to the working directory.
pub const SNAPSHOT_FILE: &str = "queue_snapshot.json";
/// Write target; renamed over the primary on every successful save.
pub const SNAPSHOT_TEMP_FILE: &str = "queue_snapshot.tmp";
/// Delay before the first periodic save and between saves thereafter.
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Current snapshot format version.
const FORMAT_VERSION: &str = "1.0";

/// Result timestamps are persisted as ISO-8601 local date-time, no offset.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    version: String,
    timestamp: u64,
    queues: Vec<QueueRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QueueRecord {
    id: String,
    name: String,
    tasks: Vec<TaskRecord>,
    results: Vec<ResultRecord>,
}

// Identifiers, status names and timestamps are kept as plain strings in the
// file format and parsed individually on load, so one bad field skips one
// record instead of failing the whole parse.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    id: String,
    params: String,
    priority: i32,
    status: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultRecord {
    #[serde(rename = "taskId")]
    task_id: String,
    output: String,
    status: String,
    timestamp: String,
}

/// Writes and restores registry snapshots.
///
/// Paths default to [`SNAPSHOT_FILE`]/[`SNAPSHOT_TEMP_FILE`] in the working
/// directory; tests point the engine at a temp dir instead. Saves are
/// serialized by an internal lock so two callers can never interleave writes
/// to the temp file.
#[derive(Debug)]
pub struct SnapshotEngine {
    primary: PathBuf,
    temp: PathBuf,
    save_lock: Mutex<()>,
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self::with_paths(SNAPSHOT_FILE, SNAPSHOT_TEMP_FILE)
    }

    pub fn with_paths(primary: impl Into<PathBuf>, temp: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            temp: temp.into(),
            save_lock: Mutex::new(()),
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    /// Saves a point-in-time snapshot of every queue in the registry.
    ///
    /// Write-temp-then-rename keeps invariant: the primary file always holds
    /// a complete prior snapshot, never a partial write. Holds the save lock
    /// for the duration; takes each queue's own locks only around that
    /// queue's reads.
    pub fn save(&self, registry: &QueueRegistry) -> io::Result<()> {
        let _guard = self.save_lock.lock();

        let queues: Vec<QueueRecord> = registry.all().iter().map(|q| snapshot_queue(q)).collect();
        let task_total: usize = queues.iter().map(|q| q.tasks.len()).sum();
        let data = SnapshotData {
            version: FORMAT_VERSION.to_string(),
            timestamp: epoch_millis(),
            queues,
        };

        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.temp, json)?;

        if self.primary.exists() {
            if let Err(e) = std::fs::remove_file(&self.primary) {
                warn!(error = %e, "failed to delete old snapshot file");
            }
        }
        std::fs::rename(&self.temp, &self.primary)?;

        debug!(
            queues = data.queues.len(),
            tasks = task_total,
            "snapshot saved"
        );
        Ok(())
    }

    /// Restores queues from the primary snapshot file into `registry`.
    ///
    /// Missing or empty file means a fresh start. A record that cannot be
    /// parsed is skipped with a warning; everything else is recovered. Tasks
    /// and results keep their original identifiers, statuses and timestamps.
    pub fn load(&self, registry: &QueueRegistry) {
        let raw = match std::fs::read_to_string(&self.primary) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no snapshot file found, starting with an empty registry");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to read snapshot file");
                return;
            }
        };
        if raw.trim().is_empty() {
            info!("snapshot file is empty, starting with an empty registry");
            return;
        }

        let data: SnapshotData = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "failed to parse snapshot file");
                return;
            }
        };

        let mut total_tasks = 0usize;
        let mut total_results = 0usize;
        let queue_records = data.queues.len();

        for record in data.queues {
            let Ok(queue_id) = Uuid::parse_str(&record.id) else {
                warn!(id = %record.id, "skipping queue record with unparseable id");
                continue;
            };
            let queue = Arc::new(TaskQueue::restore(queue_id, record.name));

            for task in record.tasks {
                match restore_task(&task) {
                    Some(restored) => {
                        queue.enqueue(Arc::new(restored));
                        total_tasks += 1;
                    }
                    None => {
                        warn!(queue_id = %queue_id, task_id = %task.id, "skipping unparseable task record");
                    }
                }
            }

            for result in record.results {
                match restore_result(&result) {
                    Some(restored) => {
                        queue.add_result(restored);
                        total_results += 1;
                    }
                    None => {
                        warn!(queue_id = %queue_id, task_id = %result.task_id, "skipping unparseable result record");
                    }
                }
            }

            registry.install(queue);
        }

        info!(
            queues = queue_records,
            tasks = total_tasks,
            results = total_results,
            "snapshot loaded"
        );
    }
}

fn snapshot_queue(queue: &TaskQueue) -> QueueRecord {
    QueueRecord {
        id: queue.id().to_string(),
        name: queue.name().to_string(),
        tasks: queue
            .snapshot_tasks()
            .iter()
            .map(|task| TaskRecord {
                id: task.id().to_string(),
                params: task.params().to_string(),
                priority: task.priority(),
                status: task.status().name().to_string(),
            })
            .collect(),
        results: queue
            .snapshot_results()
            .iter()
            .map(|result| ResultRecord {
                task_id: result.task_id().to_string(),
                output: result.output().to_string(),
                status: result.status().name().to_string(),
                timestamp: result.timestamp().format(TIMESTAMP_FORMAT).to_string(),
            })
            .collect(),
    }
}

fn restore_task(record: &TaskRecord) -> Option<Task> {
    let id = Uuid::parse_str(&record.id).ok()?;
    let status = TaskStatus::from_name(&record.status)?;
    Some(Task::restore(id, record.params.clone(), record.priority, status))
}

fn restore_result(record: &ResultRecord) -> Option<TaskResult> {
    let task_id = Uuid::parse_str(&record.task_id).ok()?;
    let status = ResultStatus::from_name(&record.status)?;
    let timestamp = NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).ok()?;
    Some(TaskResult::restore(
        task_id,
        record.output.clone(),
        status,
        timestamp,
    ))
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time is before Unix epoch")
        .as_millis() as u64
}

/// Spawns the background task that saves a snapshot every
/// [`SNAPSHOT_INTERVAL`], starting one interval after startup. Aborted by
/// the runtime on shutdown, after which one final save runs inline.
pub fn spawn_periodic(
    engine: Arc<SnapshotEngine>,
    registry: Arc<QueueRegistry>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + SNAPSHOT_INTERVAL;
        let mut ticker = tokio::time::interval_at(start, SNAPSHOT_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = engine.save(&registry) {
                error!(error = %e, "periodic snapshot save failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine_in(dir: &TempDir) -> SnapshotEngine {
        SnapshotEngine::with_paths(
            dir.path().join(SNAPSHOT_FILE),
            dir.path().join(SNAPSHOT_TEMP_FILE),
        )
    }

    #[test]
    fn missing_file_leaves_registry_empty() {
        let dir = TempDir::new().unwrap();
        let registry = QueueRegistry::new();
        engine_in(&dir).load(&registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn empty_file_leaves_registry_empty() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        std::fs::write(engine.primary_path(), "").unwrap();

        let registry = QueueRegistry::new();
        engine.load(&registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn garbage_file_leaves_registry_empty() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        std::fs::write(engine.primary_path(), "{ not json").unwrap();

        let registry = QueueRegistry::new();
        engine.load(&registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn save_removes_the_temp_file() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let registry = QueueRegistry::new();
        registry.create("jobs");

        engine.save(&registry).unwrap();
        assert!(engine.primary_path().exists());
        assert!(!dir.path().join(SNAPSHOT_TEMP_FILE).exists());
    }

    #[test]
    fn corrupt_records_are_skipped_individually() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let good_queue = Uuid::new_v4();
        let good_task = Uuid::new_v4();
        let good_result = Uuid::new_v4();

        // One unloadable queue, and inside the good queue one bad task and
        // one bad result alongside good ones.
        let json = serde_json::json!({
            "version": "1.0",
            "timestamp": 0,
            "queues": [
                {
                    "id": "not-a-uuid",
                    "name": "lost",
                    "tasks": [],
                    "results": []
                },
                {
                    "id": good_queue.to_string(),
                    "name": "kept",
                    "tasks": [
                        {"id": good_task.to_string(), "params": "p", "priority": 2, "status": "PENDING"},
                        {"id": good_task.to_string(), "params": "p", "priority": 2, "status": "NOT_A_STATUS"}
                    ],
                    "results": [
                        {"taskId": good_result.to_string(), "output": "ok", "status": "SUCCESS", "timestamp": "2024-01-01T12:00:00"},
                        {"taskId": good_result.to_string(), "output": "ok", "status": "SUCCESS", "timestamp": "yesterday-ish"}
                    ]
                }
            ]
        });
        std::fs::write(engine.primary_path(), json.to_string()).unwrap();

        let registry = QueueRegistry::new();
        engine.load(&registry);

        assert_eq!(registry.len(), 1);
        let queue = registry.get(good_queue).unwrap();
        assert_eq!(queue.name(), "kept");
        assert_eq!(queue.task_count(), 1);
        assert_eq!(queue.result_count(), 1);
        assert_eq!(queue.get_result(good_result).unwrap().output(), "ok");
    }

    #[test]
    fn restore_preserves_task_identity_and_status() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);

        let registry = QueueRegistry::new();
        let queue = registry.create("jobs");
        let task = Arc::new(Task::new("payload", -3));
        task.set_status(TaskStatus::InProgress);
        queue.enqueue(Arc::clone(&task));

        engine.save(&registry).unwrap();

        let restored_registry = QueueRegistry::new();
        engine.load(&restored_registry);

        let restored_queue = restored_registry.get(queue.id()).unwrap();
        let restored_task = restored_queue.dequeue().unwrap();
        assert_eq!(restored_task.id(), task.id());
        assert_eq!(restored_task.priority(), -3);
        assert_eq!(restored_task.params(), "payload");
        assert_eq!(restored_task.status(), TaskStatus::InProgress);
    }
}
