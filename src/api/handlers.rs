//! Request handlers and the JSON shapes they speak.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::core::queue::TaskQueue;
use crate::core::result::{ResultStatus, TaskResult};
use crate::core::task::{Task, TaskStatus};

// Request bodies.

#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueTaskRequest {
    #[serde(default)]
    pub params: String,
    pub priority: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    pub task_id: Uuid,
    #[serde(default)]
    pub output: String,
    pub status: ResultStatus,
}

// Response bodies.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub id: Uuid,
    pub name: String,
    pub task_count: usize,
    pub result_count: usize,
}

impl From<&TaskQueue> for QueueResponse {
    fn from(queue: &TaskQueue) -> Self {
        Self {
            id: queue.id(),
            name: queue.name().to_string(),
            task_count: queue.task_count(),
            result_count: queue.result_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub params: String,
    pub priority: i32,
    pub status: TaskStatus,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            params: task.params().to_string(),
            priority: task.priority(),
            status: task.status(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub task_id: Uuid,
    pub output: String,
    pub status: ResultStatus,
    pub timestamp: NaiveDateTime,
}

impl From<&TaskResult> for ResultResponse {
    fn from(result: &TaskResult) -> Self {
        Self {
            task_id: result.task_id(),
            output: result.output().to_string(),
            status: result.status(),
            timestamp: result.timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    pub id: Uuid,
    pub name: String,
    pub pending_task_count: usize,
    pub completed_result_count: usize,
    pub has_pending_tasks: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub message: String,
    pub queues_cleared: usize,
}

// Handlers.

pub async fn create_queue(
    State(state): State<AppState>,
    payload: Result<Json<CreateQueueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QueueResponse>), ApiError> {
    let Json(body) = payload.map_err(reject_body)?;
    let queue = state.service.create_queue(body.name.as_deref().unwrap_or(""))?;
    Ok((StatusCode::CREATED, Json(QueueResponse::from(queue.as_ref()))))
}

pub async fn enqueue_task(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
    payload: Result<Json<EnqueueTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let queue_id = parse_id("queue ID", &queue_id)?;
    let Json(body) = payload.map_err(reject_body)?;
    let task = state
        .service
        .enqueue_task(queue_id, body.params, body.priority)?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task.as_ref()))))
}

pub async fn dequeue_task(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
) -> Result<Response, ApiError> {
    let queue_id = parse_id("queue ID", &queue_id)?;
    match state.service.dequeue_task(queue_id)? {
        Some(task) => Ok((StatusCode::OK, Json(TaskResponse::from(task.as_ref()))).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn submit_result(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
    payload: Result<Json<SubmitResultRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    let queue_id = parse_id("queue ID", &queue_id)?;
    let Json(body) = payload.map_err(reject_body)?;
    let result = state
        .service
        .submit_result(queue_id, body.task_id, body.output, body.status)?;
    Ok((StatusCode::CREATED, Json(ResultResponse::from(&result))))
}

pub async fn get_result(
    State(state): State<AppState>,
    Path((queue_id, task_id)): Path<(String, String)>,
) -> Result<Json<ResultResponse>, ApiError> {
    let queue_id = parse_id("queue ID", &queue_id)?;
    let task_id = parse_id("task ID", &task_id)?;
    match state.service.get_result(queue_id, task_id)? {
        Some(result) => Ok(Json(ResultResponse::from(&result))),
        None => Err(ApiError::not_found(format!(
            "No result found for task '{task_id}'"
        ))),
    }
}

pub async fn queue_status(
    State(state): State<AppState>,
    Path(queue_id): Path<String>,
) -> Result<Json<QueueStatusResponse>, ApiError> {
    let queue_id = parse_id("queue ID", &queue_id)?;
    let status = state.service.queue_status(queue_id)?;
    Ok(Json(QueueStatusResponse {
        id: status.id,
        name: status.name,
        pending_task_count: status.pending_task_count,
        completed_result_count: status.completed_result_count,
        has_pending_tasks: status.has_pending_tasks,
    }))
}

pub async fn clear_all(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.service.clear_all();
    Json(ClearResponse {
        message: "All queues cleared".to_string(),
        queues_cleared: removed,
    })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "UP",
    }))
}

/// Malformed identifier literals are client faults, reported before the
/// facade is consulted.
fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::invalid_argument(format!("Invalid {kind}: '{raw}' is not a valid UUID"))
    })
}

/// Undeserializable bodies (bad JSON, missing fields, unknown enum names)
/// all land here as 400s with the deserializer's message.
fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::invalid_argument(rejection.body_text())
}
