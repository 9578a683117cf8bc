//! Task API endpoints
//!
//! Task reads come from the board's local lists; writes go through the
//! board's form and intent methods so notifications and local state stay in
//! step with the store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use taskflow_core::record::RecordId;
use taskflow_core::task::{Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
use taskflow_core::view::{is_overdue, TaskFilter, TaskView};
use taskflow_core::Error;

use super::{confirmation_required, error_response, ApiResult};
use crate::state::{today, AppState};

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub project: Option<RecordId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// A task with its display attributes resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub priority_label: &'static str,
    pub status_label: &'static str,
    pub overdue: bool,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            priority_label: task.priority.label(),
            status_label: task.status.label(),
            overdue: is_overdue(&task, today()),
            task,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub view: TaskView,
    pub tasks: Vec<TaskResponse>,
}

#[derive(Debug, Serialize)]
pub struct OptionEntry {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub filters: Vec<OptionEntry>,
    pub priorities: Vec<OptionEntry>,
    pub statuses: Vec<OptionEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - Filtered, searched and sorted task list
///
/// Query parameters override the board's current selection for this request.
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let board = state.board().read().await;

    let mut view = board.view().clone();
    if let Some(filter) = query.filter.as_deref() {
        view.filter = filter.parse::<TaskFilter>().map_err(error_response)?;
    }
    if let Some(search) = query.search {
        view.search = search;
    }
    if query.project.is_some() {
        view.selected_project = query.project;
    }

    let tasks = view
        .apply(board.tasks(), today())
        .into_iter()
        .map(TaskResponse::from)
        .collect();
    Ok(Json(TaskListResponse { view, tasks }))
}

/// POST /api/tasks - Create a task through the task form
async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .board()
        .write()
        .await
        .create_task(draft)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// GET /api/tasks/{id} - Fetch one task from the store
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<TaskResponse>> {
    let repo = state.board().read().await.task_repository().clone();
    let task = repo
        .get(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| error_response(Error::TaskNotFound(id.to_string())))?;
    Ok(Json(task.into()))
}

/// PATCH /api/tasks/{id} - Edit a task through the task form
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .board()
        .write()
        .await
        .update_task(id, &patch)
        .await
        .map_err(error_response)?;
    Ok(Json(task.into()))
}

/// POST /api/tasks/{id}/toggle - Flip between completed and pending
async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .board()
        .write()
        .await
        .toggle_task(id)
        .await
        .map_err(error_response)?;
    Ok(Json(task.into()))
}

/// DELETE /api/tasks/{id}?confirm=true - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    let confirmed = query.confirm;
    let deleted = state
        .board()
        .write()
        .await
        .delete_task(id, &move |_: &str| confirmed)
        .await
        .map_err(error_response)?;

    match (deleted, confirmed) {
        (true, _) => Ok(StatusCode::NO_CONTENT),
        (false, false) => Err(confirmation_required("task")),
        (false, true) => Err(error_response(Error::TaskNotFound(id.to_string()))),
    }
}

/// GET /api/options - Filter, priority and status choices with labels
async fn list_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        filters: TaskFilter::ALL
            .into_iter()
            .map(|f| OptionEntry {
                value: f.as_str(),
                label: f.label(),
                icon: f.icon(),
            })
            .collect(),
        priorities: TaskPriority::ALL
            .into_iter()
            .map(|p| OptionEntry {
                value: p.as_str(),
                label: p.label(),
                icon: p.icon(),
            })
            .collect(),
        statuses: TaskStatus::ALL
            .into_iter()
            .map(|s| OptionEntry {
                value: s.as_str(),
                label: s.label(),
                icon: s.icon(),
            })
            .collect(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", post(toggle_task))
        .route("/api/options", get(list_options))
}
