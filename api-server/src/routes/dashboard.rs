//! Dashboard, refresh and notification endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use taskflow_core::board::Notice;
use taskflow_core::view::DashboardStats;

use super::project::ProjectResponse;
use super::task::TaskResponse;
use super::{error_response, ApiResult};
use crate::state::{today, AppState};

const RECENT_TASK_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub completion_rate: u8,
    pub recent_tasks: Vec<TaskResponse>,
    pub projects: Vec<ProjectResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub task_count: usize,
    pub project_count: usize,
}

/// GET /api/dashboard
async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let board = state.board().read().await;
    let stats = board.dashboard(today());
    let project_stats = board.project_stats();

    Json(DashboardResponse {
        completion_rate: stats.completion_rate(),
        stats,
        recent_tasks: board
            .recent_tasks(RECENT_TASK_LIMIT)
            .into_iter()
            .map(TaskResponse::from)
            .collect(),
        projects: board
            .projects()
            .iter()
            .cloned()
            .map(|p| ProjectResponse::new(p, &project_stats))
            .collect(),
    })
}

/// POST /api/refresh - Reload tasks and projects from the store
async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let mut board = state.board().write().await;
    board.load().await.map_err(error_response)?;
    Ok(Json(RefreshResponse {
        task_count: board.tasks().len(),
        project_count: board.projects().len(),
    }))
}

/// GET /api/notices - Drain pending notifications
async fn take_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.board().write().await.take_notices())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/refresh", post(refresh))
        .route("/api/notices", get(take_notices))
}
