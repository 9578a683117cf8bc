//! Project API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use taskflow_core::project::{Project, ProjectDraft, ProjectPatch};
use taskflow_core::record::RecordId;
use taskflow_core::view::{search_projects, ProjectStats};
use taskflow_core::Error;

use super::task::DeleteQuery;
use super::{confirmation_required, error_response, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// A project with its task counts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub task_count: usize,
    pub completed_count: usize,
}

impl ProjectResponse {
    pub fn new(project: Project, stats: &[ProjectStats]) -> Self {
        let counts = stats.iter().find(|s| s.project_id == project.id);
        Self {
            task_count: counts.map_or(0, |s| s.task_count),
            completed_count: counts.map_or(0, |s| s.completed_count),
            project,
        }
    }
}

/// GET /api/projects - Projects with counts, optionally searched
async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Json<Vec<ProjectResponse>> {
    let board = state.board().read().await;
    let stats = board.project_stats();
    let term = query.search.unwrap_or_default();

    Json(
        search_projects(board.projects(), &term)
            .into_iter()
            .map(|p| ProjectResponse::new(p.clone(), &stats))
            .collect(),
    )
}

/// POST /api/projects - Create a project through the project form
async fn create_project(
    State(state): State<AppState>,
    Json(draft): Json<ProjectDraft>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let mut board = state.board().write().await;
    let project = board.create_project(draft).await.map_err(error_response)?;
    let stats = board.project_stats();
    Ok((StatusCode::CREATED, Json(ProjectResponse::new(project, &stats))))
}

/// GET /api/projects/{id} - Fetch one project from the store
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<ProjectResponse>> {
    let (repo, stats) = {
        let board = state.board().read().await;
        (board.project_repository().clone(), board.project_stats())
    };
    let project = repo
        .get(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| error_response(Error::ProjectNotFound(id.to_string())))?;
    Ok(Json(ProjectResponse::new(project, &stats)))
}

/// PUT /api/projects/{id} - Edit a project through the project form
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<ProjectResponse>> {
    let mut board = state.board().write().await;
    let project = board
        .update_project(id, &patch)
        .await
        .map_err(error_response)?;
    let stats = board.project_stats();
    Ok(Json(ProjectResponse::new(project, &stats)))
}

/// DELETE /api/projects/{id}?confirm=true - Delete a project
async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    let confirmed = query.confirm;
    let deleted = state
        .board()
        .write()
        .await
        .delete_project(id, &move |_: &str| confirmed)
        .await
        .map_err(error_response)?;

    match (deleted, confirmed) {
        (true, _) => Ok(StatusCode::NO_CONTENT),
        (false, false) => Err(confirmation_required("project")),
        (false, true) => Err(error_response(Error::ProjectNotFound(id.to_string()))),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}
