//! Preference endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use taskflow_core::prefs::Preferences;

use super::{error_response, ApiResult};
use crate::state::AppState;

/// GET /api/preferences
async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(*state.preferences().read().await)
}

/// PUT /api/preferences - Replace and persist
async fn put_preferences(
    State(state): State<AppState>,
    Json(prefs): Json<Preferences>,
) -> ApiResult<Json<Preferences>> {
    let mut current = state.preferences().write().await;
    state
        .prefs_store()
        .save(&prefs)
        .await
        .map_err(error_response)?;
    *current = prefs;
    Ok(Json(prefs))
}

/// POST /api/preferences/dark-mode/toggle
async fn toggle_dark_mode(State(state): State<AppState>) -> ApiResult<Json<Preferences>> {
    let mut current = state.preferences().write().await;
    let toggled = state
        .prefs_store()
        .toggle_dark_mode(&current)
        .await
        .map_err(error_response)?;
    *current = toggled;
    Ok(Json(toggled))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/preferences", get(get_preferences).put(put_preferences))
        .route("/api/preferences/dark-mode/toggle", post(toggle_dark_mode))
}
