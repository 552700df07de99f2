//! Pond HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::extract::AppJson;
use crate::middleware::CurrentUser;
use crate::services::pond::CreatePondInput;
use crate::services::PondService;
use crate::AppState;

/// List the current user's ponds
pub async fn list_ponds(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> impl IntoResponse {
    let service = PondService::new(state.db.clone());

    match service.list_ponds(current_user.user_id()).await {
        Ok(ponds) => (StatusCode::OK, Json(serde_json::json!({ "ponds": ponds }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific pond
pub async fn get_pond(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(pond_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PondService::new(state.db.clone());

    match service.get_pond(current_user.user_id(), pond_id).await {
        Ok(pond) => (StatusCode::OK, Json(pond)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new pond
pub async fn create_pond(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreatePondInput>,
) -> impl IntoResponse {
    let service = PondService::new(state.db.clone());

    match service.create_pond(current_user.user_id(), input).await {
        Ok(pond) => (StatusCode::CREATED, Json(pond)).into_response(),
        Err(e) => e.into_response(),
    }
}
