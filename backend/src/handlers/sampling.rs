//! Fish sampling HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::aggregation::SamplingAggregate;
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::CurrentUser;
use crate::services::sampling::{BatchInput, CreateSamplingInput, SamplingFilter, SamplingView};
use crate::services::SamplingService;
use crate::AppState;

/// List samplings with filters and pagination
pub async fn list_samplings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SamplingFilter>,
) -> AppResult<Json<PaginatedResponse<SamplingView>>> {
    let service = SamplingService::new(state.db);
    let page = service
        .list_samplings(current_user.user_id(), filter, &state.config.pagination)
        .await?;
    Ok(Json(page))
}

/// Sampling detail with its growth bundle
pub async fn get_sampling(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sampling_id): Path<Uuid>,
) -> AppResult<Json<SamplingView>> {
    let service = SamplingService::new(state.db);
    let sampling = service
        .get_sampling(current_user.user_id(), sampling_id)
        .await?;
    Ok(Json(sampling))
}

/// Record a new sampling
pub async fn create_sampling(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateSamplingInput>,
) -> AppResult<(StatusCode, Json<SamplingView>)> {
    let service = SamplingService::new(state.db);
    let sampling = service
        .create_sampling(current_user.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(sampling)))
}

/// Aggregate batches without saving
pub async fn preview_sampling(
    _current_user: CurrentUser,
    AppJson(input): AppJson<BatchInput>,
) -> AppResult<Json<SamplingAggregate>> {
    let aggregate = SamplingService::preview(&input)?;
    Ok(Json(aggregate))
}
