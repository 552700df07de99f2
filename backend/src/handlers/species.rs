//! Fish species HTTP handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::CurrentUser;
use crate::models::FishSpecies;
use crate::services::species::AddSpeciesInput;
use crate::services::SpeciesService;
use crate::AppState;

/// Global species plus the current user's custom ones
pub async fn list_species(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<FishSpecies>>> {
    let service = SpeciesService::new(state.db);
    let species = service.list_species(current_user.user_id()).await?;
    Ok(Json(species))
}

/// Add a custom species
pub async fn add_species(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<AddSpeciesInput>,
) -> AppResult<(StatusCode, Json<FishSpecies>)> {
    let service = SpeciesService::new(state.db);
    let species = service.add_species(current_user.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(species)))
}
