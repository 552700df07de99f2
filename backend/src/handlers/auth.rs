//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::{AuthTokens, LoginInput, RegisterInput, RegisterResponse};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(body).await?;
    Ok(Json(tokens))
}

/// Register endpoint handler
pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let result = auth_service.register(body).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(body): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh_token(&body.refresh_token).await?;
    Ok(Json(tokens))
}

/// Account of the signed-in user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user = auth_service.current_user(current_user.user_id()).await?;
    Ok(Json(user))
}
