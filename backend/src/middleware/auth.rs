//! Authentication middleware
//!
//! Validates the bearer JWT on protected routes and exposes the account
//! it was issued to. Every service call is scoped by that account id.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::services::auth::decode_access_token;
use crate::AppState;

/// Authenticated account extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    let claims = match decode_access_token(bearer.token(), &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected access token: {}", e);
            return unauthorized_response("Invalid or expired token");
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    request.extensions_mut().insert(AuthUser { user_id });

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message, None),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current account
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail::new("UNAUTHORIZED", "Authentication required", None),
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
