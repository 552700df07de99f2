//! Pond fish stock HTTP handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::CurrentUser;
use crate::services::stock::{CloseStockInput, OpenStockInput, StockDetail, StockFilter, StockView};
use crate::services::StockService;
use crate::AppState;

/// List stocks, optionally filtered by status and pond
pub async fn list_stocks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<StockFilter>,
) -> AppResult<Json<Vec<StockView>>> {
    let service = StockService::new(state.db);
    let stocks = service.list_stocks(current_user.user_id(), filter).await?;
    Ok(Json(stocks))
}

/// Stock detail with cumulative growth
pub async fn get_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
) -> AppResult<Json<StockDetail>> {
    let service = StockService::new(state.db);
    let stock = service.get_stock(current_user.user_id(), stock_id).await?;
    Ok(Json(stock))
}

/// Open a new stock
pub async fn open_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<OpenStockInput>,
) -> AppResult<(StatusCode, Json<StockView>)> {
    let service = StockService::new(state.db);
    let stock = service.open_stock(current_user.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// Close a stock; an empty body closes it today
pub async fn close_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<StockView>> {
    let input = parse_close_body(&body)?;
    let service = StockService::new(state.db);
    let stock = service
        .close_stock(current_user.user_id(), stock_id, input)
        .await?;
    Ok(Json(stock))
}

// Closing cannot be undone, so a body that is present must parse.
fn parse_close_body(body: &[u8]) -> AppResult<CloseStockInput> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CloseStockInput::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::validation("closed_on", format!("Invalid closing request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Extension, Router};
    use chrono::NaiveDate;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::{Config, DatabaseConfig, JwtConfig, PaginationConfig, ServerConfig};
    use crate::middleware::AuthUser;

    fn test_state() -> AppState {
        let config = Config {
            environment: "test".to_string(),
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://aquafarm@localhost/aquafarm_test".to_string(),
                max_connections: 1,
                min_connections: 0,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                access_token_expiry: 3600,
                refresh_token_expiry: 604800,
            },
            pagination: PaginationConfig::default(),
        };

        // Never connects unless a query runs
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        AppState {
            db,
            config: Arc::new(config),
        }
    }

    #[test]
    fn test_empty_body_closes_today() {
        assert!(parse_close_body(b"").unwrap().closed_on.is_none());
        assert!(parse_close_body(b"  \n").unwrap().closed_on.is_none());
        assert!(parse_close_body(b"{}").unwrap().closed_on.is_none());
    }

    #[test]
    fn test_explicit_closing_date() {
        let input = parse_close_body(br#"{"closed_on": "2024-03-01"}"#).unwrap();
        assert_eq!(input.closed_on, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_malformed_body_is_not_coerced() {
        let bodies: [&[u8]; 4] = [
            br#"{"closed_on": "2024/03/01"}"#,
            br#"{"closed_on": 20240301}"#,
            br#"{"closedOn": "2024-03-01"}"#,
            br#"{"closed_on": "#,
        ];
        for body in bodies {
            match parse_close_body(body) {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, "closed_on"),
                other => panic!("unexpected result: {:?}", other.map(|i| i.closed_on)),
            }
        }
    }

    #[tokio::test]
    async fn test_close_with_bad_date_returns_400() {
        let app = Router::new()
            .route("/stocks/:stock_id/close", post(close_stock))
            .layer(Extension(AuthUser {
                user_id: Uuid::new_v4(),
            }))
            .with_state(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/stocks/{}/close", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"closed_on":"2024/03/01"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["field"], "closed_on");
    }
}
