//! Route definitions for the aquafarm API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public except /me)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes
        .nest("/ponds", pond_routes(state.clone()))
        .nest("/species", species_routes(state.clone()))
        .nest("/stocks", stock_routes(state.clone()))
        .nest("/samplings", sampling_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let me = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(me)
}

/// Pond routes (protected)
fn pond_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ponds).post(handlers::create_pond))
        .route("/:pond_id", get(handlers::get_pond))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Species routes (protected)
fn species_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_species).post(handlers::add_species))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocks).post(handlers::open_stock))
        .route("/:stock_id", get(handlers::get_stock))
        .route("/:stock_id/close", post(handlers::close_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sampling routes (protected)
fn sampling_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_samplings).post(handlers::create_sampling))
        .route("/preview", post(handlers::preview_sampling))
        .route("/:sampling_id", get(handlers::get_sampling))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
