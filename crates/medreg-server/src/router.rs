use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all registry endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/invitations", post(handler::invitation_handler))
        .route(
            "/v1/records",
            get(handler::list_handler).post(handler::submit_handler),
        )
        .route("/v1/records/:id", get(handler::show_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Same as [`build_router`], answering cross-origin requests from anywhere.
pub fn build_router_with_cors(state: AppState) -> Router {
    build_router(state).layer(CorsLayer::permissive())
}
