//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints:
//! - Ledger endpoints (park-in, park-out, occupancy, alerts, history)
//! - Reference endpoints (zones, lots, walking times, after-hours,
//!   recommendations)

pub mod middleware;
pub mod reference;
pub mod sessions;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the API router, nested under /api/v1 by `build_router`.
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/park-in", post(sessions::park_in))
        .route("/park-out", post(sessions::park_out))
        .route("/categories", get(sessions::list_categories))
        .route("/categories/{category}/active", get(sessions::list_active))
        .route("/alerts", get(sessions::list_alerts))
        .route("/history", get(sessions::history))
        .route("/zones", get(reference::list_zones))
        .route("/zones/{name}", get(reference::get_zone))
        .route("/lots/{lot}", get(reference::get_lot))
        .route("/walking-times", get(reference::walking_times))
        .route("/after-hours", get(reference::after_hours))
        .route("/recommendations", get(reference::recommend))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
