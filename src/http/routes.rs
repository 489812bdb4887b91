use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Attendance
        .route("/attendance/mark", post(handlers::mark_attendance))
        .route("/attendance/today", get(handlers::get_today))
        .route("/attendance/days", get(handlers::list_days))
        .route("/attendance/:date", get(handlers::get_day))
        // Session
        .route("/session/stats", get(handlers::get_stats))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
