use super::state::AppState;
use crate::attendance::{AttendanceRecord, Identity, MarkOutcome};
use crate::error::AttendanceError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub identity: String,
}

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    /// "marked" or "already_marked"
    pub status: String,
    pub record: Option<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /attendance/mark
/// Mark an identity by hand (same rules as a camera recognition)
pub async fn mark_attendance(
    State(state): State<AppState>,
    Json(req): Json<MarkRequest>,
) -> impl IntoResponse {
    let identity = match Identity::new(req.identity) {
        Ok(identity) => identity,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    info!("Manual attendance request for {}", identity);

    let outcome = {
        let mut session = state.session.lock().await;
        session.on_recognized(&identity)
    };

    match outcome {
        Ok(MarkOutcome::Marked(record)) => (
            StatusCode::CREATED,
            Json(MarkResponse {
                status: "marked".to_string(),
                record: Some(record),
            }),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::OK,
            Json(MarkResponse {
                status: "already_marked".to_string(),
                record: None,
            }),
        )
            .into_response(),
        Err(e @ AttendanceError::StorageWrite { .. }) => {
            error!("Failed to mark {}: {}", identity, e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => {
            error!("Failed to mark {}: {}", identity, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /attendance/today
/// Records for the day the session is currently writing
pub async fn get_today(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let date = session.current_date();

    match session.records_for_today() {
        Ok(records) => (StatusCode::OK, Json(DayResponse { date, records })).into_response(),
        Err(e) => {
            error!("Failed to load today's records: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /attendance/days
/// Dates that have an attendance sheet
pub async fn list_days(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;

    match session.available_days() {
        Ok(days) => (StatusCode::OK, Json(days)).into_response(),
        Err(e) => {
            error!("Failed to list attendance days: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /attendance/:date
/// Records for a given YYYY-MM-DD date
pub async fn get_day(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    let date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid date {:?}, expected YYYY-MM-DD", date),
            )
        }
    };

    let session = state.session.lock().await;

    match session.records_for(date) {
        Ok(records) => (StatusCode::OK, Json(DayResponse { date, records })).into_response(),
        Err(e) => {
            error!("Failed to load records for {}: {}", date, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /session/stats
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    (StatusCode::OK, Json(session.stats()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
