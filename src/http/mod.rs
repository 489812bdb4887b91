//! HTTP API for dashboards and manual check-in
//!
//! - POST /attendance/mark - Mark an identity by hand
//! - GET /attendance/today - Records for the current day
//! - GET /attendance/days - Days that have a sheet
//! - GET /attendance/:date - Records for a given day
//! - GET /session/stats - Session counters
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
