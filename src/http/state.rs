use crate::attendance::AttendanceSession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The running attendance session (shared with the NATS listener)
    pub session: Arc<Mutex<AttendanceSession>>,
}

impl AppState {
    pub fn new(session: Arc<Mutex<AttendanceSession>>) -> Self {
        Self { session }
    }
}
