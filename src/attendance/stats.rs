use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about an attendance session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Day the session is currently recording into
    pub current_date: NaiveDate,

    /// Identities marked for the current day
    pub marked_today: usize,

    /// Records written since the session started (all days)
    pub records_written: usize,

    /// Recognitions ignored because the identity was already marked
    pub duplicates_skipped: usize,

    /// Faces that matched nobody
    pub unknown_faces: usize,

    /// Appends that failed and were left for retry
    pub failed_writes: usize,
}
