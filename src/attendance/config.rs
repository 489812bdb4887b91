use serde::{Deserialize, Serialize};

/// Configuration for an attendance session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "attendance-lab-3")
    pub session_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("attendance-{}", uuid::Uuid::new_v4()),
        }
    }
}
