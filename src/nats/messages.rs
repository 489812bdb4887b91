use serde::{Deserialize, Serialize};

use crate::attendance::{AttendanceRecord, Label};
use crate::recognition::FaceRegion;

/// Faces recognized in one frame, published by an external recognizer
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognitionMessage {
    pub camera_id: String,
    pub frame_sequence: u64,
    pub timestamp: String, // RFC3339 timestamp
    pub faces: Vec<RecognizedFace>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizedFace {
    /// `None` (or "Unknown") when the face matched nobody
    pub identity: Option<String>,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub region: Option<FaceRegion>,
    /// Raw feature vector, for recognizers that leave matching to this service
    #[serde(default)]
    pub encoding: Option<Vec<f32>>,
}

impl RecognizedFace {
    pub fn label(&self) -> Label {
        Label::from_name(self.identity.as_deref())
    }
}

/// Published once per new attendance record
#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceMarkedMessage {
    pub session_id: String,
    pub identity: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM:SS
}

impl AttendanceMarkedMessage {
    pub fn new(session_id: &str, record: &AttendanceRecord) -> Self {
        Self {
            session_id: session_id.to_string(),
            identity: record.identity.to_string(),
            date: record.date.format("%Y-%m-%d").to_string(),
            time: record.time.format("%H:%M:%S").to_string(),
        }
    }
}
