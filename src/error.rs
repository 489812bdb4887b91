//! Library error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// The camera could not be opened or stopped delivering frames.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Appending to the day's record failed. The identity stays unmarked.
    #[error("Failed to write attendance record to {path:?}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read attendance records from {path:?}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    #[error("Encoding store error: {0}")]
    EncodingStore(String),

    #[error("Recognizer error: {0}")]
    Recognizer(String),
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
