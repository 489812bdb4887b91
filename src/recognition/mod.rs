//! Recognition pipeline plumbing
//!
//! Face detection and feature extraction are external capabilities behind
//! the `Recognizer` / `FaceEncoder` traits. This module provides the camera
//! abstraction, the known-face encoding store, encoding comparison and the
//! throttled capture loop that feeds an `AttendanceSession`.

pub mod encodings;
pub mod frame;
pub mod matcher;
pub mod recognizer;
pub mod runner;
pub mod source;

pub use encodings::{BuildReport, EncodingStore};
pub use frame::{FaceRegion, Frame};
pub use matcher::{FaceMatch, FaceMatcher, MatchPolicy, DEFAULT_TOLERANCE};
pub use recognizer::{Detection, EmbeddingRecognizer, EncodedFace, FaceEncoder, Recognizer};
pub use runner::{LoopConfig, LoopSummary, RecognitionLoop, StopHandle};
pub use source::{FrameSource, ImageDirSource};
