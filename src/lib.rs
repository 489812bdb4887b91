pub mod attendance;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod recognition;

pub use attendance::{
    AttendanceObserver, AttendanceRecord, AttendanceSession, AttendanceStore, ChannelObserver,
    Clock, CsvAttendanceStore, Identity, Label, LoggingObserver, ManualClock, MarkOutcome,
    SessionConfig, SessionStats, StoreConfig, SystemClock,
};
pub use config::Config;
pub use error::AttendanceError;
pub use http::{create_router, AppState};
pub use nats::{NatsClient, RecognitionMessage};
pub use recognition::{
    EmbeddingRecognizer, EncodingStore, FaceEncoder, FaceMatcher, FrameSource, LoopConfig,
    MatchPolicy, RecognitionLoop, Recognizer,
};
