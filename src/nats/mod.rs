pub mod bridge;
pub mod client;
pub mod messages;

pub use bridge::{apply_recognition, FaceResolver, spawn_marked_publisher, spawn_recognition_listener};
pub use client::NatsClient;
pub use messages::{AttendanceMarkedMessage, RecognitionMessage, RecognizedFace};
