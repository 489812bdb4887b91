use chrono::NaiveDateTime;
use face_attendance::attendance::{
    AttendanceRecord, AttendanceSession, CsvAttendanceStore, Identity, Label, ManualClock,
    SessionConfig, StoreConfig,
};
use face_attendance::nats::messages::{AttendanceMarkedMessage, RecognitionMessage};
use face_attendance::nats::{apply_recognition, FaceResolver};
use face_attendance::recognition::{EncodingStore, FaceMatcher, MatchPolicy};
use tempfile::TempDir;

fn session(dir: &TempDir) -> AttendanceSession {
    let store = CsvAttendanceStore::new(StoreConfig::new(dir.path().to_path_buf())).unwrap();
    let start = NaiveDateTime::parse_from_str("2025-10-27 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    AttendanceSession::new(
        SessionConfig::default(),
        Box::new(store),
        Box::new(ManualClock::new(start)),
    )
    .unwrap()
}

#[test]
fn test_recognition_deserialization() {
    let json = r#"{
        "camera_id": "front-door",
        "frame_sequence": 42,
        "timestamp": "2025-10-27T14:30:05Z",
        "faces": [
            {"identity": "alice", "distance": 0.31, "region": {"top": 1, "right": 2, "bottom": 3, "left": 0}},
            {"identity": null},
            {"identity": "Unknown"}
        ]
    }"#;

    let msg: RecognitionMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.camera_id, "front-door");
    assert_eq!(msg.frame_sequence, 42);
    assert_eq!(msg.faces.len(), 3);
    assert_eq!(msg.faces[0].label(), Label::Known(Identity::new("alice").unwrap()));
    assert_eq!(msg.faces[0].distance, Some(0.31));
    assert_eq!(msg.faces[1].label(), Label::Unknown);
    assert_eq!(msg.faces[2].label(), Label::Unknown);
}

#[test]
fn test_marked_message_serialization() {
    let record = AttendanceRecord {
        identity: Identity::new("bob").unwrap(),
        date: "2025-10-27".parse().unwrap(),
        time: "14:30:05".parse().unwrap(),
    };

    let msg = AttendanceMarkedMessage::new("attendance-test", &record);
    let json = serde_json::to_string(&msg).unwrap();

    assert!(json.contains("\"session_id\":\"attendance-test\""));
    assert!(json.contains("\"identity\":\"bob\""));
    assert!(json.contains("\"date\":\"2025-10-27\""));
    assert!(json.contains("\"time\":\"14:30:05\""));
}

#[test]
fn test_apply_recognition_marks_known_faces_once() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session(&temp_dir);

    let json = r#"{
        "camera_id": "lab",
        "frame_sequence": 5,
        "timestamp": "2025-10-27T08:00:00Z",
        "faces": [{"identity": "alice"}, {"identity": null}, {"identity": "alice"}]
    }"#;
    let msg: RecognitionMessage = serde_json::from_str(json).unwrap();

    let first = apply_recognition(&mut session, &msg, None);
    let second = apply_recognition(&mut session, &msg, None);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(session.records_for_today().unwrap().len(), 1);
    assert_eq!(session.stats().unknown_faces, 2);
}

#[test]
fn test_unlabeled_encodings_use_configured_policy() {
    let known = EncodingStore::from_parts(
        vec!["alice".to_string(), "bob".to_string()],
        vec![vec![0.0, 0.5], vec![0.0, 0.1]],
    )
    .unwrap();

    // Both stored vectors are within tolerance; bob is nearer
    let json = r#"{
        "camera_id": "lab",
        "frame_sequence": 10,
        "timestamp": "2025-10-27T08:00:00Z",
        "faces": [{"identity": null, "encoding": [0.0, 0.0]}, {"identity": null}]
    }"#;
    let msg: RecognitionMessage = serde_json::from_str(json).unwrap();

    let closest = FaceResolver::new(known.clone(), FaceMatcher::new(0.6, MatchPolicy::ClosestMatch));
    let dir = TempDir::new().unwrap();
    let mut s = session(&dir);
    let marked = apply_recognition(&mut s, &msg, Some(&closest));
    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].identity.as_str(), "bob");
    assert_eq!(s.stats().unknown_faces, 1);

    let first = FaceResolver::new(known.clone(), FaceMatcher::new(0.6, MatchPolicy::FirstMatch));
    let dir = TempDir::new().unwrap();
    let mut s = session(&dir);
    let marked = apply_recognition(&mut s, &msg, Some(&first));
    assert_eq!(marked[0].identity.as_str(), "alice");

    // Nothing within tolerance stays unknown
    let strict = FaceResolver::new(known, FaceMatcher::new(0.05, MatchPolicy::ClosestMatch));
    let dir = TempDir::new().unwrap();
    let mut s = session(&dir);
    assert!(apply_recognition(&mut s, &msg, Some(&strict)).is_empty());
    assert_eq!(s.stats().unknown_faces, 2);
}
