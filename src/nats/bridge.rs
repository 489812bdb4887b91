use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::client::NatsClient;
use super::messages::{RecognitionMessage, RecognizedFace};
use crate::attendance::{AttendanceRecord, AttendanceSession, Label, MarkOutcome};
use crate::recognition::{EncodingStore, FaceMatcher};

/// Labels faces that arrive with an encoding but no identity
pub struct FaceResolver {
    store: EncodingStore,
    matcher: FaceMatcher,
}

impl FaceResolver {
    pub fn new(store: EncodingStore, matcher: FaceMatcher) -> Self {
        Self { store, matcher }
    }

    /// A reported identity wins; otherwise the encoding is matched locally
    pub fn label(&self, face: &RecognizedFace) -> Label {
        match (&face.identity, &face.encoding) {
            (None, Some(encoding)) => self.matcher.identify(&self.store, encoding).label,
            _ => face.label(),
        }
    }
}

/// Feed every face in a recognition message to the session
///
/// Returns the records written. Storage failures are logged and left for the
/// next sighting to retry.
pub fn apply_recognition(
    session: &mut AttendanceSession,
    message: &RecognitionMessage,
    resolver: Option<&FaceResolver>,
) -> Vec<AttendanceRecord> {
    let mut marked = Vec::new();

    for face in &message.faces {
        let label = match resolver {
            Some(resolver) => resolver.label(face),
            None => face.label(),
        };
        match session.on_label(&label) {
            Ok(MarkOutcome::Marked(record)) => marked.push(record),
            Ok(_) => {}
            Err(e) => error!(
                "Failed to mark {} from camera {} frame {}: {}",
                label, message.camera_id, message.frame_sequence, e
            ),
        }
    }

    marked
}

/// Consume recognition events from NATS until the subscription ends
pub fn spawn_recognition_listener(
    mut subscriber: async_nats::Subscriber,
    session: Arc<Mutex<AttendanceSession>>,
    resolver: Option<Arc<FaceResolver>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Recognition listener started");

        while let Some(msg) = subscriber.next().await {
            match serde_json::from_slice::<RecognitionMessage>(&msg.payload) {
                Ok(recognition) => {
                    let mut session = session.lock().await;
                    apply_recognition(&mut session, &recognition, resolver.as_deref());
                }
                Err(e) => {
                    warn!("Failed to parse recognition message on {}: {}", msg.subject, e);
                }
            }
        }

        info!("Recognition listener stopped");
    })
}

/// Publish every new record from a `ChannelObserver` to NATS
pub fn spawn_marked_publisher(
    client: Arc<NatsClient>,
    subject: String,
    mut records: mpsc::UnboundedReceiver<AttendanceRecord>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            if let Err(e) = client.publish_marked(&subject, &record).await {
                error!("Failed to publish attendance for {}: {}", record.identity, e);
            }
        }

        info!("Attendance publisher stopped");
    })
}
