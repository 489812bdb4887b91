use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::frame::Frame;
use super::recognizer::{Detection, Recognizer};
use super::source::FrameSource;
use crate::attendance::{AttendanceRecord, AttendanceSession, MarkOutcome};
use crate::error::{AttendanceError, Result};

/// Configuration for the live recognition loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Run the recognizer on every Nth frame only (1 = every frame)
    pub frame_skip: u32,
    /// How long to wait for a frame before declaring the camera gone
    pub camera_read_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_skip: 5,
            camera_read_timeout: Duration::from_secs(5),
        }
    }
}

/// What one run of the loop did
#[derive(Debug, Clone, Default)]
pub struct LoopSummary {
    pub frames_read: u64,
    pub frames_recognized: u64,
    pub faces_seen: u64,
    /// Records written during this run, in order
    pub marked: Vec<AttendanceRecord>,
    /// Marks whose row could not be written (left for retry)
    pub storage_failures: u64,
    /// Marks that failed for any other reason, such as reading a new day's sheet
    pub session_errors: u64,
}

/// Asks a running loop to stop after the frame in hand
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Pulls frames from a camera, throttles recognition and feeds the session
pub struct RecognitionLoop<R> {
    config: LoopConfig,
    recognizer: R,
    stop_tx: Arc<watch::Sender<bool>>,
    frame_count: u64,
}

impl<R: Recognizer> RecognitionLoop<R> {
    pub fn new(config: LoopConfig, recognizer: R) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            recognizer,
            stop_tx: Arc::new(stop_tx),
            frame_count: 0,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Capture until stopped, the stream ends, or the camera goes quiet
    ///
    /// The source is stopped on every exit path, including errors. A stop
    /// requested before `run` is honored; the flag is cleared once the loop ends.
    pub async fn run(
        &mut self,
        source: &mut dyn FrameSource,
        session: &mut AttendanceSession,
    ) -> Result<LoopSummary> {
        info!("Starting recognition loop on {}", source.name());

        self.frame_count = 0;

        let mut frames = match source.start().await {
            Ok(frames) => frames,
            Err(e) => {
                if let Err(stop_err) = source.stop().await {
                    warn!("Failed to release {}: {}", source.name(), stop_err);
                }
                self.stop_tx.send_replace(false);
                return Err(AttendanceError::CameraUnavailable(format!(
                    "{}: {:#}",
                    source.name(),
                    e
                )));
            }
        };

        let result = self.pump(&mut frames, session).await;

        if let Err(e) = source.stop().await {
            error!("Failed to release {}: {}", source.name(), e);
        }
        self.stop_tx.send_replace(false);

        match &result {
            Ok(summary) => info!(
                "Recognition loop stopped: {} frames, {} recognized, {} marked",
                summary.frames_read,
                summary.frames_recognized,
                summary.marked.len()
            ),
            Err(e) => error!("Recognition loop failed: {}", e),
        }

        result
    }

    async fn pump(
        &mut self,
        frames: &mut mpsc::Receiver<Frame>,
        session: &mut AttendanceSession,
    ) -> Result<LoopSummary> {
        let mut summary = LoopSummary::default();
        let mut stop_rx = self.stop_tx.subscribe();
        let read_timeout = self.config.camera_read_timeout;

        loop {
            if *stop_rx.borrow_and_update() {
                info!("Stop requested");
                break;
            }

            let next = tokio::select! {
                _ = stop_rx.changed() => continue,
                next = timeout(read_timeout, frames.recv()) => next,
            };

            match next {
                Ok(Some(frame)) => self.process(frame, session, &mut summary),
                Ok(None) => {
                    info!("Camera stream closed");
                    break;
                }
                Err(_) => {
                    return Err(AttendanceError::CameraUnavailable(format!(
                        "no frame within {:?}",
                        read_timeout
                    )));
                }
            }
        }

        Ok(summary)
    }

    /// Run the recognizer off the async worker when other tasks can take over
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let multi_thread = Handle::try_current()
            .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
            .unwrap_or(false);

        if multi_thread {
            tokio::task::block_in_place(|| self.recognizer.recognize(frame))
        } else {
            self.recognizer.recognize(frame)
        }
    }

    fn process(&mut self, frame: Frame, session: &mut AttendanceSession, summary: &mut LoopSummary) {
        summary.frames_read += 1;
        self.frame_count += 1;

        let skip = u64::from(self.config.frame_skip.max(1));
        if self.frame_count % skip != 0 {
            return;
        }
        summary.frames_recognized += 1;

        let detections = match self.recognize(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Recognizer failed on frame {}: {}", frame.sequence, e);
                return;
            }
        };

        for detection in detections {
            summary.faces_seen += 1;
            debug!("Frame {}: {} at {:?}", frame.sequence, detection.label, detection.region);

            match session.on_label(&detection.label) {
                Ok(MarkOutcome::Marked(record)) => summary.marked.push(record),
                Ok(_) => {}
                Err(e @ AttendanceError::StorageWrite { .. }) => {
                    summary.storage_failures += 1;
                    error!("Failed to record {}, will retry on next sighting: {}", detection.label, e);
                }
                Err(e) => {
                    summary.session_errors += 1;
                    error!("Failed to mark {}: {}", detection.label, e);
                }
            }
        }
    }
}
