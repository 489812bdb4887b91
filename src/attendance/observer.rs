use tokio::sync::mpsc;
use tracing::{info, warn};

use super::record::AttendanceRecord;

/// Notified after a record has been durably written
pub trait AttendanceObserver: Send + Sync {
    fn on_marked(&self, record: &AttendanceRecord);
}

/// Logs every new record
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl AttendanceObserver for LoggingObserver {
    fn on_marked(&self, record: &AttendanceRecord) {
        info!(
            "Attendance marked: {} on {} at {}",
            record.identity, record.date, record.time
        );
    }
}

/// Forwards records into a channel for async consumers (NATS publisher, UI)
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<AttendanceRecord>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AttendanceRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AttendanceObserver for ChannelObserver {
    fn on_marked(&self, record: &AttendanceRecord) {
        if let Err(e) = self.tx.send(record.clone()) {
            warn!("Attendance channel closed, dropping {}: {}", record.identity, e);
        }
    }
}
