//! Attendance bookkeeping
//!
//! This module provides the `AttendanceSession` that:
//! - Keeps the set of identities already marked for the current day
//! - Appends each first-time recognition to that day's sheet
//! - Rolls over to a new sheet when the date changes
//! - Notifies observers of every new record

mod clock;
mod config;
mod observer;
mod record;
mod session;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use observer::{AttendanceObserver, ChannelObserver, LoggingObserver};
pub use record::{AttendanceRecord, Identity, Label, UNKNOWN_LABEL};
pub use session::{AttendanceSession, MarkOutcome};
pub use stats::SessionStats;
pub use store::{AttendanceStore, CsvAttendanceStore, StoreConfig};
