use super::clock::Clock;
use super::config::SessionConfig;
use super::observer::AttendanceObserver;
use super::record::{AttendanceRecord, Identity, Label};
use super::stats::SessionStats;
use super::store::AttendanceStore;
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a single recognition did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// First sighting today; the record was written
    Marked(AttendanceRecord),
    /// Already recorded today
    AlreadyMarked,
    /// Face matched nobody; nothing recorded
    Unknown,
}

/// Records each identity at most once per calendar day
///
/// Recognitions arrive one at a time through `on_recognized` / `on_label`.
/// Before every mark the session checks the clock and rolls over to a new
/// day sheet when the date has changed.
pub struct AttendanceSession {
    config: SessionConfig,

    /// Durable per-day sheets
    store: Box<dyn AttendanceStore>,

    clock: Box<dyn Clock>,

    /// Notified after each successful write
    observers: Vec<Box<dyn AttendanceObserver>>,

    /// Day the marked set belongs to
    current_date: NaiveDate,

    /// Identities already persisted for `current_date`
    marked: HashSet<Identity>,

    started_at: DateTime<Utc>,
    records_written: usize,
    duplicates_skipped: usize,
    unknown_faces: usize,
    failed_writes: usize,
}

impl AttendanceSession {
    /// Create a session and load whatever is already recorded for today
    pub fn new(
        config: SessionConfig,
        store: Box<dyn AttendanceStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        info!("Creating attendance session: {}", config.session_id);

        let current_date = clock.now().date();
        let mut session = Self {
            config,
            store,
            clock,
            observers: Vec::new(),
            current_date,
            marked: HashSet::new(),
            started_at: Utc::now(),
            records_written: 0,
            duplicates_skipped: 0,
            unknown_faces: 0,
            failed_writes: 0,
        };
        session.load_marked(current_date)?;

        Ok(session)
    }

    pub fn add_observer(&mut self, observer: Box<dyn AttendanceObserver>) {
        self.observers.push(observer);
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Record `identity` unless it is already marked today
    ///
    /// If the append fails the identity is left unmarked so a later
    /// recognition can retry.
    pub fn on_recognized(&mut self, identity: &Identity) -> Result<MarkOutcome> {
        let now = self.clock.now();
        if now.date() != self.current_date {
            self.switch_day(now.date())?;
        }

        if self.marked.contains(identity) {
            self.duplicates_skipped += 1;
            debug!("{} already marked for {}", identity, self.current_date);
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let record = AttendanceRecord::new(identity.clone(), now);

        if let Err(e) = self.store.append(&record) {
            self.failed_writes += 1;
            warn!("Failed to record attendance for {}: {}", identity, e);
            return Err(e);
        }

        self.marked.insert(identity.clone());
        self.records_written += 1;

        for observer in &self.observers {
            observer.on_marked(&record);
        }

        Ok(MarkOutcome::Marked(record))
    }

    /// Unknown faces are counted and ignored; known ones are marked
    pub fn on_label(&mut self, label: &Label) -> Result<MarkOutcome> {
        match label {
            Label::Known(identity) => self.on_recognized(identity),
            Label::Unknown => {
                self.unknown_faces += 1;
                Ok(MarkOutcome::Unknown)
            }
        }
    }

    /// Point the session at today's sheet and reload its marked set
    pub fn reset_for_new_day(&mut self) -> Result<()> {
        let today = self.clock.now().date();
        self.switch_day(today)
    }

    pub fn is_marked(&self, identity: &Identity) -> bool {
        self.marked.contains(identity)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Where today's records are being written
    pub fn destination(&self) -> PathBuf {
        self.store.destination_for(self.current_date)
    }

    pub fn records_for_today(&self) -> Result<Vec<AttendanceRecord>> {
        self.store.load_day(self.current_date)
    }

    pub fn records_for(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        self.store.load_day(date)
    }

    pub fn available_days(&self) -> Result<Vec<NaiveDate>> {
        self.store.available_days()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.config.session_id.clone(),
            started_at: self.started_at,
            current_date: self.current_date,
            marked_today: self.marked.len(),
            records_written: self.records_written,
            duplicates_skipped: self.duplicates_skipped,
            unknown_faces: self.unknown_faces,
            failed_writes: self.failed_writes,
        }
    }

    fn switch_day(&mut self, date: NaiveDate) -> Result<()> {
        info!(
            "Session {} moving from {} to {}",
            self.config.session_id, self.current_date, date
        );

        self.load_marked(date)
    }

    fn load_marked(&mut self, date: NaiveDate) -> Result<()> {
        let existing = self.store.load_day(date)?;

        self.marked = existing.into_iter().map(|record| record.identity).collect();
        self.current_date = date;

        if !self.marked.is_empty() {
            info!(
                "Loaded {} identities already marked for {}",
                self.marked.len(),
                date
            );
        }

        Ok(())
    }
}
