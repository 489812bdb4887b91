use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::record::AttendanceRecord;
use crate::error::{AttendanceError, Result};

/// Durable, per-day attendance storage
pub trait AttendanceStore: Send + Sync {
    /// Append one record to the sheet for `record.date`, creating it if needed
    ///
    /// Must either write the whole row or fail without leaving a partial one.
    fn append(&mut self, record: &AttendanceRecord) -> Result<()>;

    /// All records stored for `date`. A day with no sheet yields an empty list.
    fn load_day(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// Where records for `date` are written
    fn destination_for(&self, date: NaiveDate) -> PathBuf;

    /// Dates that have a sheet, oldest first
    fn available_days(&self) -> Result<Vec<NaiveDate>>;
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one CSV file per day
    pub records_dir: PathBuf,
    /// File name prefix (files are `<prefix>_<YYYY-MM-DD>.csv`)
    pub file_prefix: String,
}

impl StoreConfig {
    pub fn new(records_dir: PathBuf) -> Self {
        Self {
            records_dir,
            file_prefix: "attendance".to_string(),
        }
    }
}

/// One CSV file per day with a `Name,Date,Time` header
pub struct CsvAttendanceStore {
    config: StoreConfig,
}

impl CsvAttendanceStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.records_dir).map_err(|source| AttendanceError::StorageWrite {
            path: config.records_dir.clone(),
            source,
        })?;

        info!(
            "Attendance store initialized: {} (prefix: {})",
            config.records_dir.display(),
            config.file_prefix
        );

        Ok(Self { config })
    }

    fn parse_day(&self, file_name: &str) -> Option<NaiveDate> {
        let stem = file_name.strip_suffix(".csv")?;
        let date = stem.strip_prefix(&self.config.file_prefix)?.strip_prefix('_')?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    /// Serialize a row (and header if requested) into memory first so the
    /// file only ever sees one complete write.
    fn encode_row(record: &AttendanceRecord, with_header: bool) -> io::Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(with_header)
            .from_writer(Vec::new());

        writer.serialize(record).map_err(csv_to_io)?;
        writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

impl AttendanceStore for CsvAttendanceStore {
    fn append(&mut self, record: &AttendanceRecord) -> Result<()> {
        let path = self.destination_for(record.date);
        let write_err = |source: io::Error| AttendanceError::StorageWrite {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(write_err)?;

        // A row cut short by a crash is never acknowledged; drop it so the
        // next row starts on its own line.
        let len = file.metadata().map_err(write_err)?.len();
        let clean_len = complete_rows_len(&mut file).map_err(write_err)?;
        if clean_len < len {
            warn!(
                "Dropping {} bytes of torn row at end of {}",
                len - clean_len,
                path.display()
            );
            file.set_len(clean_len).map_err(write_err)?;
        }

        let row = Self::encode_row(record, clean_len == 0).map_err(write_err)?;

        if let Err(e) = file.write_all(&row).and_then(|_| file.sync_data()) {
            if let Err(rollback) = file.set_len(clean_len) {
                warn!("Failed to roll back {}: {}", path.display(), rollback);
            }
            return Err(write_err(e));
        }

        debug!(
            "Appended {} at {} to {}",
            record.identity,
            record.time,
            path.display()
        );

        Ok(())
    }

    fn load_day(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let path = self.destination_for(date);
        let read_err = |source: io::Error| AttendanceError::StorageRead {
            path: path.clone(),
            source,
        };

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e)),
        };

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(read_err)?;
        let complete = complete_len(&contents);
        if complete < contents.len() {
            warn!("Ignoring torn row at end of {}", path.display());
        }

        csv::Reader::from_reader(&contents[..complete])
            .deserialize::<AttendanceRecord>()
            .map(|row| row.map_err(|e| read_err(csv_to_io(e))))
            .collect()
    }

    fn destination_for(&self, date: NaiveDate) -> PathBuf {
        self.config.records_dir.join(format!(
            "{}_{}.csv",
            self.config.file_prefix,
            date.format("%Y-%m-%d")
        ))
    }

    fn available_days(&self) -> Result<Vec<NaiveDate>> {
        let entries =
            fs::read_dir(&self.config.records_dir).map_err(|source| AttendanceError::StorageRead {
                path: self.config.records_dir.clone(),
                source,
            })?;

        let mut days: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.parse_day(&entry.file_name().to_string_lossy()))
            .collect();
        days.sort();

        Ok(days)
    }
}

/// Length of the newline-terminated prefix of a sheet
fn complete_len(contents: &[u8]) -> usize {
    contents
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

fn complete_rows_len(file: &mut File) -> io::Result<u64> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut contents)?;
    Ok(complete_len(&contents) as u64)
}

fn csv_to_io(err: csv::Error) -> io::Error {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", other)),
    }
}
