use crate::error::{AttendanceError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label reserved for faces that match nobody in the encoding store
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Name of a known person, as produced by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_LABEL) {
            return Err(AttendanceError::InvalidIdentity(name));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = AttendanceError;

    fn try_from(value: String) -> Result<Self> {
        Identity::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// Outcome of matching one detected face
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Known(Identity),
    Unknown,
}

impl Label {
    /// Map an optional recognizer name to a label. Missing, empty and
    /// "Unknown" names all become `Label::Unknown`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(Identity::new) {
            Some(Ok(identity)) => Label::Known(identity),
            _ => Label::Unknown,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Label::Known(identity) => Some(identity),
            Label::Unknown => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Known(identity) => identity.fmt(f),
            Label::Unknown => f.write_str(UNKNOWN_LABEL),
        }
    }
}

/// One row of a day's attendance sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Name")]
    pub identity: Identity,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    /// Whole seconds only
    #[serde(rename = "Time")]
    pub time: NaiveTime,
}

impl AttendanceRecord {
    pub fn new(identity: Identity, at: NaiveDateTime) -> Self {
        let time = at.time().with_nanosecond(0).unwrap_or_else(|| at.time());

        Self {
            identity,
            date: at.date(),
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejects_blank_and_reserved_names() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("   ").is_err());
        assert!(Identity::new("Unknown").is_err());
        assert!(Identity::new("unknown").is_err());
        assert_eq!(Identity::new(" alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn label_from_name() {
        assert_eq!(Label::from_name(None), Label::Unknown);
        assert_eq!(Label::from_name(Some("Unknown")), Label::Unknown);
        assert_eq!(
            Label::from_name(Some("bob")),
            Label::Known(Identity::new("bob").unwrap())
        );
    }

    #[test]
    fn record_drops_sub_second_precision() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_milli_opt(9, 26, 53, 589)
            .unwrap();
        let record = AttendanceRecord::new(Identity::new("alice").unwrap(), at);

        assert_eq!(record.date.to_string(), "2025-03-14");
        assert_eq!(record.time.to_string(), "09:26:53");
    }
}
