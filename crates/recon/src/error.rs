use std::fmt;

use chrono::NaiveDate;

#[derive(Debug)]
pub enum LedgerError {
    /// TOML parse / deserialization error in engine settings.
    ConfigParse(String),
    /// Settings validation error (threshold ordering, zero windows, etc.).
    ConfigValidation(String),
    /// Dataset file could not be deserialized.
    DatasetParse(String),
    /// Snapshots must be strictly ascending by period end.
    SnapshotOrder { previous: NaiveDate, next: NaiveDate },
    /// Two snapshots share a period end.
    DuplicateSnapshot(NaiveDate),
    /// Events must be non-decreasing by date.
    EventOrder { index: usize, previous: NaiveDate, next: NaiveDate },
    /// Split ratio is not of the form `new:old` with positive integers.
    InvalidSplitRatio(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::DatasetParse(msg) => write!(f, "dataset parse error: {msg}"),
            Self::SnapshotOrder { previous, next } => {
                write!(f, "snapshot {next} is not after preceding snapshot {previous}")
            }
            Self::DuplicateSnapshot(date) => write!(f, "duplicate snapshot for period {date}"),
            Self::EventOrder { index, previous, next } => {
                write!(f, "event #{index} dated {next} precedes prior event dated {previous}")
            }
            Self::InvalidSplitRatio(raw) => {
                write!(f, "invalid split ratio '{raw}' (expected 'new:old', e.g. '10:1')")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
