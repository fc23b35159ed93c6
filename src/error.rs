/// Error types for loading the bookings export
use std::path::PathBuf;
use thiserror::Error;

use crate::types::FilterSelection;

/// Fatal startup failure. No session is started when loading fails.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The data file does not exist
    #[error("Bookings file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Reading the file failed
    #[error("Failed to read bookings file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid delimited text
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Required columns are absent after header normalization
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A `Date` cell could not be parsed
    #[error("Unparseable Date '{value}' on line {line}")]
    InvalidDate { line: u64, value: String },

    /// A numeric column holds a non-numeric value
    #[error("Invalid number '{value}' in column {column} on line {line}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// Header only, no bookings to show
    #[error("Bookings file contains no records")]
    NoRecords,
}

/// Type alias for Results using LoadError
pub type Result<T> = std::result::Result<T, LoadError>;

/// Non-fatal: the current selection matched no bookings. Outputs are zero or
/// empty tables; this only carries the note shown next to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyResultWarning {
    pub selection: FilterSelection,
}

/// Serialized as its message text.
impl serde::Serialize for EmptyResultWarning {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "No bookings between {} for vehicle type(s): {}",
            self.selection.date_range, self.selection.vehicles
        )
    }
}
