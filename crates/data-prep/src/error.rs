//! Error types for the data-prep crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the raw rating and movie tables.
///
/// Row-level problems (a malformed line, an unknown genre, a rating that
/// does not parse) are deliberately *not* represented here: the pipeline
/// recovers from those locally by skipping the row with a warning. Only
/// file-level failures abort a load.
#[derive(Error, Debug)]
pub enum DataError {
    /// I/O error occurred while reading a file
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file outright
    #[error("CSV error reading {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file existed but produced no usable rows
    #[error("No parseable rows in {path}")]
    NoRows { path: PathBuf },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataError>;
