//! Custom error types for fgtrim operations.

use std::io;
use thiserror::Error;

/// Result type alias for fgtrim operations
pub type Result<T> = std::result::Result<T, FgtrimError>;

/// Error type for fgtrim operations
#[derive(Error, Debug)]
pub enum FgtrimError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "BED")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A primer file was given but contained no primers
    #[error("No primers found in '{path}'")]
    NoPrimers {
        /// Path to the primer file
        path: String,
    },

    /// Reading or writing a record failed
    #[error("I/O error at record {index}: {source}")]
    RecordIo {
        /// 0-based index of the record in the input stream
        index: u64,
        /// The underlying error
        #[source]
        source: io::Error,
    },
}
