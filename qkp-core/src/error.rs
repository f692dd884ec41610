//! Error types for instance conversion.

use thiserror::Error;

use crate::key::BenchmarkKey;

/// Errors that can occur while building canonical instances.
#[derive(Error, Debug)]
pub enum QkpError {
    /// Raw input does not match the expected structural shape
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// Scraped table header or row shape differs from the fixed schema
    #[error("Table structure error: {0}")]
    TableStructure(String),

    /// No reference objective exists for a constructed instance
    #[error("No reference objective for {0}")]
    MissingReference(BenchmarkKey),

    /// External fetch failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Instance violates a data-model invariant
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QkpError {
    /// Format error at a 1-based line number.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        QkpError::Format {
            line,
            message: message.into(),
        }
    }

    /// True for errors that invalidate a whole document rather than one instance.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, QkpError::TableStructure(_))
    }
}

/// Result type for conversion operations.
pub type QkpResult<T> = Result<T, QkpError>;
