//! Bank statement ingestion
//!
//! Turns heterogeneous bank exports (delimited text and spreadsheets, Thai and
//! western date conventions, Buddhist-era years, Thai currency strings) into
//! canonical [`BankTransaction`](crate::types::BankTransaction) records.

pub mod formats;
pub mod normalize;
pub mod parser;

pub use formats::*;
pub use normalize::*;
pub use parser::*;

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::types::BankTransaction;

/// Errors that stop one statement file from being read at all
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Unknown bank format: {0}")]
    UnknownFormat(String),
    #[error("Invalid bank format: {0}")]
    InvalidFormat(String),
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Spreadsheet has no worksheets")]
    EmptyWorkbook,
    #[error("File is not valid UTF-8; undecodable characters were replaced (re-export TIS-620 or Windows-874 files as UTF-8)")]
    NotUtf8,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable problem with a single statement row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based line (or sheet row) number
    pub line: usize,
    pub message: String,
}

impl RowError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.line, self.message)
    }
}

/// Raw uploaded statement
#[derive(Debug, Clone)]
pub struct StatementFile {
    /// Original file name; its extension selects the decoder
    pub name: String,
    pub bytes: Vec<u8>,
}

impl StatementFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a statement from disk (blocking)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StatementError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Lower-cased file extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Outcome of parsing one statement file
#[derive(Debug, Clone, Serialize)]
pub struct ParsedStatement {
    pub transactions: Vec<BankTransaction>,
    /// Layout the file was read with
    pub format: BankFormat,
    /// Human-readable problems; empty only when transactions were found
    pub errors: Vec<String>,
}

impl ParsedStatement {
    pub fn is_success(&self) -> bool {
        !self.transactions.is_empty()
    }
}
