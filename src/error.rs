//! Error types for the fallible edges of the crate: parsing text boards and loading
//! difficulty configuration files. Gameplay itself never returns errors.
use std::path::PathBuf;
use thiserror::Error;

/// Failure to parse a text board with `utils::board_from_str_array`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardParseError {
    #[error("Invalid number of rows. Expected {expected}, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("Row {row} has {found} cells (expected {expected})")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unrecognized token '{token}' in row {row} col {col}")]
    BadToken {
        token: String,
        row: usize,
        col: usize,
    },

    #[error("Base type {base} in row {row} col {col} is outside [0, {type_count})")]
    BaseOutOfRange {
        base: u8,
        type_count: u8,
        row: usize,
        col: usize,
    },
}

/// Failure to load or validate a `DifficultyConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}
