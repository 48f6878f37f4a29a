use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Failed to read roster {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("Failed to write roster {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("Malformed roster: {0}")]
    Csv(#[from] csv::Error),

    #[error("Roster is missing required column: {0}")]
    MissingColumn(String),

    #[error("Expected {expected} file paths, got {actual}")]
    PathCountMismatch { expected: usize, actual: usize },
}
