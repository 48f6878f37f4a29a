use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Roster has {rows} rows but the PDF has {pages} pages")]
    CountMismatch { rows: usize, pages: usize },

    #[error("Roster error: {0}")]
    Roster(#[from] shared_roster::RosterError),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SplitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.into(),
            source,
        }
    }
}
