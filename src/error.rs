//! Error types for the import pipeline.

use thiserror::Error;

/// Errors raised while fetching, transforming or storing source records.
///
/// Per-item errors (`Fetch` on a detail request, `Format`, `Storage` while
/// writing one record) are recovered by the stage runner. Anything that
/// escapes a stage becomes a `StageAbort` and fails the whole run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },

    #[error("Malformed source data: {0}")]
    Format(String),

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to import {stage}: {message}")]
    StageAbort { stage: String, message: String },

    #[error("Import {0} has already finished")]
    RunTerminal(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ImportError {
    pub fn fetch(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ImportError::Fetch {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        ImportError::Format(message.into())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
