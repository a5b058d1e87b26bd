//! Error taxonomy for the harvest pipeline, grounded on the SIEM
//! platform's `SiemError` shape (binder/config/parse dispositions kept
//! distinct so the boundary layer can decide what is fatal).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Caller supplied an unrecognized format token, or omitted a required
    /// argument. Always raised immediately (spec.md §7).
    #[error("invalid format '{requested}', expected one of: {legal}")]
    UnknownFormat { requested: String, legal: String },

    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// The requested path does not exist and is not literal content, or a
    /// ZIP entry listing failed.
    #[error("failed to read source '{source_id}': {message}")]
    Io {
        source_id: String,
        message: String,
    },

    /// A JSON-root parser confirmed the format via `can_parse` but the
    /// root shape was structurally invalid, and the caller asked for the
    /// format explicitly with `ignore_errors=false`.
    #[error("parse error in format '{format}' for source '{source_id}': {message}")]
    Structural {
        source_id: String,
        format: String,
        message: String,
    },

    #[error("zip archive error: {0}")]
    Zip(String),
}

impl HarvestError {
    pub fn io(source_id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            source_id: source_id.into(),
            message: err.to_string(),
        }
    }
}
