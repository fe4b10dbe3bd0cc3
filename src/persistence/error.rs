use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by [`super::LayoutPersistenceManager`].
///
/// None of these leave the docking state partially mutated: persistence writes and validates
/// before it touches memory.
#[derive(Debug, Error)]
pub enum LayoutPersistenceError {
    #[error("layout not found: {id}")]
    NotFound { id: Uuid },

    #[error("unsupported layout snapshot version: {found} (supported up to {supported})")]
    VersionMismatch { found: u32, supported: u32 },

    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout snapshot: {reason}")]
    Validation { reason: String },
}

impl LayoutPersistenceError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LayoutPersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("json: {err}"))
    }
}

impl From<ron::Error> for LayoutPersistenceError {
    fn from(err: ron::Error) -> Self {
        Self::validation(format!("ron: {err}"))
    }
}

impl From<ron::error::SpannedError> for LayoutPersistenceError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::validation(format!("ron: {err}"))
    }
}

pub type LayoutResult<T> = Result<T, LayoutPersistenceError>;
