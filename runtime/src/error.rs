// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for acquisition, extraction and persistence.
//!
//! Every per-document failure carries an [`ErrorKind`] so it can be tallied
//! and written to the failure ledger. Only [`AcquireError::BackendUnavailable`]
//! is fatal to a batch run; everything else is recovered at the orchestrator
//! or runner boundary.

use serde::{Deserialize, Serialize};

/// All errors produced by the engine.
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    /// A registry row is missing a required field.
    #[error("invalid record at row {row}: missing {field}")]
    RecordInvalid { row: usize, field: &'static str },

    /// The target could not be reached or navigation timed out.
    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// No candidate region passed acceptance.
    #[error("content not found: {0}")]
    ContentNotFound(String),

    /// The rendering session died underneath us.
    #[error("session crashed: {0}")]
    SessionCrash(String),

    /// Best-effort sidecar fetch failed.
    #[error("sidecar download failed for {url}: {reason}")]
    SidecarDownload { url: String, reason: String },

    /// No rendering session can be constructed at all.
    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AcquireError {
    /// Classify this error for ledgers and tallies.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::RecordInvalid { .. } => ErrorKind::RecordInvalid,
            AcquireError::Navigation { .. } => ErrorKind::Navigation,
            AcquireError::ContentNotFound(_) => ErrorKind::ContentNotFound,
            AcquireError::SessionCrash(_) => ErrorKind::SessionCrash,
            AcquireError::SidecarDownload { .. } => ErrorKind::SidecarDownload,
            AcquireError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            AcquireError::Io(_) | AcquireError::Json(_) | AcquireError::Csv(_) => ErrorKind::Io,
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AcquireError::BackendUnavailable(_))
    }

    pub(crate) fn navigation(url: &str, reason: impl std::fmt::Display) -> Self {
        AcquireError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Serializable classification of an [`AcquireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RecordInvalid,
    Navigation,
    ContentNotFound,
    SessionCrash,
    SidecarDownload,
    BackendUnavailable,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordInvalid => "record_invalid",
            Self::Navigation => "navigation",
            Self::ContentNotFound => "content_not_found",
            Self::SessionCrash => "session_crash",
            Self::SidecarDownload => "sidecar_download",
            Self::BackendUnavailable => "backend_unavailable",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type AcquireResult<T> = Result<T, AcquireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = AcquireError::navigation("https://example.com", "timed out");
        assert_eq!(err.kind(), ErrorKind::Navigation);
        assert!(!err.is_fatal());
        assert!(AcquireError::BackendUnavailable("no chrome".into()).is_fatal());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ContentNotFound).unwrap();
        assert_eq!(json, "\"content_not_found\"");
        assert_eq!(ErrorKind::SessionCrash.to_string(), "session_crash");
    }
}
