use crate::pipeline::tag::ArtifactKind;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of the file lifecycle an I/O failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    Read,
    Write,
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoPhase::Read => f.write_str("read"),
            IoPhase::Write => f.write_str("write"),
        }
    }
}

/// Why a time-lock envelope refused to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockRejection {
    /// The embedded unlock instant is still in the future
    StillLocked { unlock_at: DateTime<Utc> },
    /// The buffer is not a recognizable envelope
    Malformed(String),
}

impl fmt::Display for LockRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockRejection::StillLocked { unlock_at } => {
                write!(f, "locked until {}", unlock_at.to_rfc3339())
            }
            LockRejection::Malformed(reason) => write!(f, "malformed envelope: {}", reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChronosealError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Time lock is enabled but no unlock instant was given")]
    MissingUnlockInstant,

    #[error("Failed to {phase} {}: {source}", path.display())]
    IoFailure {
        phase: IoPhase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid protection strength: {0}. Must be between 1 and 6")]
    InvalidStrength(u8),

    #[error("Corrupted payload: {0}")]
    CorruptedPayload(String),

    #[error("Detected errors in {chunks} codewords; unlock with error correction to repair them")]
    UncorrectedErrors { chunks: usize },

    #[error("Compression error: {0}")]
    CompressionFailure(String),

    #[error("Decompression error: {0}")]
    DecompressionFailure(String),

    #[error("Time lock rejected the file: {0}")]
    LockedOrMalformed(LockRejection),

    #[error("Artifact holds {found} data but this mode expects {expected} data")]
    ModeMismatch {
        expected: ArtifactKind,
        found: ArtifactKind,
    },
}

impl ChronosealError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ChronosealError::LockedOrMalformed(LockRejection::Malformed(reason.into()))
    }
}

pub type Result<T> = std::result::Result<T, ChronosealError>;
