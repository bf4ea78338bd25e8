// src/error.rs
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a media-control backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    #[error("no active playback device")]
    NoActiveDevice,
    #[error("media command timed out after {0:?}")]
    Timeout(Duration),
    #[error("previous media command still in flight")]
    Busy,
    #[error("media backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("landmark source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed landmark record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
