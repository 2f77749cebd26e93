//! Error types for request validation, planning and batch execution.

use std::path::PathBuf;
use thiserror::Error;

use super::codec::StreamKind;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(
        "{stream} codec '{codec}' is not supported by the {container} container (allowed: {})",
        .allowed.join(", ")
    )]
    UnsupportedCodec {
        container: String,
        stream: StreamKind,
        codec: String,
        allowed: Vec<String>,
    },

    #[error("unsupported output format '{format}' (supported: {})", .supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },

    #[error("invalid filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("invalid value for {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("output file already exists: {} (pass --overwrite to replace it)", .path.display())]
    OutputExists { path: PathBuf },

    #[error("input and output are the same file: {}", .path.display())]
    SameInputOutput { path: PathBuf },

    #[error("failed to start {program}: {source}. Is ffmpeg installed and in PATH?")]
    EngineSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg failed on {} (pass {pass}, {status}):\n{stderr}", .path.display())]
    EngineFailed {
        path: PathBuf,
        pass: usize,
        status: String,
        stderr: String,
    },

    #[error("cannot resolve target size for {}: {reason}", .path.display())]
    TargetSizeUnresolvable { path: PathBuf, reason: String },

    #[error(
        "target size too small for {}: increase target size to at least {minimum_mb:.2}M",
        .path.display()
    )]
    TargetSizeTooSmall { path: PathBuf, minimum_mb: f64 },

    #[error("{failed} of {total} files failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("batch cancelled")]
    Cancelled,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_filter(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            filter: filter.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
