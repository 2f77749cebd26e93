//! Output format to processing backend.
//!
//! Every media container is handled by ffmpeg. The lookup happens once per
//! batch, before any file is touched.

use std::fmt;

use tracing::debug;

use super::container::ContainerFormat;
use super::error::{ConvertError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendTag {
    Ffmpeg,
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffmpeg => f.write_str("ffmpeg"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTarget {
    pub tag: BackendTag,
    pub container: ContainerFormat,
}

/// Resolve the backend for an output format name or extension
pub fn resolve_backend(format: &str) -> Result<BackendTarget> {
    let container = ContainerFormat::from_extension(format.trim())?;
    let target = BackendTarget {
        tag: BackendTag::Ffmpeg,
        container,
    };
    debug!(format, backend = %target.tag, container = %container, "backend resolved");
    Ok(target)
}

/// Output formats with a backend, in listing order
pub fn supported_formats() -> Vec<ContainerFormat> {
    ContainerFormat::ALL
        .into_iter()
        .filter(|f| *f != ContainerFormat::Null)
        .collect()
}
