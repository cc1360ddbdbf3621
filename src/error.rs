//! Error types for unrecoverable conditions.
//!
//! Problems local to one construct are reported as
//! [`Diagnostic`](crate::hir::Diagnostic)s instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort a run or a single file.
#[derive(Debug, Error)]
pub enum AutoError {
    /// IO error while reading or writing a file.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Project configuration file could not be parsed.
    #[error("{}: invalid configuration: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Malformed entry in a `-f` file list.
    #[error("{}:{line}: {message}", path.display())]
    FileList {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Invalid argument or option value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AutoError {
    /// Create an IO error tagged with the path involved.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Errors from splicing replacements into a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Two replacements cover overlapping byte ranges.
    #[error("overlapping replacements at {first:?} and {second:?}")]
    Overlap {
        first: (usize, usize),
        second: (usize, usize),
    },

    /// A replacement ends past the end of the buffer or starts after it ends.
    #[error("replacement {start}..{end} out of bounds for buffer of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// A replacement boundary falls inside a multi-byte character.
    #[error("replacement boundary {0} is not a character boundary")]
    NotCharBoundary(usize),
}
