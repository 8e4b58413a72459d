//! Error kinds shared by the pipeline crates.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Category;

/// A body line could not be turned into fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("body has {line_count} lines, expected data on row {row}")]
    MissingRow { row: usize, line_count: usize },

    #[error("row {row} does not match pattern `{pattern}`: {line:?}")]
    NoMatch {
        row: usize,
        pattern: &'static str,
        line: String,
    },
}

/// A record could not be built from extracted fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{}: cannot extract {category} fields: {source}", file.display())]
    Extraction {
        file: PathBuf,
        category: Category,
        #[source]
        source: ExtractError,
    },

    #[error("{}: invalid {category} record: {source}", file.display())]
    Validation {
        file: PathBuf,
        category: Category,
        #[source]
        source: ValidationError,
    },

    #[error("{}: cannot decode message: {reason}", file.display())]
    Decode { file: PathBuf, reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Only configuration problems stop a run; everything else is per-file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// The file a per-file error refers to.
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            Error::Configuration(_) => None,
            Error::Extraction { file, .. }
            | Error::Validation { file, .. }
            | Error::Decode { file, .. } => Some(file.as_path()),
            Error::Io { path, .. } => Some(path.as_path()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
