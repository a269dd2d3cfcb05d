use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal or config file handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory listing that could not be read, tagged with its path.
    /// Recoverable: the owning node is marked failed and can be retried.
    #[error("cannot list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filter name pattern that does not compile.
    #[error("invalid name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}
