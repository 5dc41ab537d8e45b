//! Error types for WTF discovery and overwrite operations.
//!
//! Enumeration never surfaces these to its caller (failures collapse into an
//! empty character list), while the overwrite engine propagates them as-is.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (listing, stat, read, write, directory creation).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No World of Warcraft installation root has been configured.
    #[error("World of Warcraft directory is not configured")]
    RootNotConfigured,

    /// The configured installation root does not exist on disk.
    #[error("World of Warcraft directory not found: {0}")]
    RootNotFound(Utf8PathBuf),

    /// A directory entry name could not be represented as UTF-8.
    #[error("Non UTF-8 path: {0}")]
    NonUtf8Path(String),

    /// A SavedVariables file could not be parsed.
    #[error("Malformed SavedVariables file {path}: {message}")]
    SavedVariables { path: Utf8PathBuf, message: String },
}
