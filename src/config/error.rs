use std::path::PathBuf;
use thiserror::Error;

use crate::core::ParseError;

/// Errors that can occur while reading or updating settings files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings directory does not exist.
    #[error("Settings directory not found: {0}")]
    NotFound(PathBuf),
    /// Settings path exists but is not a directory.
    #[error("Settings path is not a directory: {0}")]
    NotADirectory(PathBuf),
    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),
    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// A target file could not be parsed; nothing was written.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    /// A game file that is never created by the installer is missing.
    #[error("Game file not found: {0}")]
    MissingFile(PathBuf),
    /// The mod changes menu files but no menu directory was given.
    #[error("The mod changes menu files ({0}) but no menu directory is set")]
    MenuDirNotSet(&'static str),
    /// Unknown game version name.
    #[error("Unknown game version '{0}' (expected 'classic' or 'ng')")]
    UnknownGameVersion(String),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
