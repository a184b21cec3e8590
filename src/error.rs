//! Global error handling for flatpack
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for flatpack operations
#[derive(Error, Debug)]
pub enum FlatpackError {
    /// A control-file line could not be turned into a pattern
    #[error("Malformed pattern on line {line} ('{pattern}'): {reason}")]
    MalformedPattern {
        /// 1-based line number in the control file
        line: usize,
        /// Raw line text
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// The given root is not the work tree of a Git repository
    #[error("Not a Git repository: {}", .0.display())]
    NotAGitRepository(PathBuf),

    /// The repository query subsystem failed
    #[error("Git query failed: {0}")]
    GitQuery(#[from] git2::Error),

    /// A file selected for the snapshot could not be read
    #[error("Unreadable file {path}: {source}")]
    UnreadableFile {
        /// Repo-relative path
        path: String,
        /// Underlying read failure
        #[source]
        source: io::Error,
    },

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Specialized Result type for flatpack operations
pub type Result<T> = std::result::Result<T, FlatpackError>;

/// Creates a FlatpackError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::FlatpackError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}
