//! Top-level error types for the command line tool.
//!
//! Engine failures arrive as [`crate::bundler::Error`] and are wrapped in
//! [`BundlerError::Bundler`]; argument and profile problems are reported
//! through [`CliError`] and [`BundlerError::Toml`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Packaging engine errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A packaging profile could not be read
    #[error("Cannot read packaging profile {}: {reason}", path.display())]
    Profile {
        /// Profile path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_message() {
        let err: BundlerError = crate::bundler::Error::BundleRootNotSet.into();
        assert_eq!(err.to_string(), crate::bundler::Error::BundleRootNotSet.to_string());
    }
}
