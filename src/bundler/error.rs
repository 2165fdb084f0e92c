//! Error types for the packaging engine.
//!
//! Every fatal condition of a packaging run surfaces as an [`Error`] and is
//! propagated up to the CLI layer, which alone decides how to report it.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the packaging engine.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// No bundle root was configured.
    #[error("bundle root is not set (use --bundle-root or IJ_DIR)")]
    BundleRootNotSet,

    /// The configured bundle root does not exist.
    #[error("bundle root {0} does not exist")]
    BundleRootMissing(PathBuf),

    /// The output path does not end in a known archive extension.
    #[error("unsupported archive format: {0}")]
    UnsupportedArchiveFormat(PathBuf),

    /// An optional compression codec could not be located.
    #[error("{codec} codec unavailable: {reason}")]
    CodecUnavailable {
        /// Codec name (e.g. `bzip2`).
        codec: &'static str,
        /// Why the lookup failed.
        reason: String,
    },

    /// A runtime was requested for a platform but none was found.
    #[error("no JRE found for platform '{platform}'")]
    MissingRuntime {
        /// The requested platform identifier.
        platform: String,
    },

    /// The conventional runtime root is missing or empty.
    #[error("no JREs found in {0}")]
    NoRuntimes(PathBuf),

    /// A relative path was absolute or contained `..`.
    #[error("invalid bundle entry path: {0}")]
    InvalidEntryPath(String),

    /// A file name below the bundle root is not valid UTF-8.
    #[error("file name is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// An archive operation was called out of order.
    #[error("archive entry state error: {0}")]
    EntryState(String),

    /// I/O failure with an operation description and the path involved.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: io::Error,
    },

    /// Plain I/O failure.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// ZIP encoder failure.
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Directory traversal failure.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Registry database parse failure.
    #[error("registry database: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Path prefix stripping failure.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Whether this error is the per-file "path too long" condition.
    ///
    /// Such errors drop the single offending file from the archive instead of
    /// aborting the run.
    pub fn is_path_too_long(&self) -> bool {
        match self {
            Error::IoError(e) | Error::Fs { error: e, .. } => io_path_too_long(e),
            Error::ZipError(zip::result::ZipError::Io(e)) => io_path_too_long(e),
            _ => false,
        }
    }
}

fn io_path_too_long(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(libc_enametoolong()) {
            return true;
        }
    }
    e.kind() == io::ErrorKind::InvalidFilename || message_path_too_long(&e.to_string())
}

fn message_path_too_long(message: &str) -> bool {
    message.starts_with("File name too long")
        || message.contains("name too long")
        || message.contains("path too long")
        || message.contains("is too long")
}

// ENAMETOOLONG on Linux and the BSDs/macOS respectively.
#[cfg(unix)]
fn libc_enametoolong() -> i32 {
    if cfg!(target_os = "linux") { 36 } else { 63 }
}

/// Convenient `.context()` on `Option` and `Result`.
pub trait Context<T> {
    /// Converts the failure case into an [`Error::GenericError`] carrying `msg`.
    fn context<C: Display>(self, msg: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Attaches filesystem context to `io::Result`.
pub trait ErrorExt<T> {
    /// Wraps the error in [`Error::Fs`] with the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Returns early with a formatted [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
