//! Packager for staged Fiji/ImageJ application bundles
//!
//! This library turns a staged application directory into one distributable
//! archive:
//! - `.zip`
//! - `.tar`, `.tar.gz` / `.tgz`
//! - `.tar.bz2` / `.tbz` (through an external `bzip2`)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
