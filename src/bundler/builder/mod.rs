//! Packaging orchestration.
//!
//! This module provides the [`Packager`] that turns a staged bundle
//! directory into one archive.
//!
//! # Overview
//!
//! A packaging run:
//! 1. Reads configuration from [`Settings`](crate::bundler::Settings)
//! 2. Collects the bootstrap files, the registry's file list and, when
//!    requested, the bundled runtimes into a [`FileSet`]
//! 3. Opens the archive backend selected by the output extension
//! 4. Streams every file that exists on disk, reporting to a [`Progress`]
//! 5. Finalizes the archive
//!
//! # Example
//!
//! ```no_run
//! use fiji_packager::bundler::{Packager, PlatformFilter, SettingsBuilder};
//!
//! # fn example() -> fiji_packager::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .bundle_root("/opt/Fiji.app")
//!     .platforms(PlatformFilter::parse("win64"))
//!     .include_runtime(true)
//!     .build()?;
//!
//! let mut packager = Packager::new(settings);
//! packager.package("fiji-win64.zip".as_ref())?;
//! println!("{} candidate files", packager.files().map_or(0, |f| f.len()));
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`file_set`] - insertion-ordered, duplicate-free entry list
//! - [`orchestrator`] - the [`Packager`] and launcher naming rules
//! - [`progress`] - progress sink trait

mod file_set;
mod orchestrator;
mod progress;

pub use file_set::FileSet;
pub use orchestrator::{BOOTSTRAP_FILES, Packager, is_launcher, launcher_path};
pub use progress::{NoProgress, Progress};
