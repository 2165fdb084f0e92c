//! Packaging engine for staged Fiji/ImageJ bundles.
//!
//! The engine collects the bundle's file list from a [`FileRegistry`],
//! optionally adds the bundled Java runtimes found by [`RuntimeResolver`],
//! and streams everything into a `.zip`, `.tar`, `.tar.gz` or `.tar.bz2`
//! archive through an [`ArchiveBackend`]. [`Packager`] drives a run.
//!
//! # Example
//!
//! ```no_run
//! use fiji_packager::bundler::{Packager, RegistryKind, SettingsBuilder};
//!
//! # fn example() -> fiji_packager::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .bundle_root("/opt/Fiji.app")
//!     .registry(RegistryKind::Legacy)
//!     .build()?;
//! Packager::new(settings).package("fiji.tar.gz".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod builder;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod settings;
pub mod utils;

pub use archive::{ArchiveBackend, ArchiveFormat, ArchiveOpener};
pub use builder::{
    BOOTSTRAP_FILES, FileSet, NoProgress, Packager, Progress, is_launcher, launcher_path,
};
pub use error::{Context, Error, ErrorExt, Result};
pub use registry::{FileRegistry, LegacyRegistry, UpdaterRegistry, open_registry};
pub use runtime::{RUNTIME_ROOT, RuntimeResolver, runtime_alias};
pub use settings::{
    DEFAULT_PREFIX, KNOWN_PLATFORMS, Platform, PlatformFilter, RegistryKind, Settings,
    SettingsBuilder,
};
