//! Core Settings struct and implementations.

use super::PlatformFilter;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// Archive root directory used when no prefix is configured.
pub const DEFAULT_PREFIX: &str = "Fiji.app/";

/// Which generation of the file registry to read the bundle's file list from.
///
/// Chosen by configuration; nothing probes for it at run time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Current updater: database platform records plus path conventions.
    #[default]
    Updater,
    /// Previous updater generation: path conventions only.
    Legacy,
}

/// Settings for one packaging run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder) and immutable
/// afterwards.
///
/// # Examples
///
/// ```no_run
/// use fiji_packager::bundler::{PlatformFilter, SettingsBuilder};
///
/// # fn example() -> fiji_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .bundle_root("/opt/Fiji.app")
///     .include_runtime(true)
///     .platforms(PlatformFilter::parse("linux64,win64"))
///     .build()?;
/// assert_eq!(settings.prefix(), "Fiji.app/");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Staged application directory; source of every archived file.
    bundle_root: PathBuf,

    /// Whether bundled runtimes are added to the file set.
    include_runtime: bool,

    /// Target platforms; empty means all.
    platforms: PlatformFilter,

    /// Root directory name inside the archive, always ending in `/`
    /// unless empty.
    prefix: String,

    /// Registry implementation to list files with.
    registry: RegistryKind,

    /// Where to look for external codecs. `None` means `$PATH`.
    codec_search_path: Option<OsString>,
}

impl Settings {
    /// Returns the bundle root.
    pub fn bundle_root(&self) -> &Path {
        &self.bundle_root
    }

    /// Whether runtimes are included.
    pub fn include_runtime(&self) -> bool {
        self.include_runtime
    }

    /// Returns the platform filter.
    pub fn platforms(&self) -> &PlatformFilter {
        &self.platforms
    }

    /// Returns the archive prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the configured registry implementation.
    pub fn registry_kind(&self) -> RegistryKind {
        self.registry
    }

    /// Returns the codec search path override, if any.
    pub fn codec_search_path(&self) -> Option<&OsStr> {
        self.codec_search_path.as_deref()
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        bundle_root: PathBuf,
        include_runtime: bool,
        platforms: PlatformFilter,
        prefix: String,
        registry: RegistryKind,
        codec_search_path: Option<OsString>,
    ) -> Self {
        Self {
            bundle_root,
            include_runtime,
            platforms,
            prefix,
            registry,
            codec_search_path,
        }
    }
}

/// Makes sure a non-empty prefix ends with `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}
