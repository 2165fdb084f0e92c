//! Builder for constructing Settings.

use super::{PlatformFilter, RegistryKind, Settings, core::{DEFAULT_PREFIX, normalize_prefix}};
use crate::bundler::Error;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use fiji_packager::bundler::{RegistryKind, SettingsBuilder};
///
/// # fn example() -> fiji_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .bundle_root("/opt/Fiji.app")
///     .prefix("ImageJ")
///     .registry(RegistryKind::Legacy)
///     .build()?;
/// assert_eq!(settings.prefix(), "ImageJ/");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    bundle_root: Option<PathBuf>,
    include_runtime: bool,
    platforms: PlatformFilter,
    prefix: Option<String>,
    registry: RegistryKind,
    codec_search_path: Option<OsString>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the bundle root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn bundle_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.bundle_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Includes bundled runtimes.
    ///
    /// Default: false
    pub fn include_runtime(mut self, include: bool) -> Self {
        self.include_runtime = include;
        self
    }

    /// Sets the target platforms.
    ///
    /// Default: empty (all platforms)
    pub fn platforms(mut self, platforms: PlatformFilter) -> Self {
        self.platforms = platforms;
        self
    }

    /// Sets the archive prefix; a trailing `/` is added if missing.
    ///
    /// Default: `Fiji.app/`
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Selects the registry implementation.
    ///
    /// Default: [`RegistryKind::Updater`]
    pub fn registry(mut self, registry: RegistryKind) -> Self {
        self.registry = registry;
        self
    }

    /// Overrides the search path used to locate external codecs.
    ///
    /// Default: `$PATH`
    pub fn codec_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.codec_search_path = Some(path.into());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BundleRootNotSet`] if no bundle root was given.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        let bundle_root = self.bundle_root.ok_or(Error::BundleRootNotSet)?;
        let prefix = normalize_prefix(self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX));

        Ok(Settings::new(
            bundle_root,
            self.include_runtime,
            self.platforms,
            prefix,
            self.registry,
            self.codec_search_path,
        ))
    }
}
