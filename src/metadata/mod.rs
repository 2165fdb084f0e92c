//! Packaging profile loaded from TOML.
//!
//! A profile supplies defaults for a bundle so repeated runs need fewer
//! flags. Values given on the command line always win.
//!
//! ```toml
//! [packaging]
//! prefix = "Fiji.app"
//! platforms = ["linux64", "win64"]
//! include-runtime = true
//! registry = "legacy"
//! codec-path = "/usr/local/bin"
//! ```

use crate::bundler::{PlatformFilter, RegistryKind};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;

/// Profile file looked up in the bundle root when no `--config` is given.
pub const PROFILE_FILE: &str = "packager.toml";

/// Parsed packaging profile.
#[derive(Debug, Default, Deserialize)]
pub struct PackagingProfile {
    /// The `[packaging]` table.
    #[serde(default)]
    pub packaging: PackagingSection,
}

/// Keys of the `[packaging]` table. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackagingSection {
    /// Archive root directory.
    pub prefix: Option<String>,

    /// Target platforms.
    pub platforms: Option<PlatformList>,

    /// Whether to add bundled runtimes.
    pub include_runtime: Option<bool>,

    /// Registry implementation.
    pub registry: Option<RegistryKind>,

    /// Search path for external codecs.
    pub codec_path: Option<String>,
}

/// Platforms as a comma-separated string or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlatformList {
    /// `"linux64,win64"`
    Joined(String),
    /// `["linux64", "win64"]`
    List(Vec<String>),
}

impl PlatformList {
    /// Converts to a filter; empty input means no filtering.
    pub fn to_filter(&self) -> PlatformFilter {
        match self {
            PlatformList::Joined(list) => PlatformFilter::parse(list),
            PlatformList::List(list) => PlatformFilter::new(
                list.iter().map(|s| s.trim()).filter(|s| !s.is_empty()),
            ),
        }
    }
}

/// Reads and parses a profile.
pub fn load_profile(path: &Path) -> Result<PackagingProfile> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Profile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let profile = toml::from_str(&content)?;
    log::debug!("Loaded packaging profile {}", path.display());
    Ok(profile)
}

/// Loads `explicit` if given, else `<bundle_root>/packager.toml` if it exists.
pub fn find_profile(explicit: Option<&Path>, bundle_root: Option<&Path>) -> Result<Option<PackagingProfile>> {
    if let Some(path) = explicit {
        return load_profile(path).map(Some);
    }
    match bundle_root.map(|root| root.join(PROFILE_FILE)) {
        Some(path) if path.is_file() => load_profile(&path).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundlerError;

    #[test]
    fn full_profile_parses() {
        let profile: PackagingProfile = toml::from_str(
            r#"
            [packaging]
            prefix = "ImageJ.app"
            platforms = "linux64, win64"
            include-runtime = true
            registry = "legacy"
            codec-path = "/opt/bin"
            "#,
        )
        .unwrap();
        let section = profile.packaging;
        assert_eq!(section.prefix.as_deref(), Some("ImageJ.app"));
        assert_eq!(section.platforms.unwrap().to_filter().to_string(), "linux64,win64");
        assert_eq!(section.include_runtime, Some(true));
        assert_eq!(section.registry, Some(RegistryKind::Legacy));
        assert_eq!(section.codec_path.as_deref(), Some("/opt/bin"));
    }

    #[test]
    fn platform_arrays_are_accepted() {
        let profile: PackagingProfile =
            toml::from_str("[packaging]\nplatforms = [\"macosx\", \"\", \"tiger\"]\n").unwrap();
        let filter = profile.packaging.platforms.unwrap().to_filter();
        assert_eq!(filter.to_string(), "macosx,tiger");
    }

    #[test]
    fn empty_profile_has_no_overrides() {
        let profile: PackagingProfile = toml::from_str("").unwrap();
        assert!(profile.packaging.prefix.is_none());
        assert!(profile.packaging.registry.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = toml::from_str::<PackagingProfile>("[packaging]\ncompression = 9\n");
        assert!(result.is_err());
    }

    #[test]
    fn profile_is_found_in_bundle_root() {
        let temp = tempfile::tempdir().unwrap();
        assert!(find_profile(None, Some(temp.path())).unwrap().is_none());

        std::fs::write(temp.path().join(PROFILE_FILE), "[packaging]\ninclude-runtime = true\n").unwrap();
        let profile = find_profile(None, Some(temp.path())).unwrap().unwrap();
        assert_eq!(profile.packaging.include_runtime, Some(true));
    }

    #[test]
    fn missing_explicit_profile_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = find_profile(Some(&temp.path().join("nope.toml")), None).unwrap_err();
        assert!(matches!(err, BundlerError::Cli(CliError::Profile { .. })));
    }
}
