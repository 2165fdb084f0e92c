//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, and the merge of
//! flags with an optional packaging profile into engine [`Settings`].

use super::OutputManager;
use crate::bundler::{ArchiveFormat, PlatformFilter, RegistryKind, Settings, SettingsBuilder};
use crate::error::Result;
use crate::metadata::PackagingProfile;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Packager for staged Fiji/ImageJ bundles
#[derive(Parser, Debug)]
#[command(
    name = "fiji_packager",
    version,
    about = "Packages a staged Fiji/ImageJ bundle into one archive",
    long_about = "Writes the files of a staged Fiji/ImageJ application directory into a single archive.

The archive format follows the output file extension: .zip, .tar, .tar.gz (.tgz) or .tar.bz2 (.tbz).
Bundled Java runtimes are added with --jre, restricted to --platforms when given.

Usage:
  fiji_packager --bundle-root /opt/Fiji.app fiji-nojre.zip
  IJ_DIR=/opt/Fiji.app fiji_packager --jre --platforms linux64 fiji-linux64.tar.gz
  fiji_packager --bundle-root . --registry legacy --codec-path /opt/bin fiji.tar.bz2

Exit code 0 = archive written completely."
)]
pub struct Args {
    /// Output archive; its extension selects the format
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Add the bundled Java runtime(s) for the target platforms
    #[arg(long = "include-runtime", visible_alias = "jre")]
    pub include_runtime: bool,

    /// Comma-separated target platforms (e.g. linux64,win64); empty means all
    #[arg(long, value_name = "LIST")]
    pub platforms: Option<String>,

    /// Staged bundle directory
    #[arg(long, env = "IJ_DIR", value_name = "DIR")]
    pub bundle_root: Option<PathBuf>,

    /// Root directory inside the archive [default: Fiji.app/]
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<String>,

    /// File registry generation to list files with [default: updater]
    #[arg(long, value_enum, value_name = "KIND")]
    pub registry: Option<RegistryKind>,

    /// Search path for the external bzip2 codec [default: $PATH]
    #[arg(long, value_name = "PATH")]
    pub codec_path: Option<String>,

    /// Packaging profile (TOML) [default: <bundle-root>/packager.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.output.as_os_str().is_empty() {
            return Err("Output path cannot be empty".to_string());
        }
        if ArchiveFormat::from_path(&self.output).is_err() {
            return Err(format!(
                "Unsupported archive format: {} (use .zip, .tar, .tar.gz, .tgz, .tar.bz2 or .tbz)",
                self.output.display()
            ));
        }
        if self
            .bundle_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err("Bundle root cannot be empty".to_string());
        }
        Ok(())
    }

    /// Bundle root given on the command line or through `IJ_DIR`.
    pub fn bundle_root(&self) -> Option<&Path> {
        self.bundle_root.as_deref()
    }

    /// Merges flags over `profile` into engine settings.
    ///
    /// A flag wins over the profile, and the profile wins over the
    /// built-in default.
    pub fn settings(&self, profile: Option<&PackagingProfile>) -> Result<Settings> {
        let section = profile.map(|p| &p.packaging);

        let mut builder = SettingsBuilder::new();
        if let Some(root) = &self.bundle_root {
            builder = builder.bundle_root(root);
        }

        let include_runtime =
            self.include_runtime || section.and_then(|s| s.include_runtime).unwrap_or(false);
        builder = builder.include_runtime(include_runtime);

        let platforms = match (&self.platforms, section.and_then(|s| s.platforms.as_ref())) {
            (Some(list), _) => PlatformFilter::parse(list),
            (None, Some(list)) => list.to_filter(),
            (None, None) => PlatformFilter::all(),
        };
        builder = builder.platforms(platforms);

        if let Some(prefix) = self
            .prefix
            .as_ref()
            .or_else(|| section.and_then(|s| s.prefix.as_ref()))
        {
            builder = builder.prefix(prefix.clone());
        }

        if let Some(registry) = self.registry.or_else(|| section.and_then(|s| s.registry)) {
            builder = builder.registry(registry);
        }

        if let Some(path) = self
            .codec_path
            .as_ref()
            .or_else(|| section.and_then(|s| s.codec_path.as_ref()))
        {
            builder = builder.codec_search_path(path.as_str());
        }

        Ok(builder.build()?)
    }
}

/// Configuration derived from command line arguments
#[derive(Debug)]
pub struct RuntimeConfig {
    /// Output manager for diagnostics
    output: OutputManager,

    /// Whether progress output is suppressed
    quiet: bool,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: OutputManager::detect(args.quiet),
            quiet: args.quiet,
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Creates the progress sink handed to the packager
    pub fn progress(&self) -> OutputManager {
        OutputManager::detect(self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Error;
    use crate::error::BundlerError;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("fiji_packager").chain(args.iter().copied())).unwrap()
    }

    fn profile(toml: &str) -> PackagingProfile {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn output_is_required() {
        assert!(Args::try_parse_from(["fiji_packager"]).is_err());
    }

    #[test]
    fn jre_is_an_alias_for_include_runtime() {
        assert!(parse(&["--jre", "out.zip"]).include_runtime);
        assert!(parse(&["--include-runtime", "out.zip"]).include_runtime);
        assert!(!parse(&["out.zip"]).include_runtime);
    }

    #[test]
    fn unknown_registry_kind_is_rejected() {
        assert!(Args::try_parse_from(["fiji_packager", "--registry", "ancient", "out.zip"]).is_err());
        assert_eq!(
            parse(&["--registry", "legacy", "out.zip"]).registry,
            Some(RegistryKind::Legacy)
        );
    }

    #[test]
    fn validate_rejects_unknown_extensions() {
        assert!(parse(&["out.zip"]).validate().is_ok());
        assert!(parse(&["out.tgz"]).validate().is_ok());
        let err = parse(&["out.rar"]).validate().unwrap_err();
        assert!(err.contains("Unsupported archive format"));
    }

    #[test]
    fn defaults_apply_without_flags_or_profile() {
        let settings = parse(&["--bundle-root", "/b", "out.zip"]).settings(None).unwrap();
        assert_eq!(settings.bundle_root(), Path::new("/b"));
        assert_eq!(settings.prefix(), "Fiji.app/");
        assert!(!settings.include_runtime());
        assert!(settings.platforms().is_empty());
        assert_eq!(settings.registry_kind(), RegistryKind::Updater);
        assert!(settings.codec_search_path().is_none());
    }

    #[test]
    fn flags_override_profile() {
        let profile = profile(
            "[packaging]\nprefix = \"ImageJ.app\"\nplatforms = \"win32\"\nregistry = \"legacy\"\n",
        );
        let args = parse(&[
            "--bundle-root", "/b", "--prefix", "Other", "--platforms", "linux64,macosx", "out.zip",
        ]);
        let settings = args.settings(Some(&profile)).unwrap();
        assert_eq!(settings.prefix(), "Other/");
        assert_eq!(settings.platforms().to_string(), "linux64,macosx");
        assert_eq!(settings.registry_kind(), RegistryKind::Legacy);
    }

    #[test]
    fn profile_fills_in_missing_flags() {
        let profile = profile(
            "[packaging]\ninclude-runtime = true\nplatforms = [\"tiger\"]\ncodec-path = \"/opt/bin\"\n",
        );
        let settings = parse(&["--bundle-root", "/b", "out.tar.bz2"])
            .settings(Some(&profile))
            .unwrap();
        assert!(settings.include_runtime());
        assert_eq!(settings.platforms().to_string(), "tiger");
        assert_eq!(settings.codec_search_path(), Some(std::ffi::OsStr::new("/opt/bin")));
    }

    #[test]
    fn empty_platform_flag_clears_profile_platforms() {
        let profile = profile("[packaging]\nplatforms = \"win32\"\n");
        let settings = parse(&["--bundle-root", "/b", "--platforms", "", "out.zip"])
            .settings(Some(&profile))
            .unwrap();
        assert!(settings.platforms().is_empty());
    }

    #[test]
    fn missing_bundle_root_is_reported() {
        let args = Args {
            bundle_root: None,
            ..parse(&["out.zip"])
        };
        let err = args.settings(None).unwrap_err();
        assert!(matches!(err, BundlerError::Bundler(Error::BundleRootNotSet)));
    }
}
