//! Main packaging orchestration.
//!
//! This module provides the [`Packager`] that builds the bundle's file set
//! and streams it into an archive backend.

use super::{FileSet, NoProgress, Progress};
use crate::bundler::{
    ArchiveBackend, ArchiveFormat, ArchiveOpener, Error, Result, RuntimeResolver, Settings,
    error::ErrorExt,
    registry::{FileRegistry, open_registry},
    utils::fs::{is_executable, validate_relative},
};
use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufReader, ErrorKind},
    path::Path,
};

/// Files always attempted first, in this order.
///
/// Not every bundle has all of them; missing ones are skipped.
pub const BOOTSTRAP_FILES: &[&str] = &["db.xml.gz", "ImageJ", "ImageJ.exe", "Contents/Info.plist"];

/// Launchers that must live in the macOS executable directory.
const MACOS_LAUNCHERS: &[&str] = &["ImageJ-macosx", "ImageJ-tiger"];

const MACOS_EXECUTABLE_DIR: &str = "Contents/MacOS/";

/// Whether `name` is an application launcher.
///
/// # Examples
///
/// ```
/// use fiji_packager::bundler::is_launcher;
///
/// assert!(is_launcher("ImageJ-win64.exe"));
/// assert!(is_launcher("Fiji.app/Contents/MacOS/ImageJ-macosx"));
/// assert!(!is_launcher("jars/ij.jar"));
/// ```
pub fn is_launcher(name: &str) -> bool {
    let name = name.strip_prefix("Fiji.app/").unwrap_or(name);
    let name = name.strip_prefix(MACOS_EXECUTABLE_DIR).unwrap_or(name);
    let name = name.strip_suffix(".exe").unwrap_or(name);
    name == "ImageJ" || name == "fiji" || name.starts_with("ImageJ-") || name.starts_with("fiji-")
}

/// Relocates bare macOS launcher names into `Contents/MacOS/`.
pub fn launcher_path(name: &str) -> Cow<'_, str> {
    if MACOS_LAUNCHERS.contains(&name) {
        Cow::Owned(format!("{MACOS_EXECUTABLE_DIR}{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Packages a bundle into one archive.
///
/// A run goes through [`initialize`](Self::initialize),
/// [`open`](Self::open), [`add_default_files`](Self::add_default_files) and
/// [`close`](Self::close); [`package`](Self::package) does all four.
///
/// # Examples
///
/// ```no_run
/// use fiji_packager::bundler::{Packager, SettingsBuilder};
///
/// # fn example() -> fiji_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new().bundle_root("/opt/Fiji.app").build()?;
/// let mut packager = Packager::new(settings);
/// packager.package("fiji-linux64.tar.gz".as_ref())?;
/// # Ok(())
/// # }
/// ```
pub struct Packager {
    settings: Settings,
    registry: Box<dyn FileRegistry>,
    progress: Box<dyn Progress>,
    files: Option<FileSet>,
    backend: Option<Box<dyn ArchiveBackend>>,
}

impl std::fmt::Debug for Packager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packager")
            .field("settings", &self.settings)
            .field("registry", &self.registry.name())
            .field("files", &self.files.as_ref().map(FileSet::len))
            .field("backend", &self.backend.as_ref().map(|_| "<ArchiveBackend>"))
            .finish()
    }
}

impl Packager {
    /// Creates a packager using the registry selected in `settings`.
    pub fn new(settings: Settings) -> Self {
        let registry = open_registry(settings.registry_kind(), settings.bundle_root());
        Self {
            settings,
            registry,
            progress: Box::new(NoProgress),
            files: None,
            backend: None,
        }
    }

    /// Replaces the file registry.
    pub fn with_registry(mut self, registry: Box<dyn FileRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the progress sink.
    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The file set, once initialized.
    pub fn files(&self) -> Option<&FileSet> {
        self.files.as_ref()
    }

    /// Runs a whole packaging run into `output`.
    ///
    /// The archive format is resolved (and any codec located) before the
    /// bundle is read or the output file created.
    pub fn package(&mut self, output: &Path) -> Result<()> {
        let opener = ArchiveFormat::from_path(output)?.resolve(self.settings.codec_search_path())?;
        self.initialize()?;
        self.open_with(&opener, output)?;
        self.add_default_files()?;
        self.close()
    }

    /// Builds the file set: bootstrap files, then registry files, then
    /// runtime files when requested.
    ///
    /// # Errors
    ///
    /// [`Error::BundleRootMissing`] if the bundle root does not exist, and
    /// any registry or runtime resolution failure.
    pub fn initialize(&mut self) -> Result<()> {
        let root = self.settings.bundle_root();
        if !root.is_dir() {
            return Err(Error::BundleRootMissing(root.to_path_buf()));
        }

        let mut files = FileSet::new();
        files.extend(BOOTSTRAP_FILES.iter().copied())?;

        let platforms = self.settings.platforms();
        let listed = self.registry.file_list(platforms)?;
        log::info!(
            "Registry '{}' listed {} files for platforms [{}]",
            self.registry.name(),
            listed.len(),
            platforms
        );
        files.extend(listed)?;

        if self.settings.include_runtime() {
            let runtime = RuntimeResolver::new(root).runtime_files(platforms)?;
            let added = files.extend(runtime)?;
            log::info!("Including {} runtime files", added);
        }

        self.files = Some(files);
        Ok(())
    }

    /// Creates `output` and opens the backend its extension selects.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedArchiveFormat`] for unknown extensions and
    /// [`Error::CodecUnavailable`] when the format's codec is missing.
    pub fn open(&mut self, output: &Path) -> Result<()> {
        let opener = ArchiveFormat::from_path(output)?.resolve(self.settings.codec_search_path())?;
        self.open_with(&opener, output)
    }

    /// Creates `output` and opens a backend with an already resolved format.
    pub fn open_with(&mut self, opener: &ArchiveOpener, output: &Path) -> Result<()> {
        if self.backend.is_some() {
            return Err(Error::EntryState("archive is already open".into()));
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).fs_context("creating output directory", parent)?;
        }
        let sink = File::create(output).fs_context("creating archive", output)?;
        self.backend = Some(opener.open(sink)?);
        log::info!("Writing {} archive {}", opener.format(), output.display());
        Ok(())
    }

    /// Writes the whole file set, in order, reporting progress.
    pub fn add_default_files(&mut self) -> Result<()> {
        let names: Vec<String> = self
            .files
            .as_ref()
            .ok_or_else(|| Error::EntryState("packager is not initialized".into()))?
            .iter()
            .map(String::from)
            .collect();
        let total = names.len();

        self.progress.set_title("Writing files");
        let mut added = 0usize;
        for (count, name) in names.iter().enumerate() {
            self.progress.add_item(name);
            if self.add_file(name, is_launcher(name))? {
                added += 1;
            }
            self.progress.set_count(count + 1, total);
            self.progress.item_done(name);
        }
        self.progress.done();

        log::info!("Wrote {} of {} candidate files", added, total);
        Ok(())
    }

    /// Writes one file from the bundle root into the archive.
    ///
    /// The entry is executable if `executable` is set or the file itself is
    /// executable. Returns `false` without writing when the file does not
    /// exist, or when its path is too long for the platform (logged).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEntryPath`] when `name` is absolute or contains `..`.
    pub fn add_file(&mut self, name: &str, executable: bool) -> Result<bool> {
        validate_relative(name)?;
        let name = launcher_path(name);
        let source = self.settings.bundle_root().join(name.as_ref());
        let metadata = match fs::metadata(&source) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                log::debug!("Not a regular file, skipping: {}", source.display());
                return Ok(false);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                let err = Error::Fs {
                    context: "reading metadata of",
                    path: source,
                    error: e,
                };
                return skip_if_path_too_long(err);
            }
        };

        let entry = format!("{}{}", self.settings.prefix(), name);
        let executable = executable || is_executable(&metadata);
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| Error::EntryState("archive is not open".into()))?;

        match write_entry(backend.as_mut(), &entry, &source, executable, metadata.len()) {
            Ok(()) => Ok(true),
            Err(e) => skip_if_path_too_long(e),
        }
    }

    /// Finalizes the archive.
    pub fn close(&mut self) -> Result<()> {
        let backend = self
            .backend
            .take()
            .ok_or_else(|| Error::EntryState("archive is not open".into()))?;
        backend.close()
    }
}

fn skip_if_path_too_long(err: Error) -> Result<bool> {
    if err.is_path_too_long() {
        log::warn!("Skipping: {}", err);
        Ok(false)
    } else {
        Err(err)
    }
}

fn write_entry(
    backend: &mut dyn ArchiveBackend,
    entry: &str,
    source: &Path,
    executable: bool,
    size: u64,
) -> Result<()> {
    let file = File::open(source).fs_context("opening", source)?;
    backend.put_entry(entry, executable, size)?;
    backend.write_from(&mut BufReader::new(file))?;
    backend.close_entry()
}
