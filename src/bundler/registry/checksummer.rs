//! Local file scan and checksum reconciliation.

use super::collection::{FileObject, FileStatus, FilesCollection};
use crate::bundler::{
    KNOWN_PLATFORMS,
    error::{ErrorExt, Result},
    utils::fs::{is_hidden, relative_entry_name},
};
use sha1::{Digest, Sha1};
use std::{fs::File, io, path::Path};
use walkdir::WalkDir;

/// Directories the updater manages, relative to the bundle root.
pub const MANAGED_DIRECTORIES: &[&str] = &[
    "jars",
    "retro",
    "misc",
    "plugins",
    "scripts",
    "macros",
    "luts",
    "images",
    "lib",
    "mm",
    "mmautofocus",
    "mmplugins",
];

/// Platform launchers the updater manages, relative to the bundle root.
pub const MANAGED_LAUNCHERS: &[&str] = &[
    "ImageJ-linux32",
    "ImageJ-linux64",
    "ImageJ-win32.exe",
    "ImageJ-win64.exe",
    "Contents/MacOS/ImageJ-macosx",
    "Contents/MacOS/ImageJ-tiger",
];

/// Reconciles a [`FilesCollection`] with the files on disk.
pub struct Checksummer<'a> {
    files: &'a mut FilesCollection,
}

impl<'a> Checksummer<'a> {
    /// Creates a checksummer updating `files`.
    pub fn new(files: &'a mut FilesCollection) -> Self {
        Self { files }
    }

    /// Scans the managed directories and launchers, checksums every file
    /// found, and updates statuses accordingly.
    ///
    /// Known records get `Installed` or `Modified`, unknown files are added
    /// as `LocalOnly`, and records with no file stay `NotInstalled`.
    pub fn update_from_local(&mut self) -> Result<()> {
        let root = self.files.root().to_path_buf();
        let mut found = Vec::new();

        for dir in MANAGED_DIRECTORIES {
            let base = root.join(dir);
            if !base.is_dir() {
                continue;
            }
            let walker = WalkDir::new(&base)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_ignored(&entry.file_name().to_string_lossy()));
            for entry in walker {
                let entry = entry?;
                if entry.path().is_file() {
                    found.extend(relative_entry_name(&root, entry.path())?);
                }
            }
        }
        for launcher in MANAGED_LAUNCHERS {
            if root.join(launcher).is_file() {
                found.push((*launcher).to_string());
            }
        }

        log::debug!("Checksumming {} local files", found.len());
        for filename in found {
            let checksum = checksum(&root.join(&filename))?;
            self.reconcile(filename, checksum);
        }
        Ok(())
    }

    fn reconcile(&mut self, filename: String, checksum: String) {
        match self.files.get_mut(&filename) {
            Some(file) => {
                file.status = match &file.record_checksum {
                    None => FileStatus::Obsolete,
                    Some(expected) if *expected == checksum => FileStatus::Installed,
                    Some(_) => FileStatus::Modified,
                };
                file.local_checksum = Some(checksum);
            }
            None => {
                let mut file = FileObject::new(filename, FileStatus::LocalOnly);
                file.local_checksum = Some(checksum);
                self.files.add(file);
            }
        }
    }
}

fn is_ignored(name: &str) -> bool {
    is_hidden(name) || name.ends_with('~') || name.ends_with(".swp")
}

/// SHA-1 of a file's content, hex encoded.
pub fn checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).fs_context("opening file for checksum", path)?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher).fs_context("reading file for checksum", path)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Platform implied by a path's location, if any.
///
/// Launchers carry their platform in the name (`ImageJ-linux64`,
/// `ImageJ-win32.exe`); native libraries and platform jars live in
/// `lib/<platform>/` or `jars/<platform>/`.
pub fn platform_for_path(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name.strip_suffix(".exe").unwrap_or(name);
    if let Some(platform) = stem
        .strip_prefix("ImageJ-")
        .or_else(|| stem.strip_prefix("fiji-"))
    {
        return known_platform(platform);
    }

    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("lib" | "jars"), Some(platform), Some(_)) => known_platform(platform),
        _ => None,
    }
}

fn known_platform(name: &str) -> Option<&'static str> {
    KNOWN_PLATFORMS.iter().copied().find(|p| *p == name)
}
