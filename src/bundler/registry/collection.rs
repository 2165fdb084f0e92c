//! In-memory view of the bundle's managed files.

use super::{checksummer::platform_for_path, database};
use crate::bundler::error::Result;
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

/// How a file's local copy relates to its registry record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileStatus {
    /// Local checksum matches the current version.
    Installed,
    /// Local copy differs from the current version.
    Modified,
    /// Local copy of a file that has no current version.
    Obsolete,
    /// On disk but unknown to the registry.
    LocalOnly,
    /// Known to the registry but not on disk.
    NotInstalled,
}

impl FileStatus {
    /// Whether the file is present in the bundle.
    pub fn is_local(&self) -> bool {
        !matches!(self, FileStatus::NotInstalled)
    }
}

/// A file known to the registry or found on disk.
#[derive(Clone, Debug)]
pub struct FileObject {
    /// Root-relative, forward-slash file name.
    pub filename: String,
    /// Declared platform affinity.
    pub platforms: BTreeSet<String>,
    /// Current-version checksum from the database.
    pub record_checksum: Option<String>,
    /// Checksum of the local copy, once scanned.
    pub local_checksum: Option<String>,
    /// Reconciliation state.
    pub status: FileStatus,
}

impl FileObject {
    pub(crate) fn new(filename: String, status: FileStatus) -> Self {
        Self {
            filename,
            platforms: BTreeSet::new(),
            record_checksum: None,
            local_checksum: None,
            status,
        }
    }

    /// A database record not yet seen on disk.
    pub fn from_record(
        filename: impl Into<String>,
        platforms: BTreeSet<String>,
        checksum: Option<String>,
    ) -> Self {
        let mut file = Self::new(filename.into(), FileStatus::NotInstalled);
        file.platforms = platforms;
        file.record_checksum = checksum;
        file
    }

    /// Declared affinity, or the affinity implied by the file's location
    /// when none is declared.
    pub fn effective_platforms(&self) -> BTreeSet<String> {
        if !self.platforms.is_empty() {
            return self.platforms.clone();
        }
        platform_for_path(&self.filename)
            .map(|p| BTreeSet::from([p.to_string()]))
            .unwrap_or_default()
    }
}

/// The set of files managed by the updater for one bundle.
#[derive(Debug)]
pub struct FilesCollection {
    root: PathBuf,
    files: Vec<FileObject>,
    index: HashMap<String, usize>,
}

impl FilesCollection {
    /// Creates an empty collection for the bundle at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Loads the database records, if the bundle has a database.
    pub fn read_database(&mut self) -> Result<()> {
        match database::read(&self.root)? {
            Some(records) => {
                let obsolete = records.iter().filter(|r| r.is_obsolete()).count();
                log::debug!("{} of {} records are obsolete", obsolete, records.len());
                for record in records {
                    self.add(FileObject::from_record(
                        record.filename,
                        record.platforms,
                        record.checksum,
                    ));
                }
            }
            None => log::warn!(
                "No {} in {}; listing local files only",
                database::DATABASE,
                self.root.display()
            ),
        }
        Ok(())
    }

    /// Adds a file, replacing any previous entry of the same name.
    pub fn add(&mut self, file: FileObject) {
        match self.index.get(&file.filename) {
            Some(&position) => self.files[position] = file,
            None => {
                self.index.insert(file.filename.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }

    /// Looks a file up by name.
    pub fn get(&self, filename: &str) -> Option<&FileObject> {
        self.index.get(filename).map(|&i| &self.files[i])
    }

    pub(crate) fn get_mut(&mut self, filename: &str) -> Option<&mut FileObject> {
        self.index.get(filename).map(|&i| &mut self.files[i])
    }

    /// Sorts by file name.
    pub fn sort(&mut self) {
        self.files.sort_by(|a, b| a.filename.cmp(&b.filename));
        self.index = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.filename.clone(), i))
            .collect();
    }

    /// Iterates in the current order.
    pub fn iter(&self) -> impl Iterator<Item = &FileObject> {
        self.files.iter()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The bundle root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
