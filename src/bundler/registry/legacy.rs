//! Registry for bundles that predate platform records.

use super::{Checksummer, FileObject, FileRegistry, FilesCollection, filtered_names};
use crate::bundler::{PlatformFilter, error::Result, registry::platform_for_path};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// Previous-generation registry.
///
/// Lists the managed files found on disk and derives platform affinity
/// solely from path conventions. A database, if present, is not consulted.
#[derive(Debug, Clone)]
pub struct LegacyRegistry {
    root: PathBuf,
}

impl LegacyRegistry {
    /// Creates a registry for the bundle at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

fn path_affinity(file: &FileObject) -> BTreeSet<String> {
    platform_for_path(&file.filename)
        .map(|p| BTreeSet::from([p.to_string()]))
        .unwrap_or_default()
}

impl FileRegistry for LegacyRegistry {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn file_list(&self, platforms: &PlatformFilter) -> Result<Vec<String>> {
        let mut files = FilesCollection::new(&self.root);
        Checksummer::new(&mut files).update_from_local()?;
        files.sort();
        filtered_names(&files, platforms, path_affinity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::registry::DATABASE;
    use std::fs;

    #[test]
    fn ignores_database_affinity() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("jars/win32")).unwrap();
        fs::write(root.join("jars/win32/native.jar"), b"n").unwrap();
        fs::write(root.join("jars/ij.jar"), b"i").unwrap();
        // Not a valid database; the legacy registry never reads it.
        fs::write(root.join(DATABASE), b"garbage").unwrap();

        let registry = LegacyRegistry::new(root);
        assert_eq!(
            registry.file_list(&PlatformFilter::parse("linux64")).unwrap(),
            ["jars/ij.jar"]
        );
        assert_eq!(
            registry.file_list(&PlatformFilter::all()).unwrap(),
            ["jars/ij.jar", "jars/win32/native.jar"]
        );
    }
}
