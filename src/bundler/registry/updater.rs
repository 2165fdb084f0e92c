//! Registry backed by the updater database.

use super::{Checksummer, FileObject, FileRegistry, FilesCollection, filtered_names};
use crate::bundler::{PlatformFilter, error::Result};
use std::path::{Path, PathBuf};

/// Current registry: database records reconciled with the local files.
///
/// A file's affinity is what the database declares for it, or what its
/// location implies when the database declares nothing.
#[derive(Debug, Clone)]
pub struct UpdaterRegistry {
    root: PathBuf,
}

impl UpdaterRegistry {
    /// Creates a registry for the bundle at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Loads and reconciles the collection.
    pub fn collection(&self) -> Result<FilesCollection> {
        let mut files = FilesCollection::new(&self.root);
        files.read_database()?;
        Checksummer::new(&mut files).update_from_local()?;
        files.sort();
        Ok(files)
    }
}

impl FileRegistry for UpdaterRegistry {
    fn name(&self) -> &'static str {
        "updater"
    }

    fn file_list(&self, platforms: &PlatformFilter) -> Result<Vec<String>> {
        let files = self.collection()?;
        filtered_names(&files, platforms, FileObject::effective_platforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::registry::DATABASE;
    use flate2::{Compression, write::GzEncoder};
    use std::{fs, io::Write};

    fn write_database(root: &Path, body: &str) {
        let mut encoder = GzEncoder::new(
            fs::File::create(root.join(DATABASE)).unwrap(),
            Compression::default(),
        );
        write!(encoder, "<pluginRecords>{body}</pluginRecords>").unwrap();
        encoder.finish().unwrap();
    }

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_database(
            root,
            r#"<plugin filename="jars/native.jar"><platform>win64</platform><version checksum="x"/></plugin>
               <plugin filename="jars/ij.jar"><version checksum="y"/></plugin>
               <plugin filename="jars/missing.jar"><version checksum="z"/></plugin>"#,
        );
        write(root, "jars/native.jar");
        write(root, "jars/ij.jar");
        write(root, "plugins/Foo.jar");
        write(root, "lib/linux64/libbar.so");
        write(root, "ImageJ-win32.exe");
        temp
    }

    #[test]
    fn empty_filter_lists_every_local_file_sorted() {
        let temp = fixture();
        let registry = UpdaterRegistry::new(temp.path());
        assert_eq!(
            registry.file_list(&PlatformFilter::all()).unwrap(),
            [
                "ImageJ-win32.exe",
                "jars/ij.jar",
                "jars/native.jar",
                "lib/linux64/libbar.so",
                "plugins/Foo.jar",
            ]
        );
    }

    #[test]
    fn filter_uses_declared_and_inferred_affinity() {
        let temp = fixture();
        let registry = UpdaterRegistry::new(temp.path());
        assert_eq!(
            registry.file_list(&PlatformFilter::parse("linux64")).unwrap(),
            ["jars/ij.jar", "lib/linux64/libbar.so", "plugins/Foo.jar"]
        );
        assert_eq!(
            registry.file_list(&PlatformFilter::parse("win64,win32")).unwrap(),
            ["ImageJ-win32.exe", "jars/ij.jar", "jars/native.jar", "plugins/Foo.jar"]
        );
    }

    #[test]
    fn works_without_a_database() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "plugins/Foo.jar");
        let registry = UpdaterRegistry::new(temp.path());
        assert_eq!(
            registry.file_list(&PlatformFilter::all()).unwrap(),
            ["plugins/Foo.jar"]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_left_out() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "plugins/Foo.jar");
        fs::write(
            temp.path().join("plugins").join(OsStr::from_bytes(b"caf\xe9.jar")),
            b"x",
        )
        .unwrap();
        let registry = UpdaterRegistry::new(temp.path());
        assert_eq!(
            registry.file_list(&PlatformFilter::all()).unwrap(),
            ["plugins/Foo.jar"]
        );
    }
}
