//! Bundled runtime (JRE) discovery.
//!
//! Runtimes live under `<bundle-root>/java/<platform-dir>/<version-dir>/jre`.
//! For each platform the newest `<version-dir>` (by modification time) that
//! contains a `jre` directory is chosen, and every regular file under its
//! `jre` directory is listed relative to the bundle root.

use crate::bundler::{
    PlatformFilter,
    error::{Error, ErrorExt, Result},
    utils::fs::{is_hidden, relative_entry_name, sorted_children},
};
use std::{
    path::PathBuf,
    time::SystemTime,
};
use walkdir::WalkDir;

/// Runtime root directory, relative to the bundle root.
pub const RUNTIME_ROOT: &str = "java";

const JRE_DIR: &str = "jre";

/// Fixed embedded runtime used for the legacy Mac platforms.
const EMBEDDED_MAC_RUNTIME: &str = "macosx-java3d";

/// Maps a platform identifier to the runtime directory name used on disk
/// when no directory of the platform's own name holds a runtime.
pub fn runtime_alias(platform: &str) -> Option<&'static str> {
    match platform {
        "linux32" => Some("linux"),
        "linux64" => Some("linux-amd64"),
        "macosx" | "tiger" => Some(EMBEDDED_MAC_RUNTIME),
        _ => None,
    }
}

/// Locates runtime directories and lists their files.
#[derive(Debug, Clone)]
pub struct RuntimeResolver {
    root: PathBuf,
}

impl RuntimeResolver {
    /// Creates a resolver for the bundle at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists every runtime file to embed for `platforms`, relative to the
    /// bundle root, runtime by runtime.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRuntime`] when a requested platform has no runtime and
    /// [`Error::NoRuntimes`] when no platform was requested and the runtime
    /// root does not exist.
    pub fn runtime_files(&self, platforms: &PlatformFilter) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for dir in self.resolve(platforms)? {
            let listed = self.list_files(&dir)?;
            log::debug!("Runtime {} holds {} files", dir, listed.len());
            files.extend(listed);
        }
        Ok(files)
    }

    /// Resolves the runtime directories for `platforms`.
    ///
    /// With no platforms, every non-hidden directory under the runtime root
    /// contributes its newest runtime, if it has one.
    pub fn resolve(&self, platforms: &PlatformFilter) -> Result<Vec<String>> {
        if platforms.is_empty() {
            return self.resolve_all();
        }

        let mut directories = Vec::new();
        for platform in platforms.iter() {
            let platform = platform.as_str();
            if let Some(dir) = self.newest(&format!("{RUNTIME_ROOT}/{platform}"))? {
                directories.push(dir);
                continue;
            }

            match runtime_alias(platform) {
                Some(EMBEDDED_MAC_RUNTIME) => {
                    let dir = format!("{RUNTIME_ROOT}/{EMBEDDED_MAC_RUNTIME}/Home");
                    if self.root.join(&dir).is_dir() {
                        directories.push(dir);
                    } else {
                        log::debug!("No embedded runtime at {dir} for '{platform}'");
                    }
                }
                Some(alias) => {
                    let dir = self
                        .newest(&format!("{RUNTIME_ROOT}/{alias}"))?
                        .ok_or_else(|| Error::MissingRuntime {
                            platform: platform.to_string(),
                        })?;
                    directories.push(dir);
                }
                None => {
                    return Err(Error::MissingRuntime {
                        platform: platform.to_string(),
                    });
                }
            }
        }
        Ok(directories)
    }

    fn resolve_all(&self) -> Result<Vec<String>> {
        let runtime_root = self.root.join(RUNTIME_ROOT);
        let candidates =
            sorted_children(&runtime_root)?.ok_or_else(|| Error::NoRuntimes(runtime_root.clone()))?;

        let mut directories = Vec::new();
        for candidate in candidates {
            let name = candidate.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            if let Some(dir) = self.newest(&format!("{RUNTIME_ROOT}/{name}"))? {
                directories.push(dir);
            }
        }
        Ok(directories)
    }

    /// Finds the newest `<dir_name>/<version>/jre` directory.
    ///
    /// Candidates are the subdirectories of `dir_name` that contain a `jre`
    /// directory; the one modified last wins, ties going to the first in
    /// name order. Returns `None` when `dir_name` is missing or has no
    /// candidate.
    pub fn newest(&self, dir_name: &str) -> Result<Option<String>> {
        let Some(children) = sorted_children(&self.root.join(dir_name))? else {
            return Ok(None);
        };

        let mut newest: Option<(String, SystemTime)> = None;
        for child in children {
            let path = child.path();
            if !path.is_dir() || !path.join(JRE_DIR).is_dir() {
                continue;
            }
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .fs_context("reading modification time", &path)?;
            let is_newer = match &newest {
                Some((_, best)) => *best < modified,
                None => true,
            };
            if is_newer {
                newest = Some((child.file_name().to_string_lossy().into_owned(), modified));
            }
        }

        Ok(newest.map(|(name, _)| format!("{dir_name}/{name}/{JRE_DIR}")))
    }

    /// Lists the regular files below `dir_name`, skipping hidden entries.
    ///
    /// Paths are relative to the bundle root and sorted depth-first by name.
    /// Files whose names are not UTF-8 are logged and left out.
    pub fn list_files(&self, dir_name: &str) -> Result<Vec<String>> {
        let base = self.root.join(dir_name);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&base)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !is_hidden(&entry.file_name().to_string_lossy())
            });
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.extend(relative_entry_name(&self.root, entry.path())?);
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative.as_bytes()).unwrap();
    }

    fn set_age(root: &Path, relative: &str, seconds: i64) {
        set_file_mtime(root.join(relative), FileTime::from_unix_time(seconds, 0)).unwrap();
    }

    fn bundle() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn newest_candidate_wins() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux64/jdk1.6/jre/lib/rt.jar");
        touch(root, "java/linux64/jdk1.8/jre/lib/rt.jar");
        touch(root, "java/linux64/jdk1.7/jre/lib/rt.jar");
        set_age(root, "java/linux64/jdk1.6", 1_000);
        set_age(root, "java/linux64/jdk1.8", 3_000);
        set_age(root, "java/linux64/jdk1.7", 2_000);

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.newest("java/linux64").unwrap().as_deref(),
            Some("java/linux64/jdk1.8/jre")
        );
    }

    #[test]
    fn candidates_without_jre_are_never_selected() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/win32/old/jre/bin/java.exe");
        touch(root, "java/win32/newer/bin/java.exe");
        set_age(root, "java/win32/old", 1_000);
        set_age(root, "java/win32/newer", 9_000);

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.newest("java/win32").unwrap().as_deref(),
            Some("java/win32/old/jre")
        );
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/win64/a/jre/x");
        touch(root, "java/win64/b/jre/x");
        set_age(root, "java/win64/a", 5_000);
        set_age(root, "java/win64/b", 5_000);

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.newest("java/win64").unwrap().as_deref(),
            Some("java/win64/a/jre")
        );
    }

    #[test]
    fn aliased_platform_directory_is_used() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux/jdk1.6.0_24/jre/lib/rt.jar");
        touch(root, "java/linux/jdk1.6.0_24/jre/bin/java");
        touch(root, "java/win32/jdk1.6.0_24/jre/bin/java.exe");

        let resolver = RuntimeResolver::new(root);
        let files = resolver
            .runtime_files(&PlatformFilter::parse("linux32"))
            .unwrap();
        assert_eq!(
            files,
            [
                "java/linux/jdk1.6.0_24/jre/bin/java",
                "java/linux/jdk1.6.0_24/jre/lib/rt.jar",
            ]
        );
    }

    #[test]
    fn direct_platform_directory_takes_precedence() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux64/jdk8/jre/a");
        touch(root, "java/linux-amd64/jdk6/jre/b");

        let resolver = RuntimeResolver::new(root);
        let dirs = resolver.resolve(&PlatformFilter::parse("linux64")).unwrap();
        assert_eq!(dirs, ["java/linux64/jdk8/jre"]);
    }

    #[test]
    fn missing_runtime_is_fatal() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux/jdk/jre/a");

        let resolver = RuntimeResolver::new(root);
        let err = resolver.resolve(&PlatformFilter::parse("win64")).unwrap_err();
        assert!(matches!(err, Error::MissingRuntime { ref platform } if platform == "win64"));

        let err = resolver.resolve(&PlatformFilter::parse("linux64")).unwrap_err();
        assert!(matches!(err, Error::MissingRuntime { .. }));
    }

    #[test]
    fn legacy_mac_uses_embedded_home() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/macosx-java3d/Home/lib/ext/j3dcore.jar");

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.resolve(&PlatformFilter::parse("tiger")).unwrap(),
            ["java/macosx-java3d/Home"]
        );

        let empty = bundle();
        let resolver = RuntimeResolver::new(empty.path());
        assert!(resolver.resolve(&PlatformFilter::parse("macosx")).unwrap().is_empty());
    }

    #[test]
    fn no_platforms_takes_every_visible_platform_directory() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux/jdk/jre/a");
        touch(root, "java/win32/jdk/jre/b");
        touch(root, "java/.hidden/jdk/jre/c");
        touch(root, "java/macosx/no-runtime-here");

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.resolve(&PlatformFilter::all()).unwrap(),
            ["java/linux/jdk/jre", "java/win32/jdk/jre"]
        );
    }

    #[test]
    fn no_runtime_root_is_fatal_without_platforms() {
        let temp = bundle();
        let resolver = RuntimeResolver::new(temp.path());
        assert!(matches!(
            resolver.resolve(&PlatformFilter::all()),
            Err(Error::NoRuntimes(_))
        ));
    }

    #[test]
    fn listing_skips_hidden_entries() {
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux/jdk/jre/lib/rt.jar");
        touch(root, "java/linux/jdk/jre/.DS_Store");
        touch(root, "java/linux/jdk/jre/.cache/x");

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.list_files("java/linux/jdk/jre").unwrap(),
            ["java/linux/jdk/jre/lib/rt.jar"]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn listing_leaves_out_non_utf8_names() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
        let temp = bundle();
        let root = temp.path();
        touch(root, "java/linux/jdk/jre/lib/rt.jar");
        fs::write(
            root.join("java/linux/jdk/jre/lib").join(OsStr::from_bytes(b"caf\xe9.jar")),
            b"x",
        )
        .unwrap();

        let resolver = RuntimeResolver::new(root);
        assert_eq!(
            resolver.list_files("java/linux/jdk/jre").unwrap(),
            ["java/linux/jdk/jre/lib/rt.jar"]
        );
    }
}
