//! File system utilities for packaging.
//!
//! Small helpers shared by the runtime resolver, the registry scanner and
//! the orchestrator: hidden-name checks, the executable bit, and the
//! root-relative path rules every file set entry must obey.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    fs::Metadata,
    path::{Component, Path},
};

/// Whether a directory entry name is hidden (starts with `.`).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Whether the file's own permission bits mark it executable.
#[cfg(unix)]
pub fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

/// Always `false`: without Unix permission bits only the caller's flag
/// marks an entry executable.
#[cfg(not(unix))]
pub fn is_executable(_metadata: &Metadata) -> bool {
    false
}

/// Checks that `path` is a forward-slash, root-relative path with no `..`.
pub fn validate_relative(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(Error::InvalidEntryPath(path.to_string()));
    }
    let valid = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidEntryPath(path.to_string()))
    }
}

/// Converts `path` below `root` into a forward-slash relative string.
///
/// Archive entry names must be UTF-8; other names are
/// [`Error::NonUtf8Path`].
pub fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root)?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part.to_string()),
                None => return Err(Error::NonUtf8Path(path.to_path_buf())),
            },
            _ => return Err(Error::InvalidEntryPath(relative.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}

/// Like [`relative_slash_path`], but a non-UTF-8 name is logged and yields
/// `None` so a scan can go on without it.
pub fn relative_entry_name(root: &Path, path: &Path) -> Result<Option<String>> {
    match relative_slash_path(root, path) {
        Ok(name) => Ok(Some(name)),
        Err(Error::NonUtf8Path(path)) => {
            log::warn!("Skipping file with a non-UTF-8 name: {}", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Reads the immediate children of `dir`, sorted by name.
///
/// Returns `None` when `dir` is not a readable directory.
pub fn sorted_children(dir: &Path) -> Result<Option<Vec<std::fs::DirEntry>>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => return Ok(None),
        Err(e) => return Err(e).fs_context("listing directory", dir),
    };
    let mut children = read_dir
        .collect::<std::io::Result<Vec<_>>>()
        .fs_context("listing directory", dir)?;
    children.sort_by_key(|entry| entry.file_name());
    Ok(Some(children))
}
