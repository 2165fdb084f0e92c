//! Insertion-ordered set of bundle entries.

use crate::bundler::{error::Result, utils::fs::validate_relative};
use std::collections::HashSet;

/// Unique root-relative paths in the order they were first added.
///
/// Adding a path that is already present is a no-op.
#[derive(Debug, Default, Clone)]
pub struct FileSet {
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl FileSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path`; returns whether it was new.
    ///
    /// # Errors
    ///
    /// [`InvalidEntryPath`](crate::bundler::Error::InvalidEntryPath) for
    /// absolute paths or paths containing `..`.
    pub fn insert(&mut self, path: impl Into<String>) -> Result<bool> {
        let path = path.into();
        validate_relative(&path)?;
        if self.seen.contains(&path) {
            return Ok(false);
        }
        self.seen.insert(path.clone());
        self.entries.push(path);
        Ok(true)
    }

    /// Adds every path; returns how many were new.
    pub fn extend<I, S>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for path in paths {
            if self.insert(path)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Whether `path` is in the set.
    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
