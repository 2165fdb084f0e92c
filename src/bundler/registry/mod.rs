//! File registry adapters.
//!
//! The registry tells the packager which application files belong in the
//! bundle for a set of target platforms. Two generations of the registry
//! exist; each has its own [`FileRegistry`] implementation and the one to
//! use is picked from [`RegistryKind`] when the packager is configured:
//!
//! - [`UpdaterRegistry`] reads the updater database (`db.xml.gz`) for
//!   declared platform affinities, then reconciles it with the files on disk.
//! - [`LegacyRegistry`] serves bundles whose registry predates platform
//!   records: it lists the files on disk and infers affinity from where
//!   they live.
//!
//! Both return checksum-reconciled, root-relative paths sorted by name and
//! filtered with [`PlatformFilter::matches`].

mod checksummer;
mod collection;
mod database;
mod legacy;
mod updater;

pub use checksummer::{Checksummer, MANAGED_DIRECTORIES, MANAGED_LAUNCHERS, platform_for_path};
pub use collection::{FileObject, FileStatus, FilesCollection};
pub use database::{DATABASE, Record};
pub use legacy::LegacyRegistry;
pub use updater::UpdaterRegistry;

use crate::bundler::{
    PlatformFilter, RegistryKind,
    error::Result,
    utils::fs::validate_relative,
};
use std::{collections::BTreeSet, path::Path};

/// Source of the bundle's application file list.
pub trait FileRegistry {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Root-relative paths of the files that belong in the bundle for
    /// `platforms`, in the registry's own order.
    fn file_list(&self, platforms: &PlatformFilter) -> Result<Vec<String>>;
}

/// Creates the registry implementation selected by `kind`.
pub fn open_registry(kind: RegistryKind, root: &Path) -> Box<dyn FileRegistry> {
    match kind {
        RegistryKind::Updater => Box::new(UpdaterRegistry::new(root)),
        RegistryKind::Legacy => Box::new(LegacyRegistry::new(root)),
    }
}

/// Lists the local files of a sorted collection that match `platforms`.
fn filtered_names<F>(
    files: &FilesCollection,
    platforms: &PlatformFilter,
    affinity: F,
) -> Result<Vec<String>>
where
    F: Fn(&FileObject) -> BTreeSet<String>,
{
    let mut names = Vec::new();
    for file in files.iter().filter(|f| f.status.is_local()) {
        if platforms.matches(&affinity(file)) {
            validate_relative(&file.filename)?;
            names.push(file.filename.clone());
        }
    }
    Ok(names)
}
