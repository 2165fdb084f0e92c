//! Platform identifiers and platform filters.

use std::{collections::BTreeSet, fmt};

/// Platform identifiers understood by the file registry.
pub const KNOWN_PLATFORMS: &[&str] = &["linux32", "linux64", "macosx", "tiger", "win32", "win64"];

/// A target platform identifier (e.g. `linux64`, `macosx`, `win32`).
///
/// Unknown identifiers are kept verbatim; they simply match nothing that
/// declares a platform affinity.
///
/// # Examples
///
/// ```
/// use fiji_packager::bundler::Platform;
///
/// let platform = Platform::new("linux64");
/// assert!(platform.is_known());
/// assert_eq!(platform.as_str(), "linux64");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    /// Creates a platform from its identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of [`KNOWN_PLATFORMS`].
    pub fn is_known(&self) -> bool {
        KNOWN_PLATFORMS.contains(&self.0.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Platform {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Set of target platforms; empty means "every platform, no filtering".
///
/// Iteration follows the order in which the platforms were requested, which
/// is also the order runtimes are resolved in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlatformFilter {
    platforms: Vec<Platform>,
}

impl PlatformFilter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a filter from platform identifiers, dropping duplicates.
    pub fn new<I, P>(platforms: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Platform>,
    {
        let mut filter = Self::default();
        for platform in platforms {
            let platform = platform.into();
            if !filter.platforms.contains(&platform) {
                filter.platforms.push(platform);
            }
        }
        filter
    }

    /// Parses a comma-separated list. The empty string yields an empty filter.
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Platform::from),
        )
    }

    /// Whether no platform was requested.
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Requested platforms in request order.
    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter()
    }

    /// Applies the registry filtering rule to a file's platform affinity.
    ///
    /// A file without affinity matches every filter. A file with affinity
    /// matches when the filter is empty or intersects the affinity.
    pub fn matches(&self, affinity: &BTreeSet<String>) -> bool {
        if self.is_empty() || affinity.is_empty() {
            return true;
        }
        self.platforms.iter().any(|p| affinity.contains(p.as_str()))
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.platforms.iter().map(Platform::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affinity(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_string_is_no_filter() {
        assert!(PlatformFilter::parse("").is_empty());
        assert!(PlatformFilter::parse(" , ").is_empty());
    }

    #[test]
    fn parse_keeps_order_and_drops_duplicates() {
        let filter = PlatformFilter::parse("win32,linux64,win32");
        let names: Vec<_> = filter.iter().map(Platform::as_str).collect();
        assert_eq!(names, ["win32", "linux64"]);
        assert_eq!(filter.to_string(), "win32,linux64");
    }

    #[test]
    fn files_without_affinity_match_everything() {
        assert!(PlatformFilter::all().matches(&affinity(&[])));
        assert!(PlatformFilter::parse("win32").matches(&affinity(&[])));
    }

    #[test]
    fn files_with_affinity_need_an_intersection() {
        let linux_only = affinity(&["linux32", "linux64"]);
        assert!(PlatformFilter::all().matches(&linux_only));
        assert!(PlatformFilter::parse("macosx,linux64").matches(&linux_only));
        assert!(!PlatformFilter::parse("win32,win64").matches(&linux_only));
    }

    #[test]
    fn known_platforms() {
        assert!(Platform::new("tiger").is_known());
        assert!(!Platform::new("solaris").is_known());
    }
}
