//! Configuration for packaging runs.
//!
//! [`Settings`] is built once per run through [`SettingsBuilder`] and never
//! mutated afterwards.

mod builder;
mod core;
mod platform;

pub use builder::SettingsBuilder;
pub use core::{DEFAULT_PREFIX, RegistryKind, Settings, normalize_prefix};
pub use platform::{KNOWN_PLATFORMS, Platform, PlatformFilter};
