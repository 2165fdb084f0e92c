//! Shared helpers for the packaging engine.

pub mod fs;
