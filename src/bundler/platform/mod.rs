//! Platform-specific packaging implementations.

pub mod macos;
