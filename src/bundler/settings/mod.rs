//! Configuration structures for packaging operations.
//!
//! This module provides the configuration types for the macOS packaging
//! pipeline: package metadata, compression policy, certificate material,
//! identity overrides and DMG layout overrides, plus a builder.

mod arch;
mod builder;
mod core;
mod macos;
mod package;

// Re-export all public types
pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use core::Settings;
pub use macos::{CodeSigningSettings, CompressionLevel, DmgSettings, MacOsSettings};
pub use package::PackageSettings;
