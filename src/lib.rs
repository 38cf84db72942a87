//! macOS packaging pipeline for prebuilt `.app` bundles
//!
//! This library signs an application bundle and produces:
//! - drag-to-install disk images (.dmg)
//! - ZIP and 7z archives, including the `mac` ZIP used by update channels
//! - signed Mac App Store installer packages (.pkg)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
