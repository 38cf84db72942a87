//! Shared helpers: file system operations, downloads and JSON tree merging.

pub mod fs;
pub mod http;
pub mod merge;
