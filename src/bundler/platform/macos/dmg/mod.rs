//! macOS DMG disk image creator.
//!
//! Creates drag-to-install DMG files using the native hdiutil tool.
//! The DMG includes the .app bundle and an Applications symlink for easy installation.
//!
//! # Architecture
//!
//! This module is organized into logical submodules:
//! - `layout` - Effective layout (defaults merged with user overrides)
//! - `creation` - Staging and read-write image creation using hdiutil
//! - `customization` - DMG appearance customization (background, window, icons)
//! - `conversion` - Format conversion (UDRW → UDRO / UDBZ)

mod conversion;
mod creation;
mod customization;
mod layout;

use crate::bundler::{
    builder::tool_detection::HAS_HDIUTIL,
    error::{Error, Result},
};
use async_trait::async_trait;

pub use conversion::convert_dmg;
pub use creation::{create_read_write_dmg, read_write_path, stage_contents};
pub use customization::{apply_dmg_customizations, layout_script};
pub use layout::{
    DiskImageCompression, DmgEntry, DmgEntryKind, DmgRequest, DmgSpecification, DmgWindow,
    WindowPosition, WindowSize, compute_specification, default_specification,
};

/// Builds a disk image from a [`DmgRequest`].
#[async_trait]
pub trait DiskImageTool: Send + Sync {
    /// Write `request.target`, replacing any existing file.
    async fn create(&self, request: &DmgRequest) -> Result<()>;
}

/// [`DiskImageTool`] backed by `hdiutil`, Finder and `osascript`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HdiutilDiskImageTool;

#[async_trait]
impl DiskImageTool for HdiutilDiskImageTool {
    /// # Process
    /// 1. Stage the layout's contents in a temporary directory
    /// 2. Create a UDRW image from the staging directory
    /// 3. Mount, lay out and detach it
    /// 4. Convert to the requested final format
    async fn create(&self, request: &DmgRequest) -> Result<()> {
        if !*HAS_HDIUTIL {
            return Err(Error::packaging(
                "dmg",
                "hdiutil not found. DMG creation requires macOS.",
            ));
        }

        log::info!("Creating DMG: {}", request.target.display());

        let staging = tempfile::Builder::new()
            .prefix("dmg-staging-")
            .tempdir()
            .map_err(|e| Error::packaging("dmg", format!("Failed to create staging directory: {e}")))?;

        stage_contents(request, staging.path()).await?;

        let rw_path = read_write_path(&request.target);
        create_read_write_dmg(&request.specification.title, staging.path(), &rw_path).await?;

        if let Err(e) = apply_dmg_customizations(&rw_path, request).await {
            crate::bundler::utils::fs::remove_file(&rw_path).await?;
            return Err(e);
        }

        convert_dmg(&rw_path, &request.target, request.compression).await?;

        log::info!("✓ Created DMG: {}", request.target.display());
        Ok(())
    }
}
