//! DMG format conversion.
//!
//! Layout changes need a read-write image (UDRW); the distributed image is
//! converted afterwards to the requested read-only format.

use super::layout::DiskImageCompression;
use crate::bundler::{
    error::{Error, Result, path_str},
    utils::fs,
};
use std::path::Path;

/// Convert the read-write image at `source` into `target`.
///
/// Must run after customizations are applied and the image is detached.
/// The read-write image is removed on success.
pub async fn convert_dmg(
    source: &Path,
    target: &Path,
    compression: DiskImageCompression,
) -> Result<()> {
    let format = compression.hdiutil_format();
    log::info!("Converting DMG to {} format...", format);

    fs::remove_file(target).await?;

    let output = tokio::process::Command::new("hdiutil")
        .args([
            "convert",
            path_str(source)?,
            "-format",
            format,
            "-o",
            path_str(target)?,
        ])
        .output()
        .await
        .map_err(|e| Error::packaging("dmg", format!("Failed to convert DMG: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::packaging(
            "dmg",
            format!("DMG conversion failed: {}", stderr.trim()),
        ));
    }

    fs::remove_file(source).await?;

    log::info!("✓ DMG converted to {} format", format);

    Ok(())
}
