//! External tool detection and availability checking.
//!
//! Looked up once per process; missing tools turn into packaging errors
//! only when a target actually needs them.

use std::{path::PathBuf, sync::LazyLock};

/// Location of the 7-Zip command line tool used for ZIP and 7z archives.
///
/// `7za` is preferred, `7zz` (official macOS build) and `7z` are accepted.
pub static SEVEN_ZIP: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    for candidate in ["7za", "7zz", "7z"] {
        match which::which(candidate) {
            Ok(path) => {
                log::debug!("Found {} at: {}", candidate, path.display());
                return Some(path);
            }
            Err(e) => log::debug!("{} not found in PATH: {}", candidate, e),
        }
    }
    log::warn!("7-Zip not found in PATH. ZIP and 7z targets will fail.");
    None
});

/// Whether `hdiutil` is available for DMG creation.
pub static HAS_HDIUTIL: LazyLock<bool> = LazyLock::new(|| match which::which("hdiutil") {
    Ok(path) => {
        log::debug!("Found hdiutil at: {}", path.display());
        true
    }
    Err(e) => {
        log::debug!("hdiutil not found in PATH: {}. DMG targets will fail.", e);
        false
    }
});
