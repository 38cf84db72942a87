//! Build variants: Mac App Store versus direct distribution.
//!
//! Each variant carries its own naming and signing rules so nothing
//! downstream compares platform strings.

use crate::bundler::settings::Arch;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// One of the two packaging branches.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BuildVariant {
    /// Mac App Store: signing mandatory, produces a signed `.pkg`.
    Store,
    /// Everything else (DMG, ZIP, 7z): signing optional.
    Direct,
}

impl BuildVariant {
    /// Platform label passed to the signing tool and used in directory names.
    pub fn platform_label(&self) -> &'static str {
        match self {
            BuildVariant::Store => "mas",
            BuildVariant::Direct => "darwin",
        }
    }

    /// Whether an unsigned bundle is acceptable for this variant.
    pub fn signing_required(&self) -> bool {
        matches!(self, BuildVariant::Store)
    }

    /// Whether signing produces an installer package.
    pub fn produces_installer(&self) -> bool {
        matches!(self, BuildVariant::Store)
    }

    /// Whether the signature uses the hardened runtime with a secure timestamp.
    ///
    /// Required for Developer ID distribution; App Store submissions are
    /// re-signed by Apple.
    pub fn hardened_runtime(&self) -> bool {
        matches!(self, BuildVariant::Direct)
    }

    /// `<out>/<product>-<platform>-<arch>`
    pub fn app_out_dir(&self, out_dir: &Path, product_name: &str, arch: Arch) -> PathBuf {
        out_dir.join(format!("{}-{}-{}", product_name, self.platform_label(), arch))
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform_label())
    }
}
