//! `.app` bundle production for a build variant.
//!
//! Compiling and assembling the bundle is out of scope for the packager;
//! the bundle builder only has to put a bundle into the variant's output
//! directory so signing and distribution can work on a private copy.

use super::variant::BuildVariant;
use crate::{
    bail,
    bundler::{
        error::{Context, Result},
        settings::Arch,
        utils::fs,
    },
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Produces the `.app` bundle for one variant and architecture.
#[async_trait]
pub trait BundleBuilder: Send + Sync {
    /// Writes the bundle into `app_out_dir` and returns its path.
    async fn build(&self, app_out_dir: &Path, arch: Arch, variant: BuildVariant) -> Result<PathBuf>;
}

/// [`BundleBuilder`] that copies an already built bundle.
#[derive(Clone, Debug)]
pub struct PrebuiltBundleBuilder {
    source: PathBuf,
}

impl PrebuiltBundleBuilder {
    /// Uses the bundle at `source` for every variant and architecture.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The bundle being copied.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[async_trait]
impl BundleBuilder for PrebuiltBundleBuilder {
    async fn build(&self, app_out_dir: &Path, arch: Arch, variant: BuildVariant) -> Result<PathBuf> {
        if !self.source.is_dir() {
            bail!("App bundle not found: {}", self.source.display());
        }

        let bundle_name = self
            .source
            .file_name()
            .context("App bundle path has no file name")?;
        let dest = app_out_dir.join(bundle_name);

        log::info!(
            "Preparing {} bundle for {} in {}",
            variant,
            arch,
            app_out_dir.display()
        );

        // Signing modifies the bundle in place, never reuse a previous copy
        fs::remove_dir_all(&dest).await?;
        fs::create_dir_all(app_out_dir, false).await?;
        fs::copy_dir(&self.source, &dest).await?;

        log::debug!("Copied {} to {}", self.source.display(), dest.display());
        Ok(dest)
    }
}
