//! Core Settings struct and implementations.

use super::{CodeSigningSettings, CompressionLevel, DmgSettings, MacOsSettings, PackageSettings};
use std::path::{Path, PathBuf};

/// Main settings for bundler operations.
///
/// Central configuration for the bundler, constructed via [`SettingsBuilder`].
///
/// # Examples
///
/// ```
/// use kodegen_bundler_mac::bundler::{PackageSettings, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_mac::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_out_directory("target/dist")
///     .package_settings(PackageSettings {
///         product_name: "MyApp".into(),
///         name: "my-app".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .build()?;
/// assert_eq!(settings.app_bundle_name(), "MyApp.app");
/// # Ok(())
/// # }
/// ```
///
/// [`SettingsBuilder`]: super::SettingsBuilder
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package metadata.
    package: PackageSettings,

    /// Directory the project lives in. Relative DMG paths resolve against it.
    project_directory: PathBuf,

    /// Build resources (`icon.icns`, `background.png`).
    build_resources_directory: PathBuf,

    /// Output directory for bundles and artifacts.
    project_out_directory: PathBuf,

    /// Raw target tokens, `None` means `default`.
    targets: Option<Vec<String>>,

    compression: CompressionLevel,

    code_signing: CodeSigningSettings,

    macos: MacOsSettings,

    dmg: DmgSettings,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the package name used in artifact display names.
    pub fn package_name(&self) -> &str {
        &self.package.name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the package description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// `MyApp.app`
    pub fn app_bundle_name(&self) -> String {
        format!("{}.app", self.product_name())
    }

    /// Returns the project directory.
    pub fn project_directory(&self) -> &Path {
        &self.project_directory
    }

    /// Returns the build resources directory.
    pub fn build_resources_directory(&self) -> &Path {
        &self.build_resources_directory
    }

    /// Returns the project output directory.
    pub fn project_out_directory(&self) -> &Path {
        &self.project_out_directory
    }

    /// Returns the raw target tokens, unvalidated.
    pub fn targets(&self) -> Option<&[String]> {
        self.targets.as_deref()
    }

    /// Returns the compression policy.
    pub fn compression(&self) -> CompressionLevel {
        self.compression
    }

    /// Returns the certificate material.
    pub fn code_signing(&self) -> &CodeSigningSettings {
        &self.code_signing
    }

    /// Returns the macOS signing settings.
    pub fn macos(&self) -> &MacOsSettings {
        &self.macos
    }

    /// Returns the DMG settings.
    pub fn dmg(&self) -> &DmgSettings {
        &self.dmg
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        package: PackageSettings,
        project_directory: PathBuf,
        build_resources_directory: PathBuf,
        project_out_directory: PathBuf,
        targets: Option<Vec<String>>,
        compression: CompressionLevel,
        code_signing: CodeSigningSettings,
        macos: MacOsSettings,
        dmg: DmgSettings,
    ) -> Self {
        Self {
            package,
            project_directory,
            build_resources_directory,
            project_out_directory,
            targets,
            compression,
            code_signing,
            macos,
            dmg,
        }
    }
}
