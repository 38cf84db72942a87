//! Builder for constructing Settings.

use super::{
    CodeSigningSettings, CompressionLevel, DmgSettings, MacOsSettings, PackageSettings, Settings,
};
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```
/// use kodegen_bundler_mac::bundler::{CompressionLevel, PackageSettings, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_mac::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_out_directory("dist")
///     .package_settings(PackageSettings {
///         product_name: "MyApp".into(),
///         name: "my-app".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .targets(vec!["dmg".into(), "7z".into()])
///     .compression(CompressionLevel::Maximum)
///     .build()?;
/// assert_eq!(settings.build_resources_directory(), std::path::Path::new("./build"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    project_out_directory: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    project_directory: Option<PathBuf>,
    build_resources_directory: Option<PathBuf>,
    targets: Option<Vec<String>>,
    compression: CompressionLevel,
    code_signing: CodeSigningSettings,
    macos: MacOsSettings,
    dmg: DmgSettings,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the output directory for app bundles and artifacts.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn project_out_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_out_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets the project directory.
    ///
    /// Default: current directory
    pub fn project_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the build resources directory.
    ///
    /// Default: `<project_directory>/build`
    pub fn build_resources_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_resources_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the raw target tokens. They are validated when the bundler is created.
    ///
    /// Default: None (`default` target)
    pub fn targets(mut self, targets: Vec<String>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Sets the compression policy.
    ///
    /// Default: [`CompressionLevel::Normal`]
    pub fn compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Sets certificate material.
    ///
    /// Default: none (no ephemeral keychain)
    pub fn code_signing(mut self, code_signing: CodeSigningSettings) -> Self {
        self.code_signing = code_signing;
        self
    }

    /// Sets identity overrides and signing options.
    pub fn macos_settings(mut self, macos: MacOsSettings) -> Self {
        self.macos = macos;
        self
    }

    /// Sets DMG overrides.
    pub fn dmg_settings(mut self, dmg: DmgSettings) -> Self {
        self.dmg = dmg;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing:
    /// - `project_out_directory`
    /// - `package_settings`
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let project_directory = self.project_directory.unwrap_or_else(|| PathBuf::from("."));
        let build_resources_directory = self
            .build_resources_directory
            .unwrap_or_else(|| project_directory.join("build"));

        Ok(Settings::new(
            self.package_settings
                .context("package_settings is required")?,
            project_directory,
            build_resources_directory,
            self.project_out_directory
                .context("project_out_directory is required")?,
            self.targets,
            self.compression,
            self.code_signing,
            self.macos,
            self.dmg,
        ))
    }
}
