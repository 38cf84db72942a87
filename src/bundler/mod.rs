//! macOS packaging pipeline.
//!
//! Takes a built `.app` bundle and produces the requested distributables:
//! a drag-to-install DMG, ZIP and 7z archives, and a signed Mac App Store
//! installer package. Signing runs between building and distribution with
//! credentials imported into an ephemeral keychain for the session.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_mac::bundler::{
//!     Arch, Bundler, IdentityOverrides, PackageSettings, SettingsBuilder, Toolchain,
//! };
//!
//! # async fn example() -> kodegen_bundler_mac::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .project_out_directory("dist")
//!     .package_settings(PackageSettings {
//!         product_name: "MyApp".into(),
//!         name: "my-app".into(),
//!         version: "1.0.0".into(),
//!         ..Default::default()
//!     })
//!     .build()?;
//!
//! let overrides = IdentityOverrides::from_settings(settings.macos());
//! let (toolchain, _) = Toolchain::system_with_log("build/MyApp.app");
//! let artifacts = Bundler::new(settings, toolchain, overrides)?
//!     .bundle(&[Arch::host()])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod platform;
pub mod settings;
pub mod utils;

pub use builder::{Bundler, CleanupRegistry, Toolchain};
pub use error::{Error, Result};
pub use platform::macos::{
    ArchiveSpec, Artifact, ArtifactFormat, ArtifactReporter, BuildVariant, BundleBuilder,
    CredentialContext, CredentialManager, Distributor, IdentityOverrides, LogReporter,
    PrebuiltBundleBuilder, Signer, Target, TargetSet, artifact_file_name,
};
pub use settings::{
    Arch, CodeSigningSettings, CompressionLevel, DmgSettings, MacOsSettings, PackageSettings,
    Settings, SettingsBuilder,
};
