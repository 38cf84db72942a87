//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that sequences the
//! store and direct-distribution branches for every architecture.

use super::cleanup::CleanupRegistry;
use crate::bundler::{
    Result, Settings,
    platform::macos::{
        Archiver, Artifact, ArtifactReporter, BuildVariant, BundleBuilder, CodesignTool,
        CredentialManager, Distributor, IdentityOverrides, KeychainTool, LogReporter,
        PrebuiltBundleBuilder, SecurityCli, SevenZipArchiver, Signer, SigningTool, TargetSet,
        dmg::{DiskImageTool, HdiutilDiskImageTool},
    },
    settings::Arch,
};
use std::{path::PathBuf, sync::Arc};

/// External collaborators used by a [`Bundler`].
#[derive(Clone)]
pub struct Toolchain {
    /// Produces `.app` bundles.
    pub bundle_builder: Arc<dyn BundleBuilder>,
    /// Ephemeral keychain operations.
    pub keychain: Arc<dyn KeychainTool>,
    /// `codesign` / `productbuild`.
    pub signing: Arc<dyn SigningTool>,
    /// DMG creation.
    pub disk_images: Arc<dyn DiskImageTool>,
    /// ZIP and 7z creation.
    pub archiver: Arc<dyn Archiver>,
    /// Artifact notifications.
    pub reporter: Arc<dyn ArtifactReporter>,
}

impl Toolchain {
    /// The system tools, packaging the prebuilt bundle at `app`.
    pub fn system(app: impl Into<PathBuf>, reporter: Arc<dyn ArtifactReporter>) -> Self {
        Self {
            bundle_builder: Arc::new(PrebuiltBundleBuilder::new(app)),
            keychain: Arc::new(SecurityCli::new()),
            signing: Arc::new(CodesignTool),
            disk_images: Arc::new(HdiutilDiskImageTool),
            archiver: Arc::new(SevenZipArchiver),
            reporter,
        }
    }

    /// Like [`Toolchain::system`] with a [`LogReporter`].
    pub fn system_with_log(app: impl Into<PathBuf>) -> (Self, Arc<LogReporter>) {
        let reporter = Arc::new(LogReporter::new());
        (Self::system(app, reporter.clone()), reporter)
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}

/// Main bundler orchestrator.
///
/// One `Bundler` is one packaging session: targets are resolved once,
/// signing credentials are set up at most once and torn down when
/// [`Bundler::bundle`] returns. `bundle` consumes the session, so a
/// deleted keychain can never be signed against again.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_mac::bundler::{
///     Arch, Bundler, IdentityOverrides, PackageSettings, SettingsBuilder, Toolchain,
/// };
///
/// # async fn example() -> kodegen_bundler_mac::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_out_directory("dist")
///     .package_settings(PackageSettings {
///         product_name: "MyApp".into(),
///         name: "my-app".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .targets(vec!["dmg".into(), "zip".into()])
///     .build()?;
///
/// let overrides = IdentityOverrides::from_settings(settings.macos());
/// let (toolchain, _reporter) = Toolchain::system_with_log("build/MyApp.app");
/// let bundler = Bundler::new(settings, toolchain, overrides)?;
///
/// for artifact in bundler.bundle(&[Arch::Arm64]).await? {
///     println!("Created: {}", artifact.display_name());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Bundler {
    settings: Arc<Settings>,
    targets: TargetSet,
    cleanup: CleanupRegistry,
    bundle_builder: Arc<dyn BundleBuilder>,
    signer: Signer,
    distributor: Distributor,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("targets", &self.targets)
            .field("cleanup", &self.cleanup)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl Bundler {
    /// Creates a new bundler session.
    ///
    /// Fails with [`crate::bundler::Error::InvalidTarget`] before anything
    /// touches the file system or a keychain.
    pub fn new(settings: Settings, toolchain: Toolchain, overrides: IdentityOverrides) -> Result<Self> {
        let targets = TargetSet::resolve(settings.targets())?;
        log::debug!("Resolved targets: {}", targets);

        let settings = Arc::new(settings);
        let cleanup = CleanupRegistry::new();
        let credentials = Arc::new(CredentialManager::new(
            settings.code_signing(),
            toolchain.keychain,
            &cleanup,
        ));

        let signer = Signer::new(
            &settings,
            credentials,
            overrides,
            toolchain.signing,
            toolchain.reporter.clone(),
        );
        let distributor = Distributor::new(
            settings.clone(),
            toolchain.disk_images,
            toolchain.archiver,
            toolchain.reporter,
        );

        Ok(Self {
            settings,
            targets,
            cleanup,
            bundle_builder: toolchain.bundle_builder,
            signer,
            distributor,
        })
    }

    /// Packages every architecture in turn.
    ///
    /// Registered cleanup actions run before this returns, whether
    /// packaging succeeded or not. Start a new session to package again.
    pub async fn bundle(self, archs: &[Arch]) -> Result<Vec<Artifact>> {
        let result = self.bundle_archs(archs).await;
        self.cleanup.run_all().await;
        result
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolved target set.
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    async fn bundle_archs(&self, archs: &[Arch]) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for &arch in archs {
            artifacts.extend(self.pack(arch).await?);
        }
        Ok(artifacts)
    }

    /// Runs the store and direct branches for `arch` concurrently.
    ///
    /// Both branches run to completion; the store branch's error is
    /// reported first when both fail.
    async fn pack(&self, arch: Arch) -> Result<Vec<Artifact>> {
        log::info!("Packaging {} for {} ({})", self.settings.product_name(), arch, self.targets);

        let store = async {
            if self.targets.wants_store_variant() {
                self.pack_variant(arch, BuildVariant::Store).await
            } else {
                Ok(Vec::new())
            }
        };
        let direct = async {
            if self.targets.wants_direct_variant() {
                self.pack_variant(arch, BuildVariant::Direct).await
            } else {
                Ok(Vec::new())
            }
        };

        let (store, direct) = tokio::join!(store, direct);
        let mut artifacts = store?;
        artifacts.extend(direct?);
        Ok(artifacts)
    }

    /// build → sign → distribute for one variant.
    async fn pack_variant(&self, arch: Arch, variant: BuildVariant) -> Result<Vec<Artifact>> {
        let app_out_dir = variant.app_out_dir(
            self.settings.project_out_directory(),
            self.settings.product_name(),
            arch,
        );

        let bundle = self
            .bundle_builder
            .build(&app_out_dir, arch, variant)
            .await?;

        let installer = self.signer.sign(&bundle, variant).await?;

        match variant {
            BuildVariant::Store => Ok(installer.into_iter().collect()),
            BuildVariant::Direct => {
                self.distributor
                    .distribute(&app_out_dir, &bundle, &self.targets)
                    .await
            }
        }
    }
}
