//! Code signing of `.app` bundles and Mac App Store installer packages.
//!
//! Direct distribution builds are signed when an identity is available and
//! left unsigned otherwise. Mac App Store builds must be signed with both an
//! application and an installer identity; signing then flattens the bundle
//! into a signed `.pkg`.

use super::{
    artifact::{Artifact, ArtifactFormat, ArtifactReporter, artifact_file_name},
    credentials::{CredentialContext, CredentialManager},
    variant::BuildVariant,
};
use crate::bundler::{
    error::{Error, Result, path_str},
    settings::{MacOsSettings, Settings},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Application signing request.
#[derive(Clone, Debug, PartialEq)]
pub struct SignRequest {
    /// Bundle to sign in place.
    pub app: PathBuf,
    /// Identity to sign with.
    pub identity: String,
    /// Variant being signed, decides platform rules.
    pub variant: BuildVariant,
    /// Keychain holding the identity.
    pub keychain: Option<String>,
    /// User passthrough options.
    pub options: Map<String, Value>,
}

/// Installer package request.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatRequest {
    /// Signed bundle to package.
    pub app: PathBuf,
    /// Package to write.
    pub pkg: PathBuf,
    /// Installer identity.
    pub identity: String,
    /// Keychain holding the identity.
    pub keychain: Option<String>,
}

/// External signing tool.
#[async_trait]
pub trait SigningTool: Send + Sync {
    /// Embeds a signature into the bundle.
    async fn sign(&self, request: &SignRequest) -> Result<()>;

    /// Produces a signed flat installer package from a signed bundle.
    async fn flat(&self, request: &FlatRequest) -> Result<()>;
}

/// [`SigningTool`] backed by `codesign` and `productbuild`.
#[derive(Debug, Default)]
pub struct CodesignTool;

#[async_trait]
impl SigningTool for CodesignTool {
    async fn sign(&self, request: &SignRequest) -> Result<()> {
        let args = codesign_args(request)?;
        log::debug!("codesign {}", args.join(" "));

        let output = tokio::process::Command::new("codesign")
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::Signing(format!("Failed to execute codesign: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Signing(format!(
                "codesign failed for {}: {}",
                request.app.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn flat(&self, request: &FlatRequest) -> Result<()> {
        let args = productbuild_args(request)?;
        log::debug!("productbuild {}", args.join(" "));

        let output = tokio::process::Command::new("productbuild")
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                Error::packaging(ArtifactFormat::Pkg, format!("Failed to execute productbuild: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::packaging(
                ArtifactFormat::Pkg,
                format!("productbuild failed: {}", stderr.trim()),
            ));
        }

        Ok(())
    }
}

/// Arguments for `codesign`.
///
/// Passthrough options: `entitlements` (path), `hardened-runtime` (bool),
/// `timestamp` (bool or server URL), `deep` (bool). `identity` is applied
/// by the [`Signer`] before the request is built.
pub fn codesign_args(request: &SignRequest) -> Result<Vec<String>> {
    let options = &request.options;
    let mut args = vec![
        "--force".to_string(),
        "--sign".to_string(),
        request.identity.clone(),
    ];

    if let Some(keychain) = &request.keychain {
        args.extend(["--keychain".to_string(), keychain.clone()]);
    }

    let hardened = options
        .get("hardened-runtime")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| request.variant.hardened_runtime());
    if hardened {
        args.extend(["--options".to_string(), "runtime".to_string()]);
    }

    match options.get("timestamp") {
        Some(Value::String(url)) => args.push(format!("--timestamp={url}")),
        Some(Value::Bool(false)) => {}
        Some(Value::Bool(true)) => args.push("--timestamp".to_string()),
        _ if request.variant.hardened_runtime() => args.push("--timestamp".to_string()),
        _ => {}
    }

    if let Some(entitlements) = options.get("entitlements").and_then(Value::as_str) {
        args.extend(["--entitlements".to_string(), entitlements.to_string()]);
    }

    if options.get("deep").and_then(Value::as_bool).unwrap_or(false) {
        args.push("--deep".to_string());
    }

    for key in options.keys() {
        if !matches!(
            key.as_str(),
            "identity" | "entitlements" | "hardened-runtime" | "timestamp" | "deep"
        ) {
            log::debug!("Ignoring unsupported signing option: {}", key);
        }
    }

    args.push(path_str(&request.app)?.to_string());
    Ok(args)
}

/// Arguments for `productbuild`.
pub fn productbuild_args(request: &FlatRequest) -> Result<Vec<String>> {
    let mut args = vec![
        "--component".to_string(),
        path_str(&request.app)?.to_string(),
        "/Applications".to_string(),
        "--sign".to_string(),
        request.identity.clone(),
    ];
    if let Some(keychain) = &request.keychain {
        args.extend(["--keychain".to_string(), keychain.clone()]);
    }
    args.push(path_str(&request.pkg)?.to_string());
    Ok(args)
}

/// Identity names used when no keychain identity resolves.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdentityOverrides {
    /// Application identity.
    pub name: Option<String>,
    /// Installer identity.
    pub installer_name: Option<String>,
}

impl IdentityOverrides {
    /// Settings first, then `CSC_NAME` / `CSC_INSTALLER_NAME`.
    pub fn from_settings(macos: &MacOsSettings) -> Self {
        Self::from_lookup(macos, |key| std::env::var(key).ok())
    }

    /// Like [`IdentityOverrides::from_settings`] with a custom environment.
    pub fn from_lookup(macos: &MacOsSettings, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            name: non_empty(macos.identity.clone()).or_else(|| non_empty(env("CSC_NAME"))),
            installer_name: non_empty(macos.installer_identity.clone())
                .or_else(|| non_empty(env("CSC_INSTALLER_NAME"))),
        }
    }
}

/// Signs bundles for both variants.
pub struct Signer {
    credentials: Arc<CredentialManager>,
    overrides: IdentityOverrides,
    options: Map<String, Value>,
    tool: Arc<dyn SigningTool>,
    reporter: Arc<dyn ArtifactReporter>,
    product_name: String,
    package_name: String,
    version: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Creates a signer for the given settings.
    pub fn new(
        settings: &Settings,
        credentials: Arc<CredentialManager>,
        overrides: IdentityOverrides,
        tool: Arc<dyn SigningTool>,
        reporter: Arc<dyn ArtifactReporter>,
    ) -> Self {
        Self {
            credentials,
            overrides,
            options: settings.macos().sign_options.clone(),
            tool,
            reporter,
            product_name: settings.product_name().to_string(),
            package_name: settings.package_name().to_string(),
            version: settings.version_string().to_string(),
        }
    }

    /// Signs `bundle` for `variant`.
    ///
    /// Returns the installer package for [`BuildVariant::Store`], `None`
    /// otherwise. Direct builds without any identity are left unsigned.
    pub async fn sign(&self, bundle: &Path, variant: BuildVariant) -> Result<Option<Artifact>> {
        let context = match self.credentials.context().await {
            Ok(context) => context,
            Err(e) if !variant.signing_required() && self.overrides.name.is_none() => {
                log::warn!("App is not signed: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let CredentialContext {
            name,
            installer_name,
            keychain,
        } = context;
        let name = name.or_else(|| self.overrides.name.clone());
        let installer_name = installer_name.or_else(|| self.overrides.installer_name.clone());

        if variant.produces_installer() && installer_name.is_none() {
            return Err(Error::MissingInstallerIdentity);
        }

        let Some(name) = name else {
            if variant.signing_required() {
                return Err(Error::MissingSigningIdentity);
            }
            log::warn!("App is not signed: CSC_LINK or CSC_NAME are not specified");
            return Ok(None);
        };

        let identity = self
            .options
            .get("identity")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(name);

        log::info!("Signing app ({}) as \"{}\"", variant, identity);
        self.tool
            .sign(&SignRequest {
                app: bundle.to_path_buf(),
                identity,
                variant,
                keychain: keychain.clone(),
                options: self.options.clone(),
            })
            .await?;

        let Some(installer_identity) = installer_name.filter(|_| variant.produces_installer())
        else {
            return Ok(None);
        };

        let pkg_name = artifact_file_name(&self.product_name, &self.version, None, ArtifactFormat::Pkg);
        let pkg = bundle
            .parent()
            .map(|dir| dir.join(&pkg_name))
            .unwrap_or_else(|| PathBuf::from(&pkg_name));

        log::info!("Creating installer package {}", pkg.display());
        self.tool
            .flat(&FlatRequest {
                app: bundle.to_path_buf(),
                pkg: pkg.clone(),
                identity: installer_identity,
                keychain,
            })
            .await?;

        let artifact = Artifact::new(
            pkg,
            artifact_file_name(&self.package_name, &self.version, None, ArtifactFormat::Pkg),
        );
        self.reporter.artifact_created(&artifact);
        Ok(Some(artifact))
    }
}
