//! macOS platform-specific settings.

use serde_json::{Map, Value};

/// Archive and disk image compression policy.
///
/// - `store`: no compression (uncompressed DMG, `Copy` archive method)
/// - `normal`: default compression
/// - `maximum`: best ratio, tunes the archiver's match finder and pass count
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression.
    Store,
    /// Standard compression.
    #[default]
    Normal,
    /// Best compression ratio.
    Maximum,
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(Self::Store),
            "normal" => Ok(Self::Normal),
            "maximum" => Ok(Self::Maximum),
            other => Err(format!(
                "Invalid compression: {other}. Valid values: store, normal, maximum"
            )),
        }
    }
}

/// Certificate material used to set up an ephemeral keychain.
///
/// Locators are file paths (`file://` accepted) or base64-encoded `.p12`
/// data, as exported into CI secrets.
///
/// A keychain is only created when both `certificate` and
/// `certificate_password` are set.
#[derive(Clone, Default)]
pub struct CodeSigningSettings {
    /// Application signing certificate (`CSC_LINK`).
    pub certificate: Option<String>,
    /// Password of the application certificate (`CSC_KEY_PASSWORD`).
    pub certificate_password: Option<String>,
    /// Installer signing certificate (`CSC_INSTALLER_LINK`).
    pub installer_certificate: Option<String>,
    /// Password of the installer certificate (`CSC_INSTALLER_KEY_PASSWORD`).
    pub installer_certificate_password: Option<String>,
    /// Auxiliary chain certificate, e.g. Apple WWDR intermediate (`CSA_LINK`).
    pub auxiliary_certificate: Option<String>,
}

impl CodeSigningSettings {
    /// Whether the application certificate and its password are both present.
    pub fn has_certificate(&self) -> bool {
        self.certificate.is_some() && self.certificate_password.is_some()
    }
}

// Passwords stay out of logs.
impl std::fmt::Debug for CodeSigningSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSigningSettings")
            .field("certificate", &self.certificate.as_ref().map(|_| "<set>"))
            .field(
                "installer_certificate",
                &self.installer_certificate.as_ref().map(|_| "<set>"),
            )
            .field(
                "auxiliary_certificate",
                &self.auxiliary_certificate.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

/// macOS signing configuration.
///
/// # Configuration
///
/// Add to `Cargo.toml`:
///
/// ```toml
/// [package.metadata.bundle.mac]
/// identity = "Developer ID Application: Your Name (TEAMID)"
/// installer-identity = "3rd Party Mac Developer Installer: Your Name (TEAMID)"
///
/// [package.metadata.bundle.mac.sign-options]
/// entitlements = "build/entitlements.mac.plist"
/// ```
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MacOsSettings {
    /// Application signing identity used when no keychain identity resolves.
    ///
    /// Falls back to `CSC_NAME`.
    #[serde(default)]
    pub identity: Option<String>,

    /// Installer signing identity used when no keychain identity resolves.
    ///
    /// Falls back to `CSC_INSTALLER_NAME`.
    #[serde(default)]
    pub installer_identity: Option<String>,

    /// Free-form options merged into every `codesign` invocation.
    ///
    /// Recognised keys: `identity`, `entitlements`, `hardened-runtime`,
    /// `timestamp`, `deep`.
    #[serde(default)]
    pub sign_options: Map<String, Value>,
}

/// macOS DMG disk image configuration.
///
/// Holds user overrides that are deep-merged onto the built-in disk image
/// layout (title, icon, window geometry, icon positions).
///
/// # Configuration
///
/// ```toml
/// [package.metadata.bundle.mac.dmg]
/// background = "assets/dmg-background.png"
/// icon-size = 96
///
/// [package.metadata.bundle.mac.dmg.window.size]
/// width = 640
/// ```
#[derive(Clone, Debug, Default)]
pub struct DmgSettings {
    /// Override tree, `None` when the user configured nothing.
    pub overrides: Option<Map<String, Value>>,
}

impl DmgSettings {
    /// Whether the user explicitly set `key` (even to `null`).
    pub fn overrides_key(&self, key: &str) -> bool {
        self.overrides
            .as_ref()
            .is_some_and(|map| map.contains_key(key))
    }
}
