//! Package metadata and macOS bundle configuration from a single Cargo.toml

use crate::bundler::CompressionLevel;
use crate::error::{BundlerError, CliError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Package metadata extracted from Cargo.toml
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    /// Package name from Cargo.toml
    pub name: String,

    /// Package description from Cargo.toml
    pub description: String,

    /// Package version from Cargo.toml (e.g., "0.1.0")
    pub version: String,
}

/// `[package.metadata.bundle.mac]`
///
/// ```toml
/// [package.metadata.bundle.mac]
/// product-name = "MyApp"
/// target = ["dmg", "zip"]
/// compression = "maximum"
/// identity = "Developer ID Application: Your Name (TEAMID)"
///
/// [package.metadata.bundle.mac.sign-options]
/// entitlements = "build/entitlements.mac.plist"
///
/// [package.metadata.bundle.mac.dmg]
/// icon-size = 96
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MacBundleMetadata {
    /// Display name of the app, defaults to the package name.
    #[serde(default)]
    pub product_name: Option<String>,

    /// Targets, a single string or a list.
    #[serde(default)]
    pub target: Option<OneOrMany>,

    /// Compression policy.
    #[serde(default)]
    pub compression: Option<CompressionLevel>,

    /// Application identity override.
    #[serde(default)]
    pub identity: Option<String>,

    /// Installer identity override.
    #[serde(default)]
    pub installer_identity: Option<String>,

    /// `codesign` passthrough options.
    #[serde(default)]
    pub sign_options: Map<String, Value>,

    /// DMG layout overrides.
    #[serde(default)]
    pub dmg: Option<Map<String, Value>>,
}

/// A TOML value that may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// `target = "dmg"`
    One(String),
    /// `target = ["dmg", "zip"]`
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flattens into a list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Complete manifest data from Cargo.toml
#[derive(Debug, Clone)]
pub struct CargoManifest {
    /// Package metadata ([package] section)
    pub metadata: PackageMetadata,

    /// macOS bundle configuration
    pub mac: MacBundleMetadata,

    /// Directory containing Cargo.toml
    pub manifest_dir: PathBuf,
}

/// Load complete manifest from Cargo.toml (single read + parse)
pub fn load_manifest(cargo_toml_path: &Path) -> Result<CargoManifest> {
    let manifest = std::fs::read_to_string(cargo_toml_path).map_err(|e| {
        BundlerError::Cli(CliError::ExecutionFailed {
            command: "read_cargo_toml".to_string(),
            reason: format!("Failed to read {}: {}", cargo_toml_path.display(), e),
        })
    })?;

    let toml_value: toml::Value = toml::from_str(&manifest)?;

    let package = toml_value.get("package").ok_or_else(|| {
        BundlerError::Cli(CliError::InvalidArguments {
            reason: "No [package] section in Cargo.toml".to_string(),
        })
    })?;

    let required = |key: &str| -> Result<String> {
        package
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                BundlerError::Cli(CliError::InvalidArguments {
                    reason: format!("Missing '{key}' in [package]"),
                })
            })
    };

    let metadata = PackageMetadata {
        name: required("name")?,
        version: required("version")?,
        description: package
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    };

    let mac = parse_mac_metadata(package)?;

    let manifest_dir = match cargo_toml_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok(CargoManifest {
        metadata,
        mac,
        manifest_dir,
    })
}

/// Parse `[package.metadata.bundle.mac]`, empty when absent.
fn parse_mac_metadata(package: &toml::Value) -> Result<MacBundleMetadata> {
    let Some(section) = package
        .get("metadata")
        .and_then(|m| m.get("bundle"))
        .and_then(|b| b.get("mac"))
    else {
        log::debug!("No [package.metadata.bundle.mac] section, using defaults");
        return Ok(MacBundleMetadata::default());
    };

    section.clone().try_into().map_err(|e: toml::de::Error| {
        BundlerError::Cli(CliError::InvalidArguments {
            reason: format!("Invalid [package.metadata.bundle.mac]: {}", e.message()),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("Cargo.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_package_and_mac_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[package]
name = "my-app"
version = "1.2.3"
description = "An app"

[package.metadata.bundle.mac]
product-name = "MyApp"
target = ["dmg", "7z"]
compression = "maximum"
installer-identity = "3rd Party Mac Developer Installer: Me"

[package.metadata.bundle.mac.sign-options]
entitlements = "build/entitlements.plist"
deep = true

[package.metadata.bundle.mac.dmg.window.size]
width = 640
"#,
        );

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.metadata.name, "my-app");
        assert_eq!(manifest.metadata.version, "1.2.3");
        assert_eq!(manifest.manifest_dir, dir.path());

        let mac = manifest.mac;
        assert_eq!(mac.product_name.as_deref(), Some("MyApp"));
        assert_eq!(
            mac.target.map(OneOrMany::into_vec),
            Some(vec!["dmg".to_string(), "7z".to_string()])
        );
        assert_eq!(mac.compression, Some(CompressionLevel::Maximum));
        assert_eq!(mac.identity, None);
        assert_eq!(mac.sign_options["deep"], Value::Bool(true));
        assert_eq!(mac.dmg.unwrap()["window"]["size"]["width"], 640);
    }

    #[test]
    fn single_target_string_and_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[package]
name = "my-app"
version = "0.1.0"

[package.metadata.bundle.mac]
target = "mas"
"#,
        );
        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.mac.target, Some(OneOrMany::One("mas".into())));
        assert_eq!(manifest.metadata.description, "");

        let path = write(dir.path(), "[package]\nname = \"a\"\nversion = \"1.0.0\"\n");
        let manifest = load_manifest(&path).unwrap();
        assert!(manifest.mac.target.is_none());
        assert!(manifest.mac.dmg.is_none());
    }

    #[test]
    fn missing_version_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[package]\nname = \"a\"\n");
        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("Missing 'version'"));
    }

    #[test]
    fn invalid_compression_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "[package]\nname = \"a\"\nversion = \"1.0.0\"\n[package.metadata.bundle.mac]\ncompression = \"ultra\"\n",
        );
        assert!(load_manifest(&path).is_err());
    }
}
