//! Command line argument parsing and validation.
//!
//! Signing material is usually provided through CI secrets, so every
//! signing flag can also be set from its conventional environment variable.

use crate::bundler::{
    Arch, CodeSigningSettings, CompressionLevel, Result as BundleResult, TargetSet,
};
use clap::Parser;
use std::path::PathBuf;

/// macOS packager for prebuilt .app bundles
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_mac",
    version,
    about = "Signs a macOS .app bundle and packages it as DMG, ZIP, 7z or Mac App Store pkg",
    long_about = "Signs a prebuilt macOS .app bundle and produces the requested distributables.

Targets: default (dmg + zip), dmg, zip, 7z, mas.

Usage:
  kodegen_bundler_mac --app target/release/bundle/osx/MyApp.app
  kodegen_bundler_mac --app MyApp.app --target dmg,7z --compression maximum
  CSC_LINK=cert.p12 CSC_KEY_PASSWORD=... kodegen_bundler_mac --app MyApp.app --target mas

Exit code 0 = every requested artifact was produced."
)]
pub struct Args {
    /// Path to Cargo.toml with [package.metadata.bundle.mac]
    #[arg(short, long, value_name = "PATH", default_value = "Cargo.toml")]
    pub manifest: PathBuf,

    /// Prebuilt .app bundle to package
    #[arg(short, long, value_name = "APP")]
    pub app: PathBuf,

    /// Output directory (default: <manifest dir>/dist)
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Targets: default, dmg, zip, 7z, mas (repeatable or comma separated)
    #[arg(short, long, value_name = "TARGET", value_delimiter = ',')]
    pub target: Vec<String>,

    /// Architectures: x64, arm64, universal (default: host)
    #[arg(long, value_name = "ARCH", value_delimiter = ',')]
    pub arch: Vec<Arch>,

    /// Compression: store, normal, maximum
    #[arg(short, long, value_name = "LEVEL")]
    pub compression: Option<CompressionLevel>,

    /// Signing certificate (.p12 path, file:// URL or base64)
    #[arg(long, env = "CSC_LINK", hide_env_values = true)]
    pub csc_link: Option<String>,

    /// Password of the signing certificate
    #[arg(long, env = "CSC_KEY_PASSWORD", hide_env_values = true)]
    pub csc_key_password: Option<String>,

    /// Installer certificate for Mac App Store packages
    #[arg(long, env = "CSC_INSTALLER_LINK", hide_env_values = true)]
    pub csc_installer_link: Option<String>,

    /// Password of the installer certificate (defaults to CSC_KEY_PASSWORD)
    #[arg(long, env = "CSC_INSTALLER_KEY_PASSWORD", hide_env_values = true)]
    pub csc_installer_key_password: Option<String>,

    /// Intermediate certificate imported alongside the signing certificate
    #[arg(long, env = "CSA_LINK", hide_env_values = true)]
    pub csa_link: Option<String>,

    /// Application signing identity (overrides the manifest, falls back to CSC_NAME)
    #[arg(long, value_name = "NAME")]
    pub identity: Option<String>,

    /// Installer signing identity (overrides the manifest, falls back to CSC_INSTALLER_NAME)
    #[arg(long, value_name = "NAME")]
    pub installer_identity: Option<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolves `--target` values, `None` when none were given.
    ///
    /// Runs before the manifest or bundle is touched, so a typo fails fast.
    pub fn resolve_targets(&self) -> BundleResult<Option<TargetSet>> {
        if self.target.is_empty() {
            return Ok(None);
        }
        TargetSet::resolve(Some(&self.target[..])).map(Some)
    }

    /// Certificate material from flags and environment.
    pub fn code_signing(&self) -> CodeSigningSettings {
        CodeSigningSettings {
            certificate: non_empty(&self.csc_link),
            certificate_password: non_empty(&self.csc_key_password),
            installer_certificate: non_empty(&self.csc_installer_link),
            installer_certificate_password: non_empty(&self.csc_installer_key_password),
            auxiliary_certificate: non_empty(&self.csa_link),
        }
    }

    /// Architectures to package, the host's when none were given.
    pub fn archs(&self) -> Vec<Arch> {
        if self.arch.is_empty() {
            vec![Arch::host()]
        } else {
            self.arch.clone()
        }
    }
}

// CI systems export unset secrets as empty strings
fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kodegen_bundler_mac").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn targets_accept_commas_and_repetition() {
        let args = parse(&["--app", "My.app", "--target", "dmg,zip", "-t", "mas"]);
        assert_eq!(args.target, ["dmg", "zip", "mas"]);
        let targets = args.resolve_targets().unwrap().unwrap();
        assert!(targets.wants_store_variant());
        assert!(targets.wants_direct_variant());
    }

    #[test]
    fn unknown_target_fails_before_anything_else() {
        let args = parse(&["--app", "My.app", "--target", "dmg,bogus"]);
        let err = args.resolve_targets().unwrap_err();
        assert_eq!(err.to_string(), "Unknown target: bogus");
    }

    #[test]
    fn no_targets_defers_to_manifest() {
        let args = parse(&["--app", "My.app"]);
        assert!(args.resolve_targets().unwrap().is_none());
        assert_eq!(args.archs(), [Arch::host()]);
    }

    #[test]
    fn compression_and_arch_are_parsed() {
        let args = parse(&[
            "--app",
            "My.app",
            "--compression",
            "store",
            "--arch",
            "x64,arm64",
        ]);
        assert_eq!(args.compression, Some(CompressionLevel::Store));
        assert_eq!(args.archs(), [Arch::X64, Arch::Arm64]);
    }

    #[test]
    fn empty_secrets_are_ignored() {
        let mut args = parse(&["--app", "My.app"]);
        args.csc_link = Some(String::new());
        args.csc_key_password = Some("secret".into());
        let signing = args.code_signing();
        assert_eq!(signing.certificate, None);
        assert!(!signing.has_certificate());
    }
}
