//! Command line interface for the macOS packager.
//!
//! Turns arguments and `Cargo.toml` metadata into [`Settings`], runs one
//! packaging session and prints the produced artifacts.

mod args;

pub use args::Args;

use anyhow::Context;

use crate::{
    bundler::{
        Artifact, Bundler, DmgSettings, IdentityOverrides, MacOsSettings, PackageSettings,
        Settings, SettingsBuilder, Toolchain,
    },
    error::Result,
    metadata::{CargoManifest, OneOrMany, load_manifest},
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let artifacts = execute(&args).await?;

    for artifact in &artifacts {
        println!("{}\t{}", artifact.display_name(), artifact.path().display());
    }
    Ok(0)
}

/// Runs one packaging session for parsed arguments.
pub async fn execute(args: &Args) -> Result<Vec<Artifact>> {
    // Reject unknown targets before reading anything from disk
    args.resolve_targets()?;

    let manifest = load_manifest(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let settings = build_settings(args, manifest)?;
    log::debug!("Settings: {:?}", settings);

    let overrides = IdentityOverrides::from_settings(settings.macos());
    let (toolchain, _reporter) = Toolchain::system_with_log(&args.app);
    let bundler = Bundler::new(settings, toolchain, overrides)?;

    let artifacts = bundler.bundle(&args.archs()).await?;
    log::info!("✓ Packaging complete: {} artifact(s)", artifacts.len());
    Ok(artifacts)
}

/// Merges manifest metadata with arguments; arguments win.
pub fn build_settings(args: &Args, manifest: CargoManifest) -> Result<Settings> {
    let CargoManifest {
        metadata,
        mac,
        manifest_dir,
    } = manifest;

    let targets = if args.target.is_empty() {
        mac.target.map(OneOrMany::into_vec).unwrap_or_default()
    } else {
        args.target.clone()
    };

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| manifest_dir.join("dist"));

    let settings = SettingsBuilder::new()
        .project_directory(&manifest_dir)
        .project_out_directory(out_dir)
        .package_settings(PackageSettings {
            product_name: mac.product_name.unwrap_or_else(|| metadata.name.clone()),
            name: metadata.name,
            version: metadata.version,
            description: metadata.description,
        })
        .targets(targets)
        .compression(args.compression.or(mac.compression).unwrap_or_default())
        .code_signing(args.code_signing())
        .macos_settings(MacOsSettings {
            identity: args.identity.clone().or(mac.identity),
            installer_identity: args.installer_identity.clone().or(mac.installer_identity),
            sign_options: mac.sign_options,
        })
        .dmg_settings(DmgSettings { overrides: mac.dmg })
        .build()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::CompressionLevel;
    use clap::Parser;

    fn manifest(dir: &std::path::Path) -> CargoManifest {
        let path = dir.join("Cargo.toml");
        std::fs::write(
            &path,
            r#"
[package]
name = "my-app"
version = "2.0.0"

[package.metadata.bundle.mac]
product-name = "My App"
target = "dmg"
compression = "maximum"
identity = "Developer ID Application: Manifest"
"#,
        )
        .unwrap();
        load_manifest(&path).unwrap()
    }

    #[test]
    fn manifest_values_fill_in_missing_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from(["kodegen_bundler_mac", "--app", "My.app"]).unwrap();
        let settings = build_settings(&args, manifest(dir.path())).unwrap();

        assert_eq!(settings.product_name(), "My App");
        assert_eq!(settings.package_name(), "my-app");
        assert_eq!(settings.targets(), Some(&["dmg".to_string()][..]));
        assert_eq!(settings.compression(), CompressionLevel::Maximum);
        assert_eq!(settings.project_out_directory(), dir.path().join("dist"));
        assert_eq!(settings.build_resources_directory(), dir.path().join("build"));
        assert_eq!(
            settings.macos().identity.as_deref(),
            Some("Developer ID Application: Manifest")
        );
    }

    #[test]
    fn arguments_override_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "kodegen_bundler_mac",
            "--app",
            "My.app",
            "--target",
            "zip,7z",
            "--compression",
            "store",
            "--identity",
            "Developer ID Application: Flag",
            "--out-dir",
            "/tmp/out",
        ])
        .unwrap();
        let settings = build_settings(&args, manifest(dir.path())).unwrap();

        assert_eq!(
            settings.targets(),
            Some(&["zip".to_string(), "7z".to_string()][..])
        );
        assert_eq!(settings.compression(), CompressionLevel::Store);
        assert_eq!(
            settings.project_out_directory(),
            std::path::Path::new("/tmp/out")
        );
        assert_eq!(
            settings.macos().identity.as_deref(),
            Some("Developer ID Application: Flag")
        );
    }
}
