//! ZIP and 7z archives of the `.app` bundle.

use super::artifact::{ArchiveSpec, ArtifactFormat};
use crate::bundler::{
    builder::tool_detection::SEVEN_ZIP,
    error::{Error, Result},
    settings::CompressionLevel,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Archive request: pack `app_name` found inside `app_out_dir`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveRequest {
    /// Directory containing the bundle; the archive is written here too.
    pub app_out_dir: PathBuf,
    /// `MyApp.app`
    pub app_name: String,
    /// `MyApp-1.0.0-mac.zip`
    pub file_name: String,
    /// Format and compression.
    pub spec: ArchiveSpec,
}

impl ArchiveRequest {
    /// Where the archive ends up.
    pub fn output_path(&self) -> PathBuf {
        self.app_out_dir.join(&self.file_name)
    }
}

/// External archiver.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Writes the archive and returns its path.
    async fn archive(&self, request: &ArchiveRequest) -> Result<PathBuf>;
}

/// [`Archiver`] backed by 7-Zip.
#[derive(Debug, Default)]
pub struct SevenZipArchiver;

#[async_trait]
impl Archiver for SevenZipArchiver {
    async fn archive(&self, request: &ArchiveRequest) -> Result<PathBuf> {
        let format = request.spec.format;
        let seven_zip = SEVEN_ZIP.as_deref().ok_or_else(|| {
            Error::packaging(format, "7-Zip (7za) is not installed or not in PATH")
        })?;

        let output_path = request.output_path();
        // 7-Zip's `a` updates an existing archive in place
        remove_stale(&output_path, format).await?;

        let args = seven_zip_args(&request.spec, &request.file_name, &request.app_name);
        log::debug!("{} {}", seven_zip.display(), args.join(" "));

        let output = tokio::process::Command::new(seven_zip)
            .args(&args)
            .current_dir(&request.app_out_dir)
            .output()
            .await
            .map_err(|e| Error::packaging(format, format!("Failed to execute 7-Zip: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::packaging(
                format,
                format!("7-Zip exited with {:?}: {}", output.status.code(), stderr.trim()),
            ));
        }

        Ok(output_path)
    }
}

async fn remove_stale(path: &Path, format: ArtifactFormat) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::packaging(
            format,
            format!("Failed to remove existing {}: {e}", path.display()),
        )),
    }
}

/// 7-Zip arguments for an archive.
///
/// - `store` forces the `Copy` method, ZIP otherwise uses `Deflate`
/// - `maximum` adds `-mfb=258 -mpass=15`
pub fn seven_zip_args(spec: &ArchiveSpec, file_name: &str, app_name: &str) -> Vec<String> {
    let verbosity = if log::log_enabled!(log::Level::Debug) {
        "-bb3"
    } else {
        "-bb0"
    };
    let mut args = vec!["a".to_string(), verbosity.to_string(), "-bd".to_string()];

    let store_only = spec.compression == CompressionLevel::Store;
    if store_only {
        args.push("-mm=Copy".to_string());
    } else if spec.format == ArtifactFormat::Zip {
        args.push("-mm=Deflate".to_string());
    }

    if spec.compression == CompressionLevel::Maximum {
        args.extend(["-mfb=258".to_string(), "-mpass=15".to_string()]);
    }

    args.extend([file_name.to_string(), app_name.to_string()]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(format: ArtifactFormat, compression: CompressionLevel) -> ArchiveSpec {
        ArchiveSpec {
            format,
            compression,
            classifier: Some("osx".into()),
        }
    }

    fn flags(args: &[String]) -> Vec<&str> {
        args.iter()
            .map(String::as_str)
            .filter(|a| a.starts_with("-m"))
            .collect()
    }

    #[test]
    fn store_uses_copy_method() {
        let zip = seven_zip_args(
            &spec(ArtifactFormat::Zip, CompressionLevel::Store),
            "A-1-mac.zip",
            "A.app",
        );
        assert_eq!(flags(&zip), ["-mm=Copy"]);
        let seven = seven_zip_args(
            &spec(ArtifactFormat::SevenZip, CompressionLevel::Store),
            "A-1-osx.7z",
            "A.app",
        );
        assert_eq!(flags(&seven), ["-mm=Copy"]);
    }

    #[test]
    fn normal_zip_deflates_and_7z_keeps_defaults() {
        let zip = seven_zip_args(
            &spec(ArtifactFormat::Zip, CompressionLevel::Normal),
            "A-1-mac.zip",
            "A.app",
        );
        assert_eq!(flags(&zip), ["-mm=Deflate"]);
        let seven = seven_zip_args(
            &spec(ArtifactFormat::SevenZip, CompressionLevel::Normal),
            "A-1-osx.7z",
            "A.app",
        );
        assert!(flags(&seven).is_empty());
    }

    #[test]
    fn maximum_tunes_match_finder_and_passes() {
        let args = seven_zip_args(
            &spec(ArtifactFormat::SevenZip, CompressionLevel::Maximum),
            "A-1-osx.7z",
            "A.app",
        );
        assert_eq!(flags(&args), ["-mfb=258", "-mpass=15"]);
        assert_eq!(args[0], "a");
        assert_eq!(&args[args.len() - 2..], ["A-1-osx.7z", "A.app"]);
    }
}
