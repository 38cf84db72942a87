//! Produced artifacts, their formats and the reporting seam.

use crate::bundler::settings::CompressionLevel;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// File format of a produced artifact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArtifactFormat {
    /// Disk image.
    Dmg,
    /// ZIP archive.
    Zip,
    /// 7z archive.
    SevenZip,
    /// Flat installer package.
    Pkg,
}

impl ArtifactFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Dmg => "dmg",
            ArtifactFormat::Zip => "zip",
            ArtifactFormat::SevenZip => "7z",
            ArtifactFormat::Pkg => "pkg",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<product>-<version>[-<classifier>].<ext>`
///
/// ```
/// use kodegen_bundler_mac::bundler::{ArtifactFormat, artifact_file_name};
///
/// assert_eq!(artifact_file_name("MyApp", "1.0.0", Some("mac"), ArtifactFormat::Zip), "MyApp-1.0.0-mac.zip");
/// assert_eq!(artifact_file_name("MyApp", "1.0.0", None, ArtifactFormat::Dmg), "MyApp-1.0.0.dmg");
/// ```
pub fn artifact_file_name(
    product: &str,
    version: &str,
    classifier: Option<&str>,
    format: ArtifactFormat,
) -> String {
    match classifier {
        Some(classifier) => format!("{product}-{version}-{classifier}.{format}"),
        None => format!("{product}-{version}.{format}"),
    }
}

/// What to archive and how.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveSpec {
    /// Output format.
    pub format: ArtifactFormat,
    /// Compression policy.
    pub compression: CompressionLevel,
    /// Filename classifier (`mac` for the update channel, `osx` otherwise).
    pub classifier: Option<String>,
}

/// A produced file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    path: PathBuf,
    display_name: String,
}

impl Artifact {
    /// Creates an artifact record.
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical name shown to users and release tooling.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Receives one notification per produced file.
pub trait ArtifactReporter: Send + Sync {
    /// Called exactly once for every artifact.
    fn artifact_created(&self, artifact: &Artifact);
}

/// Logs artifacts and keeps them for the caller.
#[derive(Debug, Default)]
pub struct LogReporter {
    artifacts: Mutex<Vec<Artifact>>,
}

impl LogReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every artifact reported so far.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ArtifactReporter for LogReporter {
    fn artifact_created(&self, artifact: &Artifact) {
        log::info!(
            "✓ Created {}: {}",
            artifact.display_name(),
            artifact.path().display()
        );
        match self.artifacts.lock() {
            Ok(mut guard) => guard.push(artifact.clone()),
            Err(poisoned) => poisoned.into_inner().push(artifact.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_differ_only_by_classifier_and_extension() {
        let dmg = artifact_file_name("MyApp", "2.1.0", None, ArtifactFormat::Dmg);
        let zip = artifact_file_name("MyApp", "2.1.0", Some("osx"), ArtifactFormat::Zip);
        assert_eq!(dmg, "MyApp-2.1.0.dmg");
        assert_eq!(zip, "MyApp-2.1.0-osx.zip");
        assert_eq!(
            artifact_file_name("MyApp", "2.1.0", Some("osx"), ArtifactFormat::SevenZip),
            "MyApp-2.1.0-osx.7z"
        );
    }

    #[test]
    fn log_reporter_records_in_order() {
        let reporter = LogReporter::new();
        reporter.artifact_created(&Artifact::new("/a.dmg", "a.dmg"));
        reporter.artifact_created(&Artifact::new("/a.zip", "a.zip"));
        let names: Vec<_> = reporter
            .artifacts()
            .iter()
            .map(|a| a.display_name().to_string())
            .collect();
        assert_eq!(names, ["a.dmg", "a.zip"]);
    }
}
