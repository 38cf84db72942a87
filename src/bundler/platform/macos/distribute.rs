//! Distributable formats for a signed bundle.
//!
//! Every requested format is produced concurrently from the same bundle.
//! Formats write distinct files, so they never race on the output
//! directory. The first failure ends the batch.
//!
//! Jobs are spawned on a [`JoinSet`] and may run on any runtime worker.
//! They share nothing but `Arc`'d tool handles, and every result is
//! collected by the awaiting task, so reporting and ordering stay on one
//! logical thread.

use super::{
    archive::{ArchiveRequest, Archiver},
    artifact::{ArchiveSpec, Artifact, ArtifactFormat, ArtifactReporter, artifact_file_name},
    dmg::{DiskImageCompression, DiskImageTool, DmgRequest, compute_specification},
    target::{Target, TargetSet},
};
use crate::bundler::{
    error::{Context, Error, Result},
    settings::Settings,
};
use std::{path::Path, sync::Arc};
use tokio::task::JoinSet;

/// Archive format and classifier for a target, `None` when the target is
/// not an archive.
///
/// `default` produces the `mac`-classified ZIP the update channel looks
/// for; explicit archive targets use `osx`.
pub fn archive_target(target: Target) -> Option<(ArtifactFormat, &'static str)> {
    match target {
        Target::Default => Some((ArtifactFormat::Zip, "mac")),
        Target::Zip => Some((ArtifactFormat::Zip, "osx")),
        Target::SevenZip => Some((ArtifactFormat::SevenZip, "osx")),
        Target::Dmg | Target::Mas => None,
    }
}

/// Turns signed bundles into DMG and archive artifacts.
pub struct Distributor {
    settings: Arc<Settings>,
    disk_images: Arc<dyn DiskImageTool>,
    archiver: Arc<dyn Archiver>,
    reporter: Arc<dyn ArtifactReporter>,
}

impl std::fmt::Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("product_name", &self.settings.product_name())
            .finish_non_exhaustive()
    }
}

impl Distributor {
    /// Creates a distributor.
    pub fn new(
        settings: Arc<Settings>,
        disk_images: Arc<dyn DiskImageTool>,
        archiver: Arc<dyn Archiver>,
        reporter: Arc<dyn ArtifactReporter>,
    ) -> Self {
        Self {
            settings,
            disk_images,
            archiver,
            reporter,
        }
    }

    /// Produces every distributable format `targets` asks for.
    ///
    /// # Formats
    /// - `dmg` or `default`: a disk image of `bundle`
    /// - every target other than `mas` and `dmg`: an archive of `bundle`
    ///
    /// Artifacts are reported as they complete and returned in request
    /// order. On the first failure the remaining jobs are detached and the
    /// error is returned.
    pub async fn distribute(
        &self,
        app_out_dir: &Path,
        bundle: &Path,
        targets: &TargetSet,
    ) -> Result<Vec<Artifact>> {
        let settings = &self.settings;
        let product_name = settings.product_name();
        let package_name = settings.package_name();
        let version = settings.version_string();

        let mut jobs: JoinSet<(usize, Result<Artifact>)> = JoinSet::new();
        let mut index = 0;

        if targets.contains(Target::Dmg) || targets.contains(Target::Default) {
            let specification = compute_specification(settings, bundle).await?;
            let file_name = artifact_file_name(product_name, version, None, ArtifactFormat::Dmg);
            let request = DmgRequest {
                target: app_out_dir.join(&file_name),
                basepath: settings.project_directory().to_path_buf(),
                specification,
                compression: DiskImageCompression::from_level(settings.compression()),
            };
            let display_name = artifact_file_name(package_name, version, None, ArtifactFormat::Dmg);
            let tool = Arc::clone(&self.disk_images);

            jobs.spawn(async move {
                let result = tool
                    .create(&request)
                    .await
                    .map(|()| Artifact::new(request.target, display_name));
                (index, result)
            });
            index += 1;
        }

        let app_name = bundle
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("App bundle path has no file name")?;

        for target in targets.iter() {
            let Some((format, classifier)) = archive_target(target) else {
                continue;
            };

            let request = ArchiveRequest {
                app_out_dir: app_out_dir.to_path_buf(),
                app_name: app_name.clone(),
                file_name: artifact_file_name(product_name, version, Some(classifier), format),
                spec: ArchiveSpec {
                    format,
                    compression: settings.compression(),
                    classifier: Some(classifier.to_string()),
                },
            };
            let display_name = artifact_file_name(package_name, version, Some(classifier), format);
            let archiver = Arc::clone(&self.archiver);
            let job = index;

            log::debug!("Queueing {} archive {}", format, request.file_name);
            jobs.spawn(async move {
                let result = archiver
                    .archive(&request)
                    .await
                    .map(|path| Artifact::new(path, display_name));
                (job, result)
            });
            index += 1;
        }

        let mut finished = Vec::with_capacity(index);
        while let Some(joined) = jobs.join_next().await {
            let (job, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    jobs.detach_all();
                    return Err(Error::GenericError(format!("Packaging task failed: {e}")));
                }
            };
            match result {
                Ok(artifact) => {
                    self.reporter.artifact_created(&artifact);
                    finished.push((job, artifact));
                }
                Err(e) => {
                    log::warn!("Packaging failed, abandoning {} pending job(s)", jobs.len());
                    jobs.detach_all();
                    return Err(e);
                }
            }
        }

        finished.sort_by_key(|(job, _)| *job);
        Ok(finished.into_iter().map(|(_, artifact)| artifact).collect())
    }
}
