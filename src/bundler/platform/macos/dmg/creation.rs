//! Core DMG creation logic using hdiutil.
//!
//! Stages the layout's contents (bundle copy, Applications symlink)
//! in a temporary directory and turns it into a read-write image.

use super::layout::{DmgEntryKind, DmgRequest};
use crate::bundler::{
    error::{Context, Error, ErrorExt, Result, path_str},
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Path of the intermediate read-write image for `target`.
///
/// `MyApp-1.0.0.dmg` → `MyApp-1.0.0.rw.dmg`; hdiutil insists on the
/// `.dmg` suffix.
pub fn read_write_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    target.with_file_name(format!("{stem}.rw.dmg"))
}

/// Copy every `file` entry and create every `link` entry under `staging`.
pub async fn stage_contents(request: &DmgRequest, staging: &Path) -> Result<()> {
    for entry in &request.specification.contents {
        if entry.kind == DmgEntryKind::Position {
            continue;
        }

        let source = entry
            .path
            .as_deref()
            .with_context(|| format!("DMG {:?} entry at {},{} has no path", entry.kind, entry.x, entry.y))?;
        let name = entry
            .item_name()
            .with_context(|| format!("Cannot derive a name for {}", source.display()))?;
        let dest = staging.join(&name);

        match entry.kind {
            DmgEntryKind::File => {
                let source = request.resolve(source);
                log::debug!("Copying {} to staging", source.display());
                if source.is_dir() {
                    fs::copy_dir(&source, &dest).await.with_context(|| {
                        format!("copying {} to DMG staging directory", source.display())
                    })?;
                } else {
                    fs::copy_file(&source, &dest).await?;
                }
            }
            DmgEntryKind::Link => {
                fs::symlink(source, &dest).fs_context("creating DMG symlink", &dest)?;
            }
            DmgEntryKind::Position => {}
        }
    }

    Ok(())
}

/// Create a read-write DMG at `rw_path` from a staging directory.
pub async fn create_read_write_dmg(volume_name: &str, staging: &Path, rw_path: &Path) -> Result<()> {
    fs::remove_file(rw_path).await?;

    log::info!("Creating DMG with format UDRW...");

    let output = tokio::process::Command::new("hdiutil")
        .args([
            "create",
            "-volname",
            volume_name,
            "-srcfolder",
            path_str(staging)?,
            "-ov", // Overwrite if exists
            "-fs",
            "HFS+",
            "-format",
            "UDRW",
            path_str(rw_path)?,
        ])
        .output()
        .await
        .map_err(|e| Error::packaging("dmg", format!("Failed to execute hdiutil command: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::packaging(
            "dmg",
            format!("hdiutil create failed: {}", stderr.trim()),
        ));
    }

    log::debug!("Created UDRW DMG: {}", rw_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::macos::dmg::layout::{
        DiskImageCompression, DmgEntry, DmgSpecification,
    };

    #[test]
    fn read_write_path_keeps_directory() {
        assert_eq!(
            read_write_path(Path::new("/out/MyApp-1.0.0.dmg")),
            PathBuf::from("/out/MyApp-1.0.0.rw.dmg")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stages_bundle_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("MyApp.app");
        std::fs::create_dir_all(app.join("Contents")).unwrap();
        std::fs::write(app.join("Contents/Info.plist"), b"plist").unwrap();
        let staging = dir.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();

        let request = DmgRequest {
            target: dir.path().join("MyApp-1.0.0.dmg"),
            basepath: dir.path().to_path_buf(),
            specification: DmgSpecification {
                title: "MyApp".into(),
                icon: None,
                icon_size: None,
                background: None,
                window: None,
                contents: vec![
                    DmgEntry {
                        x: 410,
                        y: 220,
                        kind: DmgEntryKind::Link,
                        path: Some("/Applications".into()),
                        name: None,
                    },
                    DmgEntry {
                        x: 130,
                        y: 220,
                        kind: DmgEntryKind::File,
                        path: Some("MyApp.app".into()),
                        name: None,
                    },
                ],
            },
            compression: DiskImageCompression::Bzip2,
        };

        stage_contents(&request, &staging).await.unwrap();

        assert_eq!(
            std::fs::read_link(staging.join("Applications")).unwrap(),
            PathBuf::from("/Applications")
        );
        assert!(staging.join("MyApp.app/Contents/Info.plist").is_file());
    }
}
