//! DMG appearance customization using AppleScript.
//!
//! Handles all DMG customization features including:
//! - Mounting DMG in read-write mode
//! - Copying background images and the volume icon
//! - Running AppleScript to set window geometry and icon positions
//! - Detaching DMG after customization

use super::layout::{DmgRequest, DmgSpecification};
use crate::bundler::{
    error::{Error, Result, path_str},
    utils::fs,
};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

/// Default window origin when the layout only sets a size.
const DEFAULT_WINDOW_ORIGIN: (u32, u32) = (100, 100);
/// Default window size when the layout sets nothing.
const DEFAULT_WINDOW_SIZE: (u32, u32) = (540, 380);

/// Apply the layout to a read-write DMG.
///
/// # Process
/// 1. Mount DMG in read-write mode
/// 2. Copy background image to `.background/` and icon to `.VolumeIcon.icns`
/// 3. Run AppleScript to lay out the Finder window
/// 4. Detach DMG
///
/// Appearance problems are logged, not fatal; mount failures are.
pub async fn apply_dmg_customizations(rw_path: &Path, request: &DmgRequest) -> Result<()> {
    log::info!("Applying DMG customizations...");

    let spec = &request.specification;
    let mount_point = mount_dmg_rw(rw_path, &spec.title).await?;

    let result = customize_mounted(&mount_point, request).await;

    detach_dmg(&mount_point).await?;
    result?;

    log::info!("✓ DMG customizations applied");
    Ok(())
}

async fn customize_mounted(mount_point: &Path, request: &DmgRequest) -> Result<()> {
    let spec = &request.specification;

    let background_name = match &spec.background {
        Some(background) => {
            let source = request.resolve(background);
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::packaging("dmg", format!("Invalid background path: {}", source.display()))
                })?;
            let dest = mount_point.join(".background").join(&file_name);
            fs::copy_file(&source, &dest).await?;
            log::debug!("Copied background image to {}", dest.display());
            Some(file_name)
        }
        None => None,
    };

    if let Some(icon) = &spec.icon {
        let source = request.resolve(icon);
        if source.is_file() {
            fs::copy_file(&source, &mount_point.join(".VolumeIcon.icns")).await?;
            set_custom_icon_flag(mount_point).await;
        } else {
            log::debug!("Volume icon not found, skipping: {}", source.display());
        }
    }

    run_dmg_applescript(spec, background_name.as_deref()).await
}

/// Mount DMG in read-write mode
///
/// Returns the mount point path
async fn mount_dmg_rw(dmg_path: &Path, volume_name: &str) -> Result<PathBuf> {
    log::debug!("Mounting DMG for customization...");

    let output = tokio::process::Command::new("hdiutil")
        .args(["attach", path_str(dmg_path)?, "-readwrite", "-noverify", "-nobrowse"])
        .output()
        .await
        .map_err(|e| Error::packaging("dmg", format!("Failed to mount DMG: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::packaging(
            "dmg",
            format!("Failed to mount DMG: {}", stderr.trim()),
        ));
    }

    // Mount point is /Volumes/{volume_name}
    let mount_point = PathBuf::from(format!("/Volumes/{}", volume_name));

    let max_retries = 10;
    for _ in 0..max_retries {
        if mount_point.exists() {
            log::debug!("DMG mounted at {}", mount_point.display());
            return Ok(mount_point);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Err(Error::packaging(
        "dmg",
        format!("DMG mount point not found after {} retries", max_retries),
    ))
}

async fn set_custom_icon_flag(mount_point: &Path) {
    let result = tokio::process::Command::new("SetFile")
        .arg("-a")
        .arg("C")
        .arg(mount_point)
        .output()
        .await;
    match result {
        Ok(output) if output.status.success() => {}
        Ok(output) => log::warn!(
            "SetFile could not flag the volume icon: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => log::warn!("SetFile unavailable, volume icon may not show: {}", e),
    }
}

/// Escape special characters for AppleScript string literals
///
/// Escapes backslashes and double quotes to prevent script injection
/// and syntax errors when product names contain special characters.
fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Builds the Finder layout script.
pub fn layout_script(spec: &DmgSpecification, background: Option<&str>) -> String {
    let window = spec.window.unwrap_or_default();
    let (left, top) = window
        .position
        .map(|p| (p.x, p.y))
        .unwrap_or(DEFAULT_WINDOW_ORIGIN);
    let (width, height) = window
        .size
        .map(|s| (s.width, s.height))
        .unwrap_or(DEFAULT_WINDOW_SIZE);

    let positions: Vec<String> = spec
        .contents
        .iter()
        .filter_map(|entry| {
            entry.item_name().map(|name| {
                format!(
                    r#"set position of item "{}" to {{{}, {}}}"#,
                    escape_applescript_string(&name),
                    entry.x,
                    entry.y
                )
            })
        })
        .collect();

    let background_clause = background
        .map(|file| {
            format!(
                r#"set background picture of viewOptions to file ".background:{}""#,
                escape_applescript_string(file)
            )
        })
        .unwrap_or_default();

    format!(
        r#"
        tell application "Finder"
            tell disk "{volume_name}"
                open
                set current view of container window to icon view
                set toolbar visible of container window to false
                set statusbar visible of container window to false
                set bounds of container window to {{{left}, {top}, {right}, {bottom}}}
                set viewOptions to icon view options of container window
                set arrangement of viewOptions to not arranged
                set icon size of viewOptions to {icon_size}
                {background_clause}
                {positions}
                close
                open
                update without registering applications
                delay 2
            end tell
        end tell
        "#,
        volume_name = escape_applescript_string(&spec.title),
        right = left.saturating_add(width),
        bottom = top.saturating_add(height),
        icon_size = spec.icon_size.unwrap_or(80),
        positions = positions.join("\n                "),
    )
}

/// Run AppleScript to customize DMG window appearance
async fn run_dmg_applescript(spec: &DmgSpecification, background: Option<&str>) -> Result<()> {
    log::debug!("Running AppleScript to customize DMG window...");

    let script = layout_script(spec, background);
    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .await
        .map_err(|e| Error::packaging("dmg", format!("Failed to run AppleScript: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!("AppleScript execution had issues: {}", stderr);
    }

    Ok(())
}

/// Detach (unmount) DMG
async fn detach_dmg(mount_point: &Path) -> Result<()> {
    log::debug!("Detaching DMG...");

    // Wait for .DS_Store to be written
    tokio::time::sleep(Duration::from_secs(2)).await;

    let mount = path_str(mount_point)?;
    let output = tokio::process::Command::new("hdiutil")
        .args(["detach", mount])
        .output()
        .await
        .map_err(|e| Error::packaging("dmg", format!("Failed to detach DMG: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!("DMG detach had issues: {}", stderr);
        let forced = tokio::process::Command::new("hdiutil")
            .args(["detach", mount, "-force"])
            .output()
            .await
            .map_err(|e| Error::packaging("dmg", format!("Failed to detach DMG: {e}")))?;
        if !forced.status.success() {
            return Err(Error::packaging(
                "dmg",
                format!("Could not detach {}", mount_point.display()),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::macos::dmg::layout::{
        DmgEntry, DmgEntryKind, DmgWindow, WindowPosition, WindowSize,
    };

    fn spec() -> DmgSpecification {
        DmgSpecification {
            title: "My \"App\"".into(),
            icon: None,
            icon_size: Some(96),
            background: None,
            window: Some(DmgWindow {
                position: None,
                size: Some(WindowSize {
                    width: 600,
                    height: 400,
                }),
            }),
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
                    path: Some("/out/My.app".into()),
                    name: None,
                },
            ],
        }
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_applescript_string("My\"App"), "My\\\"App");
        assert_eq!(escape_applescript_string("Path\\File"), "Path\\\\File");
    }

    #[test]
    fn script_places_items_and_sizes_window() {
        let script = layout_script(&spec(), Some("background.png"));
        assert!(script.contains(r#"tell disk "My \"App\"""#));
        assert!(script.contains("set bounds of container window to {100, 100, 700, 500}"));
        assert!(script.contains("set icon size of viewOptions to 96"));
        assert!(script.contains(r#"set position of item "Applications" to {410, 220}"#));
        assert!(script.contains(r#"set position of item "My.app" to {130, 220}"#));
        assert!(script.contains(r#"file ".background:background.png""#));
    }

    #[test]
    fn script_without_background_has_no_picture_clause() {
        let script = layout_script(&spec(), None);
        assert!(!script.contains("background picture"));
    }

    #[test]
    fn oversized_window_bounds_saturate() {
        let mut spec = spec();
        spec.window = Some(DmgWindow {
            position: Some(WindowPosition { x: u32::MAX - 10, y: 5 }),
            size: Some(WindowSize {
                width: 600,
                height: u32::MAX,
            }),
        });
        let script = layout_script(&spec, None);
        let bounds = format!(
            "set bounds of container window to {{{}, 5, {}, {}}}",
            u32::MAX - 10,
            u32::MAX,
            u32::MAX
        );
        assert!(script.contains(&bounds));
    }
}
