//! DMG layout: window geometry, icon positions, background and compression.
//!
//! The built-in layout is a drag-to-install window with the bundle on the
//! left and an `/Applications` link on the right. User overrides from
//! `[package.metadata.bundle.mac.dmg]` are deep-merged on top.

use crate::bundler::{
    error::{Error, Result},
    settings::{CompressionLevel, Settings},
    utils::merge::deep_merge,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Final DMG compression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiskImageCompression {
    /// Uncompressed read-only image (`UDRO`).
    None,
    /// bzip2-compressed image (`UDBZ`).
    Bzip2,
}

impl DiskImageCompression {
    /// `store` disables compression, everything else uses bzip2.
    pub fn from_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Store => DiskImageCompression::None,
            CompressionLevel::Normal | CompressionLevel::Maximum => DiskImageCompression::Bzip2,
        }
    }

    /// `hdiutil convert -format` value.
    pub fn hdiutil_format(&self) -> &'static str {
        match self {
            DiskImageCompression::None => "UDRO",
            DiskImageCompression::Bzip2 => "UDBZ",
        }
    }
}

/// Kind of item placed in the DMG window.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmgEntryKind {
    /// Symlink, e.g. to `/Applications`.
    Link,
    /// File or bundle copied into the image.
    File,
    /// Only repositions an item that already exists.
    Position,
}

/// An item in the DMG window.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DmgEntry {
    /// Icon centre, x.
    pub x: i32,
    /// Icon centre, y.
    pub y: i32,
    /// Item kind.
    #[serde(rename = "type")]
    pub kind: DmgEntryKind,
    /// Source (file), link target (link) or item name (position).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Name inside the image, defaults to the file name of `path`.
    #[serde(default)]
    pub name: Option<String>,
}

impl DmgEntry {
    /// Name of the item inside the image.
    pub fn item_name(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            self.path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        })
    }
}

/// Window origin.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub struct WindowPosition {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
}

/// Window size.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub struct WindowSize {
    /// Width in points.
    pub width: u32,
    /// Height in points.
    pub height: u32,
}

/// Finder window geometry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct DmgWindow {
    /// Origin, default `100,100`.
    #[serde(default)]
    pub position: Option<WindowPosition>,
    /// Size.
    #[serde(default)]
    pub size: Option<WindowSize>,
}

/// Everything needed to lay out a DMG.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DmgSpecification {
    /// Volume name.
    pub title: String,
    /// Volume icon (`.icns`).
    #[serde(default)]
    pub icon: Option<PathBuf>,
    /// Icon size in the Finder window.
    #[serde(default)]
    pub icon_size: Option<u32>,
    /// Window background image.
    #[serde(default)]
    pub background: Option<PathBuf>,
    /// Window geometry.
    #[serde(default)]
    pub window: Option<DmgWindow>,
    /// Items in the window.
    #[serde(default)]
    pub contents: Vec<DmgEntry>,
}

/// Disk image job handed to a [`super::DiskImageTool`].
#[derive(Clone, Debug, PartialEq)]
pub struct DmgRequest {
    /// DMG file to write.
    pub target: PathBuf,
    /// Relative paths in the layout resolve against this.
    pub basepath: PathBuf,
    /// Layout.
    pub specification: DmgSpecification,
    /// Final compression.
    pub compression: DiskImageCompression,
}

impl DmgRequest {
    /// Resolves a layout path against [`DmgRequest::basepath`].
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.basepath.join(path)
        }
    }
}

/// Built-in layout before user overrides.
pub fn default_specification(settings: &Settings) -> Value {
    let resources = settings.build_resources_directory();
    json!({
        "title": settings.product_name(),
        "icon": resources.join("icon.icns").to_string_lossy(),
        "icon-size": 80,
        "window": {
            "size": { "width": 540, "height": 380 }
        },
        "contents": [
            { "x": 410, "y": 220, "type": "link", "path": "/Applications" },
            { "x": 130, "y": 220, "type": "file" }
        ]
    })
}

/// Computes the effective DMG layout for `bundle`.
///
/// 1. Built-in layout, deep-merged with user overrides
/// 2. `<resources>/background.png` when present and the user did not set `background`
/// 3. The first `file` entry points at `bundle` (one is added if the user removed it)
pub async fn compute_specification(settings: &Settings, bundle: &Path) -> Result<DmgSpecification> {
    let dmg = settings.dmg();
    let mut tree = default_specification(settings);
    if let Some(overrides) = &dmg.overrides {
        tree = deep_merge(tree, Value::Object(overrides.clone()));
    }

    if !dmg.overrides_key("background") {
        let background = settings.build_resources_directory().join("background.png");
        let is_file = tokio::fs::metadata(&background)
            .await
            .is_ok_and(|m| m.is_file());
        if is_file {
            log::debug!("Using DMG background {}", background.display());
            tree["background"] = Value::String(background.to_string_lossy().into_owned());
        }
    }

    let mut specification: DmgSpecification = serde_json::from_value(tree)
        .map_err(|e| Error::packaging("dmg", format!("Invalid DMG specification: {e}")))?;

    let file_entry = specification
        .contents
        .iter()
        .position(|entry| entry.kind == DmgEntryKind::File);
    match file_entry {
        Some(index) => specification.contents[index].path = Some(bundle.to_path_buf()),
        None => specification.contents.push(DmgEntry {
            x: 130,
            y: 220,
            kind: DmgEntryKind::File,
            path: Some(bundle.to_path_buf()),
            name: None,
        }),
    }

    Ok(specification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{DmgSettings, PackageSettings, SettingsBuilder};

    fn settings(resources: &Path, overrides: Option<Value>) -> Settings {
        SettingsBuilder::new()
            .project_out_directory(resources.join("dist"))
            .build_resources_directory(resources)
            .package_settings(PackageSettings {
                product_name: "MyApp".into(),
                name: "my-app".into(),
                version: "1.0.0".into(),
                ..Default::default()
            })
            .dmg_settings(DmgSettings {
                overrides: overrides.and_then(|v| v.as_object().cloned()),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn compression_mapping() {
        assert_eq!(
            DiskImageCompression::from_level(CompressionLevel::Store),
            DiskImageCompression::None
        );
        assert_eq!(
            DiskImageCompression::from_level(CompressionLevel::Maximum).hdiutil_format(),
            "UDBZ"
        );
    }

    #[tokio::test]
    async fn defaults_place_bundle_and_applications_link() {
        let dir = tempfile::tempdir().unwrap();
        let spec = compute_specification(&settings(dir.path(), None), Path::new("/out/MyApp.app"))
            .await
            .unwrap();

        assert_eq!(spec.title, "MyApp");
        assert_eq!(spec.icon_size, Some(80));
        assert_eq!(spec.icon, Some(dir.path().join("icon.icns")));
        assert_eq!(spec.background, None);
        assert_eq!(spec.contents.len(), 2);
        assert_eq!(spec.contents[0].kind, DmgEntryKind::Link);
        assert_eq!((spec.contents[0].x, spec.contents[0].y), (410, 220));
        assert_eq!(spec.contents[0].item_name().as_deref(), Some("Applications"));
        assert_eq!((spec.contents[1].x, spec.contents[1].y), (130, 220));
        assert_eq!(spec.contents[1].path, Some(PathBuf::from("/out/MyApp.app")));
        assert_eq!(
            spec.window.and_then(|w| w.size),
            Some(WindowSize {
                width: 540,
                height: 380
            })
        );
    }

    #[tokio::test]
    async fn conventional_background_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("background.png"), b"png").unwrap();
        let spec = compute_specification(&settings(dir.path(), None), Path::new("/out/MyApp.app"))
            .await
            .unwrap();
        assert_eq!(spec.background, Some(dir.path().join("background.png")));
    }

    #[tokio::test]
    async fn explicit_background_wins_even_when_null() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("background.png"), b"png").unwrap();

        let custom = settings(dir.path(), Some(json!({"background": "art/bg.png"})));
        let spec = compute_specification(&custom, Path::new("/out/MyApp.app"))
            .await
            .unwrap();
        assert_eq!(spec.background, Some(PathBuf::from("art/bg.png")));

        let disabled = settings(dir.path(), Some(json!({"background": null})));
        let spec = compute_specification(&disabled, Path::new("/out/MyApp.app"))
            .await
            .unwrap();
        assert_eq!(spec.background, None);
    }

    #[tokio::test]
    async fn overrides_merge_nested_and_replace_contents() {
        let dir = tempfile::tempdir().unwrap();
        let custom = settings(
            dir.path(),
            Some(json!({
                "title": "My App Installer",
                "window": { "size": { "width": 640 } },
                "contents": [ { "x": 100, "y": 100, "type": "link", "path": "/Applications" } ]
            })),
        );
        let spec = compute_specification(&custom, Path::new("/out/MyApp.app"))
            .await
            .unwrap();

        assert_eq!(spec.title, "My App Installer");
        assert_eq!(
            spec.window.and_then(|w| w.size),
            Some(WindowSize {
                width: 640,
                height: 380
            })
        );
        // user contents had no file entry, the bundle is appended
        assert_eq!(spec.contents.len(), 2);
        assert_eq!(spec.contents[1].kind, DmgEntryKind::File);
        assert_eq!(spec.contents[1].path, Some(PathBuf::from("/out/MyApp.app")));
    }
}
