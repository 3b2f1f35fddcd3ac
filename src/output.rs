//! Writes decoded assets to disk and builds the invocation report.

use crate::catalog::OutputMode;
use crate::error::{PixelLabError, Result};
use crate::models::{ImageAsset, InvocationResult, UsageReport};
use crate::spritesheet::encode_spritesheet;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Which of several returned candidates end up on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    First,
    All,
    /// Zero-based index into the returned list
    Pick(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One file chosen by the selection policy
    Selectable,
    /// Every frame, suffixed by index or direction
    Frames,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    base: PathBuf,
    layout: Layout,
}

impl OutputTarget {
    pub fn new(output: impl AsRef<Path>, layout: Layout) -> Self {
        Self {
            base: strip_extension(output.as_ref()),
            layout,
        }
    }

    /// Target for an endpoint's output mode, `None` when it writes no images.
    pub fn for_mode(mode: OutputMode, output: Option<&str>) -> Option<Self> {
        let (default, layout) = match mode {
            OutputMode::Single { default_path } => (default_path, Layout::Selectable),
            OutputMode::Variations { default_base } => (default_base, Layout::Selectable),
            OutputMode::Frames { default_base } => (default_base, Layout::Frames),
            OutputMode::None | OutputMode::Keypoints => return None,
        };
        Some(Self::new(output.unwrap_or(default), layout))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    fn whole(&self, ext: &str) -> PathBuf {
        let mut name = self.base.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }

    fn suffixed(&self, suffix: &str, ext: &str) -> PathBuf {
        let mut name: OsString = self.base.as_os_str().to_owned();
        name.push(format!("_{}.{}", suffix, ext));
        PathBuf::from(name)
    }

    pub fn spritesheet_path(&self) -> PathBuf {
        self.suffixed("spritesheet", "png")
    }
}

/// The extension always comes from the decoded image, so any suffix the
/// caller typed is dropped.
fn strip_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    }
}

/// Resolve every destination path before anything is written.
pub fn plan<'a>(
    assets: &'a [ImageAsset],
    selection: Selection,
    target: &OutputTarget,
) -> Result<Vec<(PathBuf, &'a ImageAsset)>> {
    if assets.is_empty() {
        return Err(PixelLabError::DecodeError("no images to write".into()));
    }

    let planned = match (target.layout, selection) {
        (Layout::Frames, _) => assets
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                let suffix = asset.label.clone().unwrap_or_else(|| i.to_string());
                (target.suffixed(&suffix, asset.extension()), asset)
            })
            .collect(),
        (Layout::Selectable, Selection::First) => {
            vec![(target.whole(assets[0].extension()), &assets[0])]
        }
        (Layout::Selectable, Selection::All) => assets
            .iter()
            .enumerate()
            .map(|(i, asset)| (target.suffixed(&i.to_string(), asset.extension()), asset))
            .collect(),
        (Layout::Selectable, Selection::Pick(index)) => {
            let asset = assets.get(index).ok_or(PixelLabError::IndexOutOfRange {
                index,
                available: assets.len(),
            })?;
            vec![(target.whole(asset.extension()), asset)]
        }
    };
    Ok(planned)
}

/// Write the selected assets, plus a spritesheet for frame layouts when asked.
///
/// Stops at the first failed write; files already on disk stay and are the
/// only ones listed in the report.
pub fn write(
    assets: &[ImageAsset],
    selection: Selection,
    target: &OutputTarget,
    spritesheet: bool,
) -> InvocationResult {
    let planned = match plan(assets, selection, target) {
        Ok(planned) => planned,
        Err(e) => return InvocationResult::failure(&e, Vec::new()),
    };

    let mut written = Vec::with_capacity(planned.len() + 1);
    for (path, asset) in planned {
        if let Err(e) = write_atomic(&path, &asset.data) {
            log::error!("{}", e);
            return InvocationResult::failure(&e, written);
        }
        log::info!("Saved {}", path.display());
        written.push(path.display().to_string());
    }

    if spritesheet {
        if target.layout == Layout::Frames {
            let path = target.spritesheet_path();
            let result = encode_spritesheet(assets).and_then(|png| write_atomic(&path, &png));
            if let Err(e) = result {
                log::error!("{}", e);
                return InvocationResult::failure(&e, written);
            }
            log::info!("Saved spritesheet {}", path.display());
            written.push(path.display().to_string());
        } else {
            log::warn!("Spritesheet requested for a single-image output, skipping");
        }
    }

    InvocationResult::success(written, &UsageReport::default())
}

/// Echo keypoints in the report, and save them as pretty JSON when a path is given.
pub fn write_keypoints(keypoints: &Value, output: Option<&Path>) -> InvocationResult {
    let mut written = Vec::new();
    if let Some(path) = output {
        let result = serde_json::to_string_pretty(keypoints)
            .map_err(|e| PixelLabError::DecodeError(format!("cannot serialize keypoints: {}", e)))
            .and_then(|json| write_atomic(path, json.as_bytes()));
        if let Err(e) = result {
            return InvocationResult::failure(&e, written);
        }
        written.push(path.display().to_string());
    }
    InvocationResult::success(written, &UsageReport::default()).with_keypoints(keypoints.clone())
}

/// Write through a temp file in the destination directory, then rename over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| PixelLabError::file_io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PixelLabError::file_io(path, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PixelLabError::file_io(path, e))?;
    tmp.persist(path)
        .map_err(|e| PixelLabError::file_io(path, e.error))?;
    Ok(())
}
