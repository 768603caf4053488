//! Reference-image discovery under the assets tree and output-file handling.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::warn;

use crate::config::CONFIG;
use crate::llm::media::LoadedReference;
use crate::request::{ReferenceImage, ReferenceKind};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Image files directly inside `directory`, sorted by file name. A missing
/// directory is just an empty listing.
pub fn list_reference_images(directory: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

pub fn staff_dir(staff_id: &str) -> PathBuf {
    CONFIG.assets_dir.join("staff").join(staff_id)
}

pub fn backgrounds_dir(location: &str) -> PathBuf {
    CONFIG.assets_dir.join("backgrounds").join(location)
}

/// Reads one reference image from disk, sniffing its mime type.
pub fn load_reference(image: &ReferenceImage) -> Result<LoadedReference> {
    let bytes = fs::read(&image.path)
        .with_context(|| format!("Failed to read reference image {}", image.path.display()))?;
    Ok(LoadedReference::new(bytes, image.kind, image.label.clone()))
}

/// Loads all references for a request, background ahead of staff so the image
/// model sees the setting first.
pub fn load_references(images: &[ReferenceImage]) -> Result<Vec<LoadedReference>> {
    let mut loaded = Vec::with_capacity(images.len());
    for image in images
        .iter()
        .filter(|image| image.kind == ReferenceKind::Background)
        .chain(images.iter().filter(|image| image.kind == ReferenceKind::Staff))
    {
        loaded.push(load_reference(image)?);
    }
    Ok(loaded)
}

pub fn output_file_name(timestamp: DateTime<Local>) -> String {
    format!("cyclez_{}.png", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Writes generated image bytes into the outputs directory and returns the
/// path. Bytes that do not decode as an image are still written, so a partial
/// result can be inspected, but the problem is logged.
pub fn save_output(bytes: &[u8]) -> Result<PathBuf> {
    if let Err(err) = image::load_from_memory(bytes) {
        warn!("Generated bytes did not decode as an image: {err}");
    }

    fs::create_dir_all(&CONFIG.outputs_dir).with_context(|| {
        format!(
            "Failed to create outputs directory {}",
            CONFIG.outputs_dir.display()
        )
    })?;

    let path = CONFIG.outputs_dir.join(output_file_name(Local::now()));
    fs::write(&path, bytes)
        .with_context(|| format!("Failed to write output image {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lists_only_supported_extensions_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "c.webp", "notes.txt", "d.gif", "e.JPEG"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = list_reference_images(dir.path());
        let names: Vec<_> = images
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.webp", "e.JPEG"]);
    }

    #[test]
    fn missing_directory_is_an_empty_listing() {
        assert!(list_reference_images(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn output_file_name_is_timestamped() {
        let timestamp = Local.with_ymd_and_hms(2026, 1, 15, 9, 30, 5).unwrap();
        assert_eq!(output_file_name(timestamp), "cyclez_20260115_093005.png");
    }

    #[test]
    fn background_references_load_ahead_of_staff() {
        let dir = tempfile::tempdir().unwrap();
        let staff_path = dir.path().join("staff.png");
        let background_path = dir.path().join("bg.png");
        fs::write(&staff_path, b"staff-bytes").unwrap();
        fs::write(&background_path, b"bg-bytes").unwrap();

        let references = vec![
            ReferenceImage {
                path: staff_path,
                kind: ReferenceKind::Staff,
                label: "staff".to_string(),
            },
            ReferenceImage {
                path: background_path,
                kind: ReferenceKind::Background,
                label: "background".to_string(),
            },
        ];
        let loaded = load_references(&references).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].kind, ReferenceKind::Background);
        assert_eq!(loaded[0].bytes, b"bg-bytes");
        assert_eq!(loaded[1].kind, ReferenceKind::Staff);
    }
}
