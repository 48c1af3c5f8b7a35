// SPDX-License-Identifier: MPL-2.0

//! Storage for session hand-off
//!
//! Reads library images from a directory and writes the final set of a
//! completed session to disk as JPEG files.

use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::CapturedImage;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions treated as library images
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// List the JPEG and PNG files in `dir`, sorted by file name
pub async fn list_image_files(dir: PathBuf) -> AppResult<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", dir.display(), e)))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();
        files.sort();
        debug!(dir = %dir.display(), count = files.len(), "Listed library images");
        Ok(files)
    })
    .await
    .map_err(|e| AppError::Storage(format!("Listing task error: {}", e)))?
}

/// Encode RGBA pixels as JPEG (alpha is dropped)
fn encode_jpeg(image: &CapturedImage, quality: u8) -> AppResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.pixels().clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| AppError::Storage(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Write the images of a completed session to `output_dir`
///
/// Files are named `IMG_<timestamp>_<nn>.jpg` in session order. The
/// directory is created if needed.
pub async fn save_images(
    images: Vec<CapturedImage>,
    output_dir: PathBuf,
    quality: u8,
) -> AppResult<Vec<PathBuf>> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    let paths = tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&output_dir)?;
        let mut paths = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let path = output_dir.join(format!("IMG_{}_{:02}.jpg", timestamp, index + 1));
            std::fs::write(&path, encode_jpeg(image, quality)?)?;
            debug!(path = %path.display(), "Photo written");
            paths.push(path);
        }
        Ok::<_, AppError>(paths)
    })
    .await
    .map_err(|e| AppError::Storage(format!("Save task error: {}", e)))??;

    info!(count = paths.len(), "Session photos saved");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::ImageOrigin;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_image_extension_filter() {
        assert!(is_image_file(Path::new("a/b.JPG")));
        assert!(is_image_file(Path::new("b.png")));
        assert!(is_image_file(Path::new("c.jpeg")));
        assert!(!is_image_file(Path::new("d.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_save_and_list_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("session");
        let image = CapturedImage::new(
            RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255])),
            ImageOrigin::Library,
        );

        let saved = save_images(vec![image.clone(), image], out.clone(), 90)
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved[0].to_string_lossy().ends_with("_01.jpg"));

        let listed = list_image_files(out).await.unwrap();
        assert_eq!(listed, saved);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_image_files(dir.path().join("missing")).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
