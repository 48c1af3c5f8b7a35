// SPDX-License-Identifier: MPL-2.0

//! Image decoding and orientation correction
//!
//! Front-facing sensors deliver an optically mirrored picture; the capture
//! path flips those left-right before the user ever sees them.

use image::RgbaImage;
use image::imageops;
use tracing::debug;

/// Decode encoded image bytes (JPEG, PNG, ...) into RGBA pixels
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image: {}", e))?;
    let rgba = img.to_rgba8();
    debug!(width = rgba.width(), height = rgba.height(), "Image decoded");
    Ok(rgba)
}

/// Flip an image left-right
pub fn mirror_horizontal(image: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marked_image() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img
    }

    #[test]
    fn test_mirror_moves_left_column_to_right() {
        let mirrored = mirror_horizontal(&marked_image());
        assert_eq!(mirrored.get_pixel(3, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(mirrored.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(mirrored.dimensions(), (4, 2));
    }

    #[test]
    fn test_decode_png_bytes() {
        let mut bytes = Vec::new();
        marked_image()
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded, marked_image());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
