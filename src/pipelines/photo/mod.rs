// SPDX-License-Identifier: MPL-2.0

//! Photo pipeline
//!
//! Turns the encoded bytes a device or the library hands back into the
//! decoded, correctly oriented images the session collects:
//!
//! ```text
//! captureStill / picker item → Decode → Orientation fix → CapturedImage
//! ```
//!
//! Decoding and mirroring are CPU-bound and run on the blocking pool.

pub mod capture;
pub mod processing;

pub use capture::PendingCapture;
pub use processing::{decode_image, mirror_horizontal};

use crate::backends::camera::CameraPosition;
use image::RgbaImage;
use std::sync::Arc;

/// Where an image entered the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Live capture from the camera at this position
    Camera(CameraPosition),
    /// Imported from the photo library
    Library,
}

/// A decoded image held by the session
///
/// Pixel data is shared; cloning is cheap.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: Arc<RgbaImage>,
    origin: ImageOrigin,
}

impl CapturedImage {
    pub fn new(pixels: RgbaImage, origin: ImageOrigin) -> Self {
        Self {
            pixels: Arc::new(pixels),
            origin,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }
}
