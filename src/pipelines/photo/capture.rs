// SPDX-License-Identifier: MPL-2.0

//! Still capture completion
//!
//! A [`PendingCapture`] is the in-flight half of a still capture: the device
//! future plus what the session knew when the shot was requested. It is
//! `Send + 'static` so the owner can hand it to a worker task and feed the
//! resolved image back on its own thread.

use super::processing::{decode_image, mirror_horizontal};
use super::{CapturedImage, ImageOrigin};
use crate::backends::camera::CameraPosition;
use crate::errors::{CaptureError, CaptureResult, DeviceResult};
use futures::future::BoxFuture;
use tracing::{debug, info};

/// A still capture that has been issued but not resolved
pub struct PendingCapture {
    future: BoxFuture<'static, DeviceResult<Vec<u8>>>,
    position: CameraPosition,
    mirror: bool,
}

impl PendingCapture {
    pub(crate) fn new(
        future: BoxFuture<'static, DeviceResult<Vec<u8>>>,
        position: CameraPosition,
        mirror: bool,
    ) -> Self {
        Self {
            future,
            position,
            mirror,
        }
    }

    /// Position of the camera when the shot was requested
    pub fn position(&self) -> CameraPosition {
        self.position
    }

    /// Whether the result will be mirrored
    pub fn mirrors(&self) -> bool {
        self.mirror
    }

    /// Wait for the device, decode the bytes and fix orientation
    pub async fn resolve(self) -> CaptureResult<CapturedImage> {
        let bytes = self
            .future
            .await
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        debug!(size = bytes.len(), position = %self.position, "Still capture delivered");

        let mirror = self.mirror;
        let pixels = tokio::task::spawn_blocking(move || {
            let decoded = decode_image(&bytes)?;
            Ok::<_, String>(if mirror {
                mirror_horizontal(&decoded)
            } else {
                decoded
            })
        })
        .await
        .map_err(|e| CaptureError::CaptureFailed(format!("Capture task error: {}", e)))?
        .map_err(CaptureError::CaptureFailed)?;

        info!(
            width = pixels.width(),
            height = pixels.height(),
            mirrored = mirror,
            "Photo captured"
        );

        Ok(CapturedImage::new(pixels, ImageOrigin::Camera(self.position)))
    }
}

impl std::fmt::Debug for PendingCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCapture")
            .field("position", &self.position)
            .field("mirror", &self.mirror)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DeviceError;
    use futures::FutureExt;
    use image::{Rgba, RgbaImage};

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn marked() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
        img
    }

    #[tokio::test]
    async fn test_front_capture_is_mirrored() {
        let bytes = png_bytes(&marked());
        let pending =
            PendingCapture::new(async move { Ok(bytes) }.boxed(), CameraPosition::Front, true);
        let image = pending.resolve().await.unwrap();
        assert_eq!(image.pixels().get_pixel(2, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.origin(), ImageOrigin::Camera(CameraPosition::Front));
    }

    #[tokio::test]
    async fn test_back_capture_is_unmodified() {
        let bytes = png_bytes(&marked());
        let pending =
            PendingCapture::new(async move { Ok(bytes) }.boxed(), CameraPosition::Back, false);
        let image = pending.resolve().await.unwrap();
        assert_eq!(image.pixels(), &marked());
    }

    #[tokio::test]
    async fn test_device_failure_maps_to_capture_failed() {
        let pending = PendingCapture::new(
            async { Err(DeviceError::CaptureFailed("sensor timeout".into())) }.boxed(),
            CameraPosition::Back,
            false,
        );
        assert!(matches!(
            pending.resolve().await,
            Err(CaptureError::CaptureFailed(_))
        ));
    }
}
