// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Zoom limits imposed by the capture device
pub mod zoom {
    /// Smallest zoom factor (no magnification)
    pub const MIN_FACTOR: f64 = 1.0;
    /// Largest zoom factor the device accepts
    pub const MAX_FACTOR: f64 = 5.0;
    /// Upper end of the zoom slider (pinch can go further, up to `MAX_FACTOR`)
    pub const SLIDER_MAX: f64 = 4.0;
}

/// Image cap used when the caller does not supply one
pub const DEFAULT_MAX_IMAGES: usize = 10;

/// JPEG quality for images written by the hand-off storage
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Folder created under the pictures directory for saved sessions
pub const DEFAULT_SAVE_FOLDER: &str = "PhotoCapture";

/// Resolution of frames produced by the virtual camera
pub mod virtual_camera {
    /// Frame width in pixels
    pub const FRAME_WIDTH: u32 = 64;
    /// Frame height in pixels
    pub const FRAME_HEIGHT: u32 = 48;
}

/// Timing used by the scripted command-line session
pub mod timing {
    use super::Duration;

    /// How long the CLI waits for a step to produce a notification
    pub const STEP_TIMEOUT: Duration = Duration::from_secs(10);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_inside_device_range() {
        assert!(zoom::SLIDER_MAX > zoom::MIN_FACTOR);
        assert!(zoom::SLIDER_MAX <= zoom::MAX_FACTOR);
    }
}
