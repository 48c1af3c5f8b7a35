// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera platform abstraction

//! Shared types for camera platforms

use crate::constants::zoom;
use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};

/// Which way the camera faces
///
/// Toggled by the flip control; never set freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    /// Faces the user (selfie camera)
    Front,
    /// Faces away from the user
    #[default]
    Back,
}

impl CameraPosition {
    /// The opposite position
    pub fn flipped(self) -> Self {
        match self {
            CameraPosition::Front => CameraPosition::Back,
            CameraPosition::Back => CameraPosition::Front,
        }
    }

    /// Front sensors deliver optically mirrored images
    pub fn is_mirrored(self) -> bool {
        matches!(self, CameraPosition::Front)
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
        }
    }
}

/// Zoom factor, always within the device range
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ZoomFactor(f64);

impl ZoomFactor {
    /// No magnification
    pub const NONE: ZoomFactor = ZoomFactor(zoom::MIN_FACTOR);

    /// Clamp a requested factor into `[MIN_FACTOR, MAX_FACTOR]`
    ///
    /// NaN requests map to the minimum.
    pub fn clamped(requested: f64) -> Self {
        if requested.is_nan() {
            return Self::NONE;
        }
        ZoomFactor(requested.clamp(zoom::MIN_FACTOR, zoom::MAX_FACTOR))
    }

    /// Raw factor
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ZoomFactor {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::fmt::Display for ZoomFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}x", self.0)
    }
}

/// Normalized point of interest, both axes in `[0, 1]` from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    /// Center of the frame
    pub const CENTER: FocusPoint = FocusPoint { x: 0.5, y: 0.5 };

    /// Create a point, clamping both coordinates into `[0, 1]`
    pub fn new(x: f64, y: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }
}

impl std::fmt::Display for FocusPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Size of the view the preview is rendered into
///
/// Passed explicitly to whatever needs to map view coordinates onto the
/// sensor; there is no global window to ask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map a tap location in view coordinates to a normalized focus point
    ///
    /// Returns `None` for a degenerate viewport.
    pub fn normalize(&self, x: f64, y: f64) -> Option<FocusPoint> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(FocusPoint::new(x / self.width, y / self.height))
    }
}

/// Settings attached to a single still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub flash_mode: FlashMode,
    pub high_resolution: bool,
}

impl CaptureSettings {
    /// Settings used for every shot of the session
    pub fn for_flash(flash_mode: FlashMode) -> Self {
        Self {
            flash_mode,
            high_resolution: false,
        }
    }
}

/// A capture device reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform-unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Where the device faces
    pub position: CameraPosition,
}

/// A device bound as a session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputHandle {
    pub id: u64,
    pub device: DeviceDescriptor,
}

/// The still-photo output attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputHandle {
    pub id: u64,
}
