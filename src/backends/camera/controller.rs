// SPDX-License-Identifier: GPL-3.0-only

//! Device configuration
//!
//! Every mutator takes the device configuration lock, applies one change and
//! releases the lock when the guard drops. If the lock cannot be taken or the
//! device rejects the value, the controller's recorded state is left exactly
//! as it was.

use super::CameraPlatform;
use super::types::{CaptureSettings, DeviceDescriptor, FocusPoint, ZoomFactor};
use crate::errors::{CaptureError, CaptureResult};
use crate::flash::FlashMode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gesture phase of a pinch-to-zoom interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// Exclusive configuration access to one device
///
/// Unlocks on drop.
pub struct ConfigurationLock<'a> {
    platform: &'a dyn CameraPlatform,
    device: &'a DeviceDescriptor,
}

impl<'a> ConfigurationLock<'a> {
    /// Lock `device`, reporting failure as [`CaptureError::ConfigurationLocked`]
    pub fn acquire(
        platform: &'a dyn CameraPlatform,
        device: &'a DeviceDescriptor,
    ) -> CaptureResult<Self> {
        platform.lock_configuration(device).map_err(|e| {
            warn!(device = %device.name, error = %e, "Could not lock device for configuration");
            CaptureError::ConfigurationLocked(e.to_string())
        })?;
        Ok(Self { platform, device })
    }
}

impl Drop for ConfigurationLock<'_> {
    fn drop(&mut self) {
        self.platform.unlock_configuration(self.device);
    }
}

/// Zoom, focus and flash state of the bound device
pub struct DeviceController {
    platform: Arc<dyn CameraPlatform>,
    device: DeviceDescriptor,
    /// Zoom currently applied to the device
    zoom: ZoomFactor,
    /// Zoom a pinch gesture scales from
    committed_zoom: ZoomFactor,
    focus: Option<FocusPoint>,
    flash: FlashMode,
}

impl DeviceController {
    /// Wrap a freshly bound device; zoom starts at 1.0 and focus is unset
    pub fn new(platform: Arc<dyn CameraPlatform>, device: DeviceDescriptor, flash: FlashMode) -> Self {
        Self {
            platform,
            device,
            zoom: ZoomFactor::NONE,
            committed_zoom: ZoomFactor::NONE,
            focus: None,
            flash,
        }
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn zoom(&self) -> ZoomFactor {
        self.zoom
    }

    pub fn focus_point(&self) -> Option<FocusPoint> {
        self.focus
    }

    pub fn flash_mode(&self) -> FlashMode {
        self.flash
    }

    /// Settings for the next still capture
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings::for_flash(self.flash)
    }

    /// Apply a zoom factor without changing the committed value
    fn apply_zoom(&mut self, requested: f64) -> CaptureResult<ZoomFactor> {
        let factor = ZoomFactor::clamped(requested);
        {
            let _lock = ConfigurationLock::acquire(self.platform.as_ref(), &self.device)?;
            self.platform.set_zoom(&self.device, factor.value())?;
        }
        self.zoom = factor;
        debug!(device = %self.device.name, zoom = %factor, "Zoom applied");
        Ok(factor)
    }

    /// Set and commit a zoom factor (slider or programmatic)
    pub fn set_zoom(&mut self, requested: f64) -> CaptureResult<ZoomFactor> {
        let factor = self.apply_zoom(requested)?;
        self.committed_zoom = factor;
        Ok(factor)
    }

    /// Track a pinch gesture
    ///
    /// The factor is `scale` times the zoom committed before the gesture
    /// started. Only the ended phase commits it; a cancelled gesture leaves
    /// everything unchanged.
    pub fn pinch(&mut self, phase: PinchPhase, scale: f64) -> CaptureResult<ZoomFactor> {
        let target = scale * self.committed_zoom.value();
        match phase {
            PinchPhase::Began | PinchPhase::Changed => self.apply_zoom(target),
            PinchPhase::Ended => self.set_zoom(target),
            PinchPhase::Cancelled => Ok(self.zoom),
        }
    }

    /// Focus (and meter exposure) around a normalized point
    pub fn set_focus_point(&mut self, point: FocusPoint) -> CaptureResult<FocusPoint> {
        {
            let _lock = ConfigurationLock::acquire(self.platform.as_ref(), &self.device)?;
            self.platform.set_focus_point(&self.device, point)?;
        }
        self.focus = Some(point);
        debug!(device = %self.device.name, point = %point, "Focus point applied");
        Ok(point)
    }

    /// Push a flash mode to the device
    pub fn set_flash_mode(&mut self, mode: FlashMode) -> CaptureResult<FlashMode> {
        {
            let _lock = ConfigurationLock::acquire(self.platform.as_ref(), &self.device)?;
            self.platform.set_flash_mode(&self.device, mode)?;
        }
        self.flash = mode;
        debug!(device = %self.device.name, flash = %mode, "Flash mode applied");
        Ok(mode)
    }

    /// Step to the next flash mode in the cycle
    pub fn cycle_flash(&mut self) -> CaptureResult<FlashMode> {
        self.set_flash_mode(self.flash.next())
    }

    /// Point the controller at a newly bound device
    ///
    /// Zoom resets to 1.0 on the new device and focus is cleared; the flash
    /// mode carries over. Both are pushed to the device best-effort.
    pub(crate) fn retarget(&mut self, device: DeviceDescriptor) {
        self.device = device;
        self.zoom = ZoomFactor::NONE;
        self.committed_zoom = ZoomFactor::NONE;
        self.focus = None;

        if let Err(e) = self.set_zoom(ZoomFactor::NONE.value()) {
            warn!(device = %self.device.name, error = %e, "Could not reset zoom on new device");
        }

        let flash = self.flash;
        if let Err(e) = self.set_flash_mode(flash) {
            warn!(device = %self.device.name, error = %e, "Could not carry flash mode over to new device");
        }
    }
}

impl std::fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("device", &self.device)
            .field("zoom", &self.zoom)
            .field("focus", &self.focus)
            .field("flash", &self.flash)
            .finish()
    }
}
