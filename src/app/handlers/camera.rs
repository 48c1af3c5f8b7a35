// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Zoom, focus, flash, flip and preview visibility. Failures leave the
//! device state as it was; `ConfigurationLocked` is returned to the caller
//! and never retried here.

use crate::app::CaptureSessionManager;
use crate::app::state::Notification;
use crate::backends::camera::{
    CameraPosition, FocusPoint, PinchPhase, Viewport, ZoomFactor,
};
use crate::constants::zoom;
use crate::errors::{CaptureError, CaptureResult, DeviceError};
use crate::flash::FlashMode;
use tracing::{debug, info};

impl CaptureSessionManager {
    // =========================================================================
    // Zoom
    // =========================================================================

    /// Set and commit a zoom factor, clamped to the device range
    pub fn set_zoom(&mut self, factor: f64) -> CaptureResult<ZoomFactor> {
        let session = self.require_session("zoom")?;
        let applied = session.with_device(|device| device.set_zoom(factor))?;
        self.notify(Notification::ZoomChanged(applied));
        Ok(applied)
    }

    /// Zoom slider moved
    ///
    /// The slider only spans `[MIN_FACTOR, SLIDER_MAX]`.
    pub fn slider_zoom(&mut self, value: f64) -> CaptureResult<ZoomFactor> {
        let value = if value.is_nan() {
            zoom::MIN_FACTOR
        } else {
            value.clamp(zoom::MIN_FACTOR, zoom::SLIDER_MAX)
        };
        self.set_zoom(value)
    }

    /// Pinch gesture update
    pub fn pinch(&mut self, phase: PinchPhase, scale: f64) -> CaptureResult<ZoomFactor> {
        let session = self.require_session("zoom")?;
        let applied = session.with_device(|device| device.pinch(phase, scale))?;
        if phase != PinchPhase::Cancelled {
            self.notify(Notification::ZoomChanged(applied));
        }
        Ok(applied)
    }

    pub fn zoom(&self) -> Option<ZoomFactor> {
        self.session()
            .map(|session| session.with_device(|device| device.zoom()))
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Focus where the user tapped on a preview rendered at `viewport`
    pub fn focus_at(&mut self, x: f64, y: f64, viewport: Viewport) -> CaptureResult<FocusPoint> {
        let session = self.require_session("focus")?;
        let point = viewport.normalize(x, y).ok_or_else(|| {
            CaptureError::Device(DeviceError::Unsupported(format!(
                "tap in empty viewport {}x{}",
                viewport.width, viewport.height
            )))
        })?;
        let applied = session.with_device(|device| device.set_focus_point(point))?;
        debug!(session = %self.id, point = %applied, "Focus point set");
        self.notify(Notification::FocusChanged(applied));
        Ok(applied)
    }

    // =========================================================================
    // Flash
    // =========================================================================

    /// Step the flash mode: auto, on, off, auto
    pub fn cycle_flash(&mut self) -> CaptureResult<FlashMode> {
        let session = self.require_session("change flash")?;
        let mode = session.with_device(|device| device.cycle_flash())?;
        self.notify(Notification::FlashChanged(mode));
        Ok(mode)
    }

    pub fn flash_mode(&self) -> Option<FlashMode> {
        self.session()
            .map(|session| session.with_device(|device| device.flash_mode()))
    }

    // =========================================================================
    // Flip
    // =========================================================================

    /// Switch between front and back camera
    ///
    /// Rejected while a still capture is in flight. On failure the previous
    /// camera stays bound and running.
    pub fn flip(&mut self) -> CaptureResult<CameraPosition> {
        let session = self.require_session("flip")?;
        if self.capture_in_flight {
            return Err(CaptureError::CaptureInProgress);
        }
        let position = session.flip()?;
        info!(session = %self.id, position = %position, "Camera flipped");
        self.notify(Notification::CameraFlipped(position));
        self.notify(Notification::ZoomChanged(ZoomFactor::NONE));
        Ok(position)
    }

    // =========================================================================
    // Preview visibility
    // =========================================================================

    /// Stop frame delivery while the preview is hidden
    pub fn suspend(&mut self) -> CaptureResult<()> {
        self.require_session("suspend")?.suspend()
    }

    /// Restart frame delivery when the preview is shown again
    pub fn resume(&mut self) -> CaptureResult<()> {
        self.require_session("resume")?.resume()
    }
}
