// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera platform
//!
//! An in-process [`CameraPlatform`] with a front and a back device. Captured
//! frames are either a synthetic gradient or a still image loaded from disk,
//! so the session can run on machines without camera hardware and in tests.
//!
//! The front device delivers the frame exactly as the back one would; the
//! capture path is responsible for mirroring front shots.
//!
//! Faults can be injected per instance (missing devices, busy configuration
//! locks, failing captures, no photo output) and the recorded device state
//! can be inspected afterwards.

use crate::backends::camera::{
    CameraPlatform, CameraPosition, CaptureSettings, DeviceDescriptor, FocusPoint, InputHandle,
    OutputHandle,
};
use crate::constants::{virtual_camera as frame, zoom};
use crate::errors::{DeviceError, DeviceResult};
use crate::flash::FlashMode;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Recorded state of one virtual device
#[derive(Debug, Clone)]
struct DeviceState {
    present: bool,
    focus_supported: bool,
    locked: bool,
    zoom: f64,
    flash: Option<FlashMode>,
    focus: Option<FocusPoint>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            present: true,
            focus_supported: true,
            locked: false,
            zoom: zoom::MIN_FACTOR,
            flash: None,
            focus: None,
        }
    }
}

#[derive(Debug)]
struct PlatformState {
    access_granted: bool,
    devices: HashMap<CameraPosition, DeviceState>,
    photo_output: bool,
    inputs: Vec<InputHandle>,
    running: bool,
    configuration_depth: u32,
    depth_log: Vec<u32>,
    lock_failures: u32,
    capture_failures: u32,
    capture_delay: Option<Duration>,
    captures: u32,
    last_settings: Option<CaptureSettings>,
    next_id: u64,
    source: Option<Arc<RgbaImage>>,
}

/// Software camera platform
#[derive(Debug)]
pub struct VirtualCamera {
    state: Mutex<PlatformState>,
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualCamera {
    /// Both devices present, access granted, no faults
    pub fn new() -> Self {
        let devices = [CameraPosition::Back, CameraPosition::Front]
            .into_iter()
            .map(|position| (position, DeviceState::default()))
            .collect();

        Self {
            state: Mutex::new(PlatformState {
                access_granted: true,
                devices,
                photo_output: true,
                inputs: Vec::new(),
                running: false,
                configuration_depth: 0,
                depth_log: Vec::new(),
                lock_failures: 0,
                capture_failures: 0,
                capture_delay: None,
                captures: 0,
                last_settings: None,
                next_id: 1,
                source: None,
            }),
        }
    }

    /// Serve captures from an image file instead of the synthetic gradient
    pub fn from_image_file(path: &Path) -> DeviceResult<Self> {
        let img = image::open(path)
            .map_err(|e| DeviceError::CaptureFailed(format!("Failed to load {}: {}", path.display(), e)))?
            .to_rgba8();
        info!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "Virtual camera serving image file"
        );
        Ok(Self::new().with_source_image(img))
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Builders =====

    pub fn with_source_image(self, image: RgbaImage) -> Self {
        self.lock().source = Some(Arc::new(image));
        self
    }

    pub fn without_device(self, position: CameraPosition) -> Self {
        self.device_mut(position, |d| d.present = false);
        self
    }

    pub fn without_focus_support(self, position: CameraPosition) -> Self {
        self.device_mut(position, |d| d.focus_supported = false);
        self
    }

    pub fn without_photo_output(self) -> Self {
        self.lock().photo_output = false;
        self
    }

    pub fn deny_access(self) -> Self {
        self.lock().access_granted = false;
        self
    }

    /// Delay every capture by `delay` before it resolves
    pub fn with_capture_delay(self, delay: Duration) -> Self {
        self.lock().capture_delay = Some(delay);
        self
    }

    // ===== Fault injection =====

    /// Make the next `count` configuration lock attempts fail
    pub fn fail_next_locks(&self, count: u32) {
        self.lock().lock_failures = count;
    }

    /// Make the next `count` still captures fail
    pub fn fail_next_captures(&self, count: u32) {
        self.lock().capture_failures = count;
    }

    // ===== Inspection =====

    pub fn zoom_of(&self, position: CameraPosition) -> f64 {
        self.device(position).zoom
    }

    pub fn flash_of(&self, position: CameraPosition) -> Option<FlashMode> {
        self.device(position).flash
    }

    pub fn focus_of(&self, position: CameraPosition) -> Option<FocusPoint> {
        self.device(position).focus
    }

    pub fn is_locked(&self, position: CameraPosition) -> bool {
        self.device(position).locked
    }

    /// Positions of the inputs currently attached, in attach order
    pub fn input_positions(&self) -> Vec<CameraPosition> {
        self.lock()
            .inputs
            .iter()
            .map(|input| input.device.position)
            .collect()
    }

    /// Nesting depth recorded after every begin and commit
    pub fn configuration_depth_log(&self) -> Vec<u32> {
        self.lock().depth_log.clone()
    }

    /// Number of captures issued so far
    pub fn capture_count(&self) -> u32 {
        self.lock().captures
    }

    pub fn last_capture_settings(&self) -> Option<CaptureSettings> {
        self.lock().last_settings
    }

    /// The frame a back-camera capture delivers
    pub fn reference_frame(&self) -> RgbaImage {
        match &self.lock().source {
            Some(source) => source.as_ref().clone(),
            None => gradient_frame(),
        }
    }

    fn device(&self, position: CameraPosition) -> DeviceState {
        self.lock()
            .devices
            .get(&position)
            .cloned()
            .unwrap_or_default()
    }

    fn device_mut(&self, position: CameraPosition, f: impl FnOnce(&mut DeviceState)) {
        if let Some(device) = self.lock().devices.get_mut(&position) {
            f(device);
        }
    }

    /// Run `f` on a present, locked device
    fn with_locked_device(
        &self,
        descriptor: &DeviceDescriptor,
        f: impl FnOnce(&mut DeviceState) -> DeviceResult<()>,
    ) -> DeviceResult<()> {
        let mut state = self.lock();
        let device = state
            .devices
            .get_mut(&descriptor.position)
            .filter(|d| d.present)
            .ok_or(DeviceError::NotFound(descriptor.position))?;
        if !device.locked {
            return Err(DeviceError::LockFailed(format!(
                "{} is not locked for configuration",
                descriptor.name
            )));
        }
        f(device)
    }
}

/// Left-to-right red ramp, top-to-bottom green ramp
///
/// No two columns are equal, so a mirrored frame never matches the original.
fn gradient_frame() -> RgbaImage {
    let (w, h) = (frame::FRAME_WIDTH, frame::FRAME_HEIGHT);
    RgbaImage::from_fn(w, h, |x, y| {
        let r = (x * 255 / (w - 1)) as u8;
        let g = (y * 255 / (h - 1)) as u8;
        Rgba([r, g, 96, 255])
    })
}

/// Encode losslessly so decoded captures compare pixel-exact
fn encode_png(image: &RgbaImage) -> DeviceResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| DeviceError::CaptureFailed(format!("Failed to encode frame: {}", e)))?;
    Ok(bytes)
}

fn descriptor_for(position: CameraPosition) -> DeviceDescriptor {
    let (id, name) = match position {
        CameraPosition::Back => ("virtual:back", "Virtual Back Camera"),
        CameraPosition::Front => ("virtual:front", "Virtual Front Camera"),
    };
    DeviceDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        position,
    }
}

impl CameraPlatform for VirtualCamera {
    fn request_access(&self) -> bool {
        self.lock().access_granted
    }

    fn list_device(&self, position: CameraPosition) -> Option<DeviceDescriptor> {
        let state = self.lock();
        state
            .devices
            .get(&position)
            .filter(|d| d.present)
            .map(|_| descriptor_for(position))
    }

    fn bind(&self, device: &DeviceDescriptor) -> DeviceResult<InputHandle> {
        let mut state = self.lock();
        let present = state
            .devices
            .get(&device.position)
            .is_some_and(|d| d.present);
        if !present {
            return Err(DeviceError::BindFailed(format!("{} is gone", device.name)));
        }
        let id = state.next_id;
        state.next_id += 1;
        debug!(device = %device.name, id, "Device bound");
        Ok(InputHandle {
            id,
            device: device.clone(),
        })
    }

    fn begin_configuration(&self) {
        let mut state = self.lock();
        state.configuration_depth += 1;
        let depth = state.configuration_depth;
        state.depth_log.push(depth);
    }

    fn commit_configuration(&self) {
        let mut state = self.lock();
        if state.configuration_depth == 0 {
            warn!("Commit without matching begin");
        }
        state.configuration_depth = state.configuration_depth.saturating_sub(1);
        let depth = state.configuration_depth;
        state.depth_log.push(depth);
    }

    fn add_input(&self, input: &InputHandle) -> DeviceResult<()> {
        let mut state = self.lock();
        if !state.inputs.is_empty() {
            return Err(DeviceError::BindFailed(
                "session already has an input".to_string(),
            ));
        }
        state.inputs.push(input.clone());
        Ok(())
    }

    fn remove_input(&self, input: &InputHandle) {
        self.lock().inputs.retain(|i| i.id != input.id);
    }

    fn add_photo_output(&self) -> DeviceResult<OutputHandle> {
        let mut state = self.lock();
        if !state.photo_output {
            return Err(DeviceError::OutputFailed(
                "photo output cannot be attached".to_string(),
            ));
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok(OutputHandle { id })
    }

    fn start_running(&self) {
        self.lock().running = true;
    }

    fn stop_running(&self) {
        self.lock().running = false;
    }

    fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock_configuration(&self, descriptor: &DeviceDescriptor) -> DeviceResult<()> {
        let mut state = self.lock();
        if state.lock_failures > 0 {
            state.lock_failures -= 1;
            return Err(DeviceError::LockFailed(format!("{} is busy", descriptor.name)));
        }
        let device = state
            .devices
            .get_mut(&descriptor.position)
            .filter(|d| d.present)
            .ok_or(DeviceError::NotFound(descriptor.position))?;
        if device.locked {
            return Err(DeviceError::LockFailed(format!(
                "{} is already locked",
                descriptor.name
            )));
        }
        device.locked = true;
        Ok(())
    }

    fn unlock_configuration(&self, descriptor: &DeviceDescriptor) {
        self.device_mut(descriptor.position, |d| d.locked = false);
    }

    fn set_zoom(&self, descriptor: &DeviceDescriptor, factor: f64) -> DeviceResult<()> {
        self.with_locked_device(descriptor, |device| {
            if !(zoom::MIN_FACTOR..=zoom::MAX_FACTOR).contains(&factor) {
                return Err(DeviceError::Unsupported(format!("zoom factor {}", factor)));
            }
            device.zoom = factor;
            Ok(())
        })
    }

    fn set_focus_point(&self, descriptor: &DeviceDescriptor, point: FocusPoint) -> DeviceResult<()> {
        self.with_locked_device(descriptor, |device| {
            if !device.focus_supported {
                return Err(DeviceError::Unsupported(
                    "focus point of interest".to_string(),
                ));
            }
            device.focus = Some(point);
            Ok(())
        })
    }

    fn set_flash_mode(&self, descriptor: &DeviceDescriptor, mode: FlashMode) -> DeviceResult<()> {
        self.with_locked_device(descriptor, |device| {
            device.flash = Some(mode);
            Ok(())
        })
    }

    fn capture_still(
        &self,
        output: &OutputHandle,
        settings: CaptureSettings,
    ) -> BoxFuture<'static, DeviceResult<Vec<u8>>> {
        let mut state = self.lock();
        state.captures += 1;
        state.last_settings = Some(settings);
        let delay = state.capture_delay;

        let outcome = if state.capture_failures > 0 {
            state.capture_failures -= 1;
            Err(DeviceError::CaptureFailed("sensor readout failed".to_string()))
        } else if !state.running {
            Err(DeviceError::CaptureFailed("session is not running".to_string()))
        } else {
            Ok(state.source.clone())
        };
        drop(state);

        debug!(output = output.id, flash = %settings.flash_mode, "Virtual capture issued");

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let frame = match outcome? {
                Some(source) => source,
                None => Arc::new(gradient_frame()),
            };
            encode_png(&frame)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_both_positions() {
        let camera = VirtualCamera::new();
        assert_eq!(
            camera.list_device(CameraPosition::Front).unwrap().position,
            CameraPosition::Front
        );
        assert!(camera.list_device(CameraPosition::Back).is_some());
        assert!(
            VirtualCamera::new()
                .without_device(CameraPosition::Front)
                .list_device(CameraPosition::Front)
                .is_none()
        );
    }

    #[test]
    fn test_mutators_require_lock() {
        let camera = VirtualCamera::new();
        let device = camera.list_device(CameraPosition::Back).unwrap();
        assert!(camera.set_zoom(&device, 2.0).is_err());

        camera.lock_configuration(&device).unwrap();
        assert!(camera.lock_configuration(&device).is_err());
        camera.set_zoom(&device, 2.0).unwrap();
        camera.unlock_configuration(&device);

        assert_eq!(camera.zoom_of(CameraPosition::Back), 2.0);
        assert!(!camera.is_locked(CameraPosition::Back));
    }

    #[test]
    fn test_injected_lock_failures_run_out() {
        let camera = VirtualCamera::new();
        let device = camera.list_device(CameraPosition::Back).unwrap();
        camera.fail_next_locks(1);
        assert!(camera.lock_configuration(&device).is_err());
        assert!(camera.lock_configuration(&device).is_ok());
    }

    #[test]
    fn test_gradient_is_not_symmetric() {
        let frame = gradient_frame();
        assert_ne!(frame, image::imageops::flip_horizontal(&frame));
    }

    #[tokio::test]
    async fn test_capture_delivers_reference_frame() {
        let camera = VirtualCamera::new();
        camera.start_running();
        let output = camera.add_photo_output().unwrap();
        let bytes = camera
            .capture_still(&output, CaptureSettings::for_flash(FlashMode::Off))
            .await
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, camera.reference_frame());
        assert_eq!(camera.capture_count(), 1);
        assert_eq!(
            camera.last_capture_settings().map(|s| s.flash_mode),
            Some(FlashMode::Off)
        );
    }

    #[tokio::test]
    async fn test_capture_fails_when_not_running() {
        let camera = VirtualCamera::new();
        let output = camera.add_photo_output().unwrap();
        let result = camera
            .capture_still(&output, CaptureSettings::for_flash(FlashMode::Auto))
            .await;
        assert!(matches!(result, Err(DeviceError::CaptureFailed(_))));
    }
}
