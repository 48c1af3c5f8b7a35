// SPDX-License-Identifier: MPL-2.0

//! Camera platform abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │  CaptureSessionManager   │  ← State machine, cap enforcement
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │     CaptureSession       │  ← Running lifecycle, atomic configuration, flip
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │    DeviceController      │  ← Zoom, focus, flash on the bound device
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │  CameraPlatform Trait    │  ← What the OS camera stack provides
//! └──────────────────────────┘
//! ```

pub mod controller;
pub mod session;
pub mod types;

pub use controller::{ConfigurationLock, DeviceController, PinchPhase};
pub use session::{CaptureSession, ConfigurationScope};
pub use types::*;

use crate::errors::DeviceResult;
use futures::future::BoxFuture;

/// Capability surface consumed from the platform camera stack
///
/// Session-level calls (`begin_configuration` .. `stop_running`) are only
/// issued by [`CaptureSession`], which serializes them. Device-level
/// mutators are only issued between a successful `lock_configuration`
/// and the matching `unlock_configuration`.
pub trait CameraPlatform: Send + Sync {
    // ===== Access =====

    /// Ask for permission to use the camera
    fn request_access(&self) -> bool;

    // ===== Discovery and binding =====

    /// Find the capture device at a position
    fn list_device(&self, position: CameraPosition) -> Option<DeviceDescriptor>;

    /// Turn a device into a session input
    fn bind(&self, device: &DeviceDescriptor) -> DeviceResult<InputHandle>;

    // ===== Session graph =====

    /// Open an atomic batch of session changes
    fn begin_configuration(&self);

    /// Apply the batch opened by `begin_configuration`
    fn commit_configuration(&self);

    /// Attach a bound input to the session
    fn add_input(&self, input: &InputHandle) -> DeviceResult<()>;

    /// Detach an input from the session
    fn remove_input(&self, input: &InputHandle);

    /// Attach a still-photo output to the session
    fn add_photo_output(&self) -> DeviceResult<OutputHandle>;

    /// Start delivering frames
    fn start_running(&self);

    /// Stop delivering frames
    fn stop_running(&self);

    /// Whether frames are currently delivered
    fn is_running(&self) -> bool;

    // ===== Device configuration =====

    /// Take exclusive configuration access to a device
    fn lock_configuration(&self, device: &DeviceDescriptor) -> DeviceResult<()>;

    /// Release access taken by `lock_configuration`
    fn unlock_configuration(&self, device: &DeviceDescriptor);

    /// Set the optical/digital zoom factor
    fn set_zoom(&self, device: &DeviceDescriptor, factor: f64) -> DeviceResult<()>;

    /// Set the focus and exposure point of interest (continuous autofocus around it)
    fn set_focus_point(&self, device: &DeviceDescriptor, point: FocusPoint) -> DeviceResult<()>;

    /// Set the flash mode used for still captures
    fn set_flash_mode(&self, device: &DeviceDescriptor, mode: crate::flash::FlashMode)
    -> DeviceResult<()>;

    // ===== Capture =====

    /// Take a still photo, resolving to encoded image bytes
    ///
    /// The returned future completes off the caller's thread; it must not
    /// borrow from the platform.
    fn capture_still(
        &self,
        output: &OutputHandle,
        settings: CaptureSettings,
    ) -> BoxFuture<'static, DeviceResult<Vec<u8>>>;
}
