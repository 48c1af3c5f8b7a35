// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! The session owns:
//! - the single bound input and its [`DeviceController`]
//! - the still-photo output (if one could be attached)
//! - the running flag
//!
//! All configuration goes through [`CaptureSession::configure`], which holds
//! the session mutex for the whole begin / mutate / commit sequence. That
//! guard is the configuration permit: a second configuration call blocks
//! until the first one has committed.

use super::controller::DeviceController;
use super::types::{CameraPosition, InputHandle, OutputHandle};
use super::CameraPlatform;
use crate::errors::{CaptureError, CaptureResult, DeviceError};
use crate::flash::FlashMode;
use crate::pipelines::photo::PendingCapture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Internal session state, guarded by the configuration permit
struct SessionInner {
    controller: DeviceController,
    input: InputHandle,
    output: Option<OutputHandle>,
    /// Whether the caller wants frames flowing
    running: bool,
    /// Set once `stop` ran; the session cannot be restarted afterwards
    stopped: bool,
}

/// Mutable view of the session handed to a configuration body
pub struct ConfigurationScope<'a> {
    platform: &'a dyn CameraPlatform,
    inner: &'a mut SessionInner,
}

impl<'a> ConfigurationScope<'a> {
    pub fn platform(&self) -> &'a dyn CameraPlatform {
        self.platform
    }

    pub fn input(&self) -> &InputHandle {
        &self.inner.input
    }

    pub fn position(&self) -> CameraPosition {
        self.inner.input.device.position
    }

    pub fn controller(&mut self) -> &mut DeviceController {
        &mut self.inner.controller
    }

    /// Replace the bound input; the previous one must already be removed
    fn set_input(&mut self, input: InputHandle) {
        self.inner.controller.retarget(input.device.clone());
        self.inner.input = input;
    }
}

/// Running capture session
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct CaptureSession {
    platform: Arc<dyn CameraPlatform>,
    inner: Arc<Mutex<SessionInner>>,
}

impl CaptureSession {
    /// Bind the device at `position`, attach the photo output and start running
    ///
    /// Fails with [`CaptureError::DeviceUnavailable`] if no device can be
    /// bound. A photo output that cannot be attached is logged and left
    /// absent; captures then report [`CaptureError::OutputUnavailable`].
    pub fn open(
        platform: Arc<dyn CameraPlatform>,
        position: CameraPosition,
        flash: FlashMode,
    ) -> CaptureResult<Self> {
        let device = platform
            .list_device(position)
            .ok_or(CaptureError::DeviceUnavailable(position))?;

        info!(device = %device.name, position = %position, "Opening capture session");

        platform.begin_configuration();
        let input = match platform
            .bind(&device)
            .and_then(|input| platform.add_input(&input).map(|_| input))
        {
            Ok(input) => input,
            Err(e) => {
                platform.commit_configuration();
                error!(device = %device.name, error = %e, "Failed to bind capture device");
                return Err(CaptureError::DeviceUnavailable(position));
            }
        };
        let output = match platform.add_photo_output() {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(error = %e, "Photo output unavailable, captures will fail");
                None
            }
        };
        platform.commit_configuration();
        platform.start_running();

        let mut controller = DeviceController::new(platform.clone(), device, flash);
        if let Err(e) = controller.set_flash_mode(flash) {
            warn!(error = %e, "Could not apply initial flash mode");
        }

        Ok(Self {
            platform,
            inner: Arc::new(Mutex::new(SessionInner {
                controller,
                input,
                output,
                running: true,
                stopped: false,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `body` as one atomic configuration change
    ///
    /// The platform sees begin / body / commit with no other configuration
    /// in between. If the session was running before, it is running again
    /// when this returns, whatever the body's outcome.
    pub fn configure<T>(
        &self,
        body: impl FnOnce(&mut ConfigurationScope<'_>) -> CaptureResult<T>,
    ) -> CaptureResult<T> {
        let mut inner = self.lock();
        if inner.stopped {
            return Err(CaptureError::Terminated);
        }
        let was_running = inner.running;

        self.platform.begin_configuration();
        let result = {
            let mut scope = ConfigurationScope {
                platform: self.platform.as_ref(),
                inner: &mut *inner,
            };
            body(&mut scope)
        };
        self.platform.commit_configuration();

        if was_running && !self.platform.is_running() {
            debug!("Resuming session after configuration");
            self.platform.start_running();
        }
        result
    }

    /// Swap to the device at the opposite position
    ///
    /// On failure the previous input is re-attached, so the session never
    /// ends up without an input.
    pub fn flip(&self) -> CaptureResult<CameraPosition> {
        self.configure(|scope| {
            let previous = scope.input().clone();
            let target = scope.position().flipped();
            let platform = scope.platform();

            platform.remove_input(&previous);

            let bound = platform
                .list_device(target)
                .ok_or(DeviceError::NotFound(target))
                .and_then(|device| platform.bind(&device))
                .and_then(|input| platform.add_input(&input).map(|_| input));

            match bound {
                Ok(input) => {
                    info!(from = %previous.device.position, to = %target, "Camera flipped");
                    scope.set_input(input);
                    Ok(target)
                }
                Err(e) => {
                    warn!(position = %target, error = %e, "Flip failed, restoring previous input");
                    if let Err(restore) = platform.add_input(&previous) {
                        error!(error = %restore, "Failed to restore previous input");
                    }
                    Err(CaptureError::DeviceUnavailable(target))
                }
            }
        })
    }

    /// Run `f` against the device controller while holding the configuration permit
    pub fn with_device<T>(&self, f: impl FnOnce(&mut DeviceController) -> T) -> T {
        let mut inner = self.lock();
        f(&mut inner.controller)
    }

    /// Start a still capture with the current device settings
    pub fn capture_still(&self, mirror_front: bool) -> CaptureResult<PendingCapture> {
        let inner = self.lock();
        if inner.stopped {
            return Err(CaptureError::Terminated);
        }
        let output = inner.output.ok_or(CaptureError::OutputUnavailable)?;
        let position = inner.input.device.position;
        let settings = inner.controller.capture_settings();

        debug!(position = %position, flash = %settings.flash_mode, "Requesting still capture");
        let future = self.platform.capture_still(&output, settings);
        Ok(PendingCapture::new(
            future,
            position,
            mirror_front && position.is_mirrored(),
        ))
    }

    /// Resume frame delivery after `suspend`
    pub fn resume(&self) -> CaptureResult<()> {
        let mut inner = self.lock();
        if inner.stopped {
            return Err(CaptureError::Terminated);
        }
        if !inner.running {
            self.platform.start_running();
            inner.running = true;
            debug!("Session resumed");
        }
        Ok(())
    }

    /// Pause frame delivery (preview hidden); the session stays configured
    pub fn suspend(&self) -> CaptureResult<()> {
        let mut inner = self.lock();
        if inner.stopped {
            return Err(CaptureError::Terminated);
        }
        if inner.running {
            self.platform.stop_running();
            inner.running = false;
            debug!("Session suspended");
        }
        Ok(())
    }

    /// Tear the session down; safe to call any number of times
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.stopped {
            return;
        }
        if inner.running {
            self.platform.stop_running();
        }
        self.platform.begin_configuration();
        self.platform.remove_input(&inner.input);
        self.platform.commit_configuration();
        inner.running = false;
        inner.stopped = true;
        info!("Capture session stopped");
    }

    pub fn is_running(&self) -> bool {
        let inner = self.lock();
        inner.running && self.platform.is_running()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn position(&self) -> CameraPosition {
        self.lock().input.device.position
    }

    pub fn has_output(&self) -> bool {
        self.lock().output.is_some()
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CaptureSession")
            .field("input", &inner.input)
            .field("output", &inner.output)
            .field("running", &inner.running)
            .field("stopped", &inner.stopped)
            .finish()
    }
}
