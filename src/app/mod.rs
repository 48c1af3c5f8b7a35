// SPDX-License-Identifier: MPL-2.0

//! Capture session core
//!
//! This module contains the session state machine and everything it owns.
//!
//! # Architecture
//!
//! - `state`: State, event, notification and outcome types
//! - `preview_gate`: Single-slot confirmation of live shots
//! - `photos`: The capped image set
//! - `handlers`: Operations grouped by concern (capture, camera, import)
//! - `update`: Message dispatch for the owner task
//! - `runtime`: Owner task, channels and the caller-side handle
//!
//! # Main Types
//!
//! - `CaptureSessionManager`: State machine with cap enforcement
//! - `SessionRuntime` / `SessionHandle`: Async driver for one session
//!
//! The manager itself is synchronous `&mut self` state. Device and picker
//! completions are returned to the caller as futures and streams, and their
//! results come back through `complete_capture` and `import_item` on the
//! same owner.

mod handlers;
mod photos;
mod preview_gate;
mod runtime;
mod state;
mod update;

pub use photos::CapturedImageSet;
pub use preview_gate::PreviewGate;
pub use runtime::{SessionHandle, SessionRuntime};
pub use state::{
    CaptureRequest, ImportRequest, Message, Notification, SessionEvent, SessionOutcome,
    SessionState,
};
pub use update::Task;

use crate::backends::camera::{CameraPlatform, CameraPosition, CaptureSession};
use crate::backends::library::{ImportCancel, LibraryImportAdapter, LibraryPicker};
use crate::config::Config;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::CapturedImage;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// State machine for one multi-shot capture session
pub struct CaptureSessionManager {
    id: Uuid,
    platform: Arc<dyn CameraPlatform>,
    importer: LibraryImportAdapter,
    config: Config,
    state: SessionState,
    session: Option<CaptureSession>,
    photos: CapturedImageSet,
    gate: PreviewGate,
    /// A still capture was issued and has not come back yet
    capture_in_flight: bool,
    /// Cancel flag of the running import, if any
    import: Option<ImportCancel>,
    notifications: Vec<Notification>,
}

impl CaptureSessionManager {
    pub fn new(
        platform: Arc<dyn CameraPlatform>,
        picker: Arc<dyn LibraryPicker>,
        config: Config,
    ) -> Self {
        let photos = CapturedImageSet::new(config.default_max_count);
        Self {
            id: Uuid::new_v4(),
            platform,
            importer: LibraryImportAdapter::new(picker),
            config,
            state: SessionState::Idle,
            session: None,
            photos,
            gate: PreviewGate::new(),
            capture_in_flight: false,
            import: None,
            notifications: Vec::new(),
        }
    }

    /// Bind the camera and go live
    ///
    /// `max_count` falls back to the configured default. Fails without
    /// creating a session if camera access is refused or no device can be
    /// bound.
    pub fn start(&mut self, max_count: Option<usize>) -> CaptureResult<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start"));
        }
        let max_count = max_count.unwrap_or(self.config.default_max_count);
        if max_count == 0 {
            return Err(CaptureError::InvalidMaxCount(max_count));
        }
        if !self.platform.request_access() {
            return Err(CaptureError::AccessDenied);
        }

        let session = CaptureSession::open(
            self.platform.clone(),
            self.config.initial_position,
            self.config.default_flash_mode,
        )?;

        info!(
            session = %self.id,
            max_count,
            position = %session.position(),
            "Capture session started"
        );

        self.session = Some(session);
        self.photos = CapturedImageSet::new(max_count);
        self.set_state(SessionState::Live);
        Ok(())
    }

    // ===== Accessors =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.photos.len()
    }

    pub fn max_count(&self) -> usize {
        self.photos.max_count()
    }

    /// Images that can still be added; the picker selection limit
    pub fn remaining(&self) -> usize {
        self.photos.remaining()
    }

    pub fn photos(&self) -> &[CapturedImage] {
        self.photos.as_slice()
    }

    pub fn pending_shot(&self) -> Option<&CapturedImage> {
        self.gate.pending()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_in_flight
    }

    pub fn is_importing(&self) -> bool {
        self.import.is_some()
    }

    /// Whether a "continue" control should be offered
    pub fn continue_available(&self) -> bool {
        matches!(self.state, SessionState::Live | SessionState::AtCap) && !self.photos.is_empty()
    }

    /// Position of the bound camera while the session is active
    pub fn position(&self) -> Option<CameraPosition> {
        self.active_session().map(|session| session.position())
    }

    /// Zoom is only offered for the back camera
    pub fn zoom_control_available(&self) -> bool {
        self.position() == Some(CameraPosition::Back)
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Notifications produced since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ===== Internal helpers =====

    fn active_session(&self) -> Option<&CaptureSession> {
        self.session.as_ref().filter(|_| self.state.is_active())
    }

    /// The bound session, or why `operation` cannot run now
    fn require_session(&self, operation: &'static str) -> CaptureResult<CaptureSession> {
        match self.state {
            SessionState::Terminated => Err(CaptureError::Terminated),
            _ => self
                .active_session()
                .cloned()
                .ok_or_else(|| self.invalid(operation)),
        }
    }

    fn invalid(&self, operation: &'static str) -> CaptureError {
        match self.state {
            SessionState::Terminated => CaptureError::Terminated,
            state => CaptureError::InvalidState { operation, state },
        }
    }

    /// State to return to once nothing is pending
    fn resting_state(&self) -> SessionState {
        if self.photos.is_full() {
            SessionState::AtCap
        } else {
            SessionState::Live
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!(session = %self.id, from = %self.state, to = %state, "Session state changed");
        self.state = state;
        self.notify(Notification::StateChanged {
            state,
            count: self.photos.len(),
        });
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Tear everything down and produce the terminal outcome
    fn terminate(&mut self, handoff: bool) -> SessionOutcome {
        if let Some(cancel) = self.import.take() {
            cancel.cancel();
        }
        if let Some(session) = &self.session {
            session.stop();
        }
        self.gate.clear();
        self.capture_in_flight = false;

        let outcome = if handoff {
            SessionOutcome::Completed(self.photos.take())
        } else {
            self.photos.take();
            SessionOutcome::Cancelled
        };
        self.set_state(SessionState::Terminated);
        outcome
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.stop();
        }
    }
}

impl std::fmt::Debug for CaptureSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionManager")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("count", &self.photos.len())
            .field("max_count", &self.photos.max_count())
            .field("capture_in_flight", &self.capture_in_flight)
            .field("importing", &self.import.is_some())
            .finish()
    }
}
