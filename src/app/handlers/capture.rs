// SPDX-License-Identifier: GPL-3.0-only

//! Capture and hand-off handlers
//!
//! Live shot flow (request, completion, confirm/reject) and the terminal
//! operations (continue, cap acknowledgement, cancel).

use crate::app::CaptureSessionManager;
use crate::app::state::{CaptureRequest, Notification, SessionOutcome, SessionState};
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::CapturedImage;
use tracing::{debug, info, warn};

impl CaptureSessionManager {
    // =========================================================================
    // Live Capture
    // =========================================================================

    /// Ask the device for a still
    ///
    /// At cap no device call is made; the cap-reached prompt is raised
    /// instead. The returned capture must be resolved off this thread and
    /// its result passed to [`complete_capture`](Self::complete_capture).
    pub fn request_capture(&mut self) -> CaptureResult<CaptureRequest> {
        let session = self.require_session("capture")?;

        match self.state {
            SessionState::AwaitingConfirm if self.capture_in_flight => {
                return Err(CaptureError::CaptureInProgress);
            }
            SessionState::AwaitingConfirm => return Err(CaptureError::SlotOccupied),
            _ => {}
        }
        if self.photos.is_full() {
            info!(session = %self.id, count = self.count(), "Capture requested at cap");
            self.set_state(SessionState::AtCap);
            self.notify(Notification::CapReached { count: self.count() });
            return Ok(CaptureRequest::CapReached);
        }

        if self.is_importing() {
            return Err(CaptureError::ImportInProgress);
        }

        let pending = session.capture_still(self.config.mirror_front_captures)?;
        debug!(
            session = %self.id,
            position = %pending.position(),
            mirror = pending.mirrors(),
            "Still capture started"
        );
        self.capture_in_flight = true;
        self.set_state(SessionState::AwaitingConfirm);
        Ok(CaptureRequest::Started(pending))
    }

    /// Feed back the result of a capture started by `request_capture`
    pub fn complete_capture(&mut self, result: CaptureResult<CapturedImage>) -> CaptureResult<()> {
        if self.state == SessionState::Terminated {
            debug!(session = %self.id, "Dropping capture result of terminated session");
            return Err(CaptureError::Terminated);
        }
        if !self.capture_in_flight {
            warn!(session = %self.id, "Capture result without a capture in flight");
            return Err(self.invalid("complete a capture"));
        }
        self.capture_in_flight = false;

        match result {
            Ok(image) => {
                self.gate.offer(image.clone())?;
                self.notify(Notification::PreviewReady(image));
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Still capture failed");
                let resting = self.resting_state();
                self.set_state(resting);
                Err(e)
            }
        }
    }

    /// Keep the pending shot; returns the new image count
    pub fn confirm(&mut self) -> CaptureResult<usize> {
        if !self.state.is_active() {
            return Err(self.invalid("confirm"));
        }
        let image = self.gate.confirm()?;
        let count = match self.photos.try_push(image) {
            Ok(count) => count,
            Err(e) => {
                let resting = self.resting_state();
                self.set_state(resting);
                return Err(e);
            }
        };

        info!(session = %self.id, count, max_count = self.max_count(), "Photo confirmed");
        self.notify(Notification::PhotoAdded { count });

        let resting = self.resting_state();
        self.set_state(resting);
        if resting == SessionState::AtCap {
            self.notify(Notification::CapReached { count });
        }
        Ok(count)
    }

    /// Discard the pending shot
    pub fn reject(&mut self) -> CaptureResult<()> {
        if !self.state.is_active() {
            return Err(self.invalid("reject"));
        }
        self.gate.reject()?;
        debug!(session = %self.id, "Photo rejected");
        let resting = self.resting_state();
        self.set_state(resting);
        Ok(())
    }

    // =========================================================================
    // Termination
    // =========================================================================

    /// Hand off the images collected so far
    ///
    /// A running import is cancelled; items it has already delivered are
    /// part of the hand-off.
    pub fn continue_session(&mut self) -> CaptureResult<SessionOutcome> {
        match self.state {
            SessionState::Live | SessionState::AtCap => {}
            _ => return Err(self.invalid("continue")),
        }
        info!(session = %self.id, count = self.count(), "Handing off session images");
        Ok(self.terminate(true))
    }

    /// Accept the cap-reached prompt and hand off the full set
    pub fn acknowledge_cap(&mut self) -> CaptureResult<SessionOutcome> {
        if self.state != SessionState::AtCap {
            return Err(self.invalid("acknowledge the cap"));
        }
        info!(session = %self.id, count = self.count(), "Cap acknowledged, handing off");
        Ok(self.terminate(true))
    }

    /// Abandon the session; valid from any state but `Terminated`
    pub fn cancel(&mut self) -> CaptureResult<SessionOutcome> {
        if self.state == SessionState::Terminated {
            return Err(CaptureError::Terminated);
        }
        info!(session = %self.id, discarded = self.count(), "Session cancelled");
        Ok(self.terminate(false))
    }
}
