// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is the single entry point of the session owner: it routes each
//! message to a handler in `handlers` and returns the async work the owner
//! has to start next. Handler errors become `Notification::Error`; none of
//! them ends the session.

use crate::app::CaptureSessionManager;
use crate::app::state::{
    CaptureRequest, ImportRequest, Message, Notification, SessionEvent, SessionOutcome,
};
use crate::backends::library::ImportedItem;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::PendingCapture;
use futures::stream::BoxStream;
use tracing::debug;

/// Follow-up work produced by an update
pub enum Task {
    None,
    /// Resolve the capture and send back `Message::CaptureCompleted`
    Capture(PendingCapture),
    /// Send back every item as `Message::ImportItem`, then `Message::ImportFinished`
    Import(BoxStream<'static, ImportedItem>),
    /// Deliver the terminal outcome and stop
    Finish(SessionOutcome),
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::None => f.write_str("None"),
            Task::Capture(pending) => f.debug_tuple("Capture").field(pending).finish(),
            Task::Import(_) => f.write_str("Import"),
            Task::Finish(outcome) => f.debug_tuple("Finish").field(outcome).finish(),
        }
    }
}

impl CaptureSessionManager {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            Message::Event(event) => self.handle_event(event),
            Message::CaptureCompleted(result) => {
                let outcome = self.complete_capture(result);
                self.report(outcome);
                Task::None
            }
            Message::ImportItem(item) => {
                let outcome = self.import_item(item);
                self.report(outcome);
                Task::None
            }
            Message::ImportFinished => {
                self.finish_import();
                Task::None
            }
        }
    }

    fn handle_event(&mut self, event: SessionEvent) -> Task {
        debug!(session = %self.id, event = ?event, "Handling session event");

        match event {
            // ===== Capture flow =====
            SessionEvent::Capture => match self.request_capture() {
                Ok(CaptureRequest::Started(pending)) => Task::Capture(pending),
                Ok(CaptureRequest::CapReached) => Task::None,
                Err(e) => self.fail(e),
            },
            SessionEvent::Confirm => {
                let result = self.confirm();
                self.report(result);
                Task::None
            }
            SessionEvent::Reject => {
                let result = self.reject();
                self.report(result);
                Task::None
            }

            // ===== Library import =====
            SessionEvent::Import => match self.request_import() {
                Ok(ImportRequest::Started { items, .. }) => Task::Import(items),
                Ok(ImportRequest::CapReached) => Task::None,
                Err(e) => self.fail(e),
            },
            SessionEvent::CancelImport => {
                let result = self.cancel_import();
                self.report(result);
                Task::None
            }

            // ===== Termination =====
            SessionEvent::Continue => self.finish_with(|m| m.continue_session()),
            SessionEvent::AcknowledgeCap => self.finish_with(|m| m.acknowledge_cap()),
            SessionEvent::Cancel => self.finish_with(|m| m.cancel()),

            // ===== Camera controls =====
            SessionEvent::SetZoom(factor) => {
                let result = self.set_zoom(factor);
                self.report(result);
                Task::None
            }
            SessionEvent::SliderZoom(value) => {
                let result = self.slider_zoom(value);
                self.report(result);
                Task::None
            }
            SessionEvent::Pinch { phase, scale } => {
                let result = self.pinch(phase, scale);
                self.report(result);
                Task::None
            }
            SessionEvent::FocusAt { x, y, viewport } => {
                let result = self.focus_at(x, y, viewport);
                self.report(result);
                Task::None
            }
            SessionEvent::CycleFlash => {
                let result = self.cycle_flash();
                self.report(result);
                Task::None
            }
            SessionEvent::Flip => {
                let result = self.flip();
                self.report(result);
                Task::None
            }
            SessionEvent::Suspend => {
                let result = self.suspend();
                self.report(result);
                Task::None
            }
            SessionEvent::Resume => {
                let result = self.resume();
                self.report(result);
                Task::None
            }
        }
    }

    fn finish_with(
        &mut self,
        op: impl FnOnce(&mut Self) -> CaptureResult<SessionOutcome>,
    ) -> Task {
        match op(self) {
            Ok(outcome) => Task::Finish(outcome),
            Err(e) => self.fail(e),
        }
    }

    /// Turn a handler error into a notification
    fn report<T>(&mut self, result: CaptureResult<T>) {
        if let Err(e) = result {
            self.fail(e);
        }
    }

    fn fail(&mut self, error: CaptureError) -> Task {
        debug!(session = %self.id, error = %error, "Operation failed");
        self.notify(Notification::Error(error));
        Task::None
    }
}
