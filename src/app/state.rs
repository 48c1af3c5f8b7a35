// SPDX-License-Identifier: GPL-3.0-only

//! Session state, events and notifications

use crate::backends::camera::{CameraPosition, FocusPoint, PinchPhase, Viewport, ZoomFactor};
use crate::backends::library::ImportedItem;
use crate::errors::{CaptureError, CaptureResult};
use crate::flash::FlashMode;
use crate::pipelines::photo::{CapturedImage, PendingCapture};
use futures::stream::BoxStream;

/// Session state machine
///
/// ```text
/// Idle ──start──▶ Live ◀──reject── AwaitingConfirm
///                  │ ▲                ▲    │
///                  │ └────────────────┼────┤ confirm (count < max)
///                  │  requestCapture  │    │
///                  ├──────────────────┘    ▼
///                  └──count == max──────▶ AtCap
///
/// Live / AtCap ──continue──▶ Terminated ◀──cancel── any
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not started yet
    #[default]
    Idle,
    /// Device running, waiting for the user
    Live,
    /// A still capture is in flight or its result waits for confirmation
    AwaitingConfirm,
    /// The image set is full; only hand-off or cancel remain
    AtCap,
    /// Hand-off or cancel emitted; nothing else is accepted
    Terminated,
}

impl SessionState {
    /// Whether the camera is bound and configuration calls are accepted
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Live | SessionState::AwaitingConfirm | SessionState::AtCap
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Live => "live",
            SessionState::AwaitingConfirm => "awaiting confirmation",
            SessionState::AtCap => "at cap",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Everything the presentation layer can ask of a session
///
/// One variant per control.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Capture,
    Confirm,
    Reject,
    Import,
    CancelImport,
    /// Hand off the images collected so far
    Continue,
    /// Accept the cap-reached prompt
    AcknowledgeCap,
    Cancel,
    SetZoom(f64),
    /// Zoom slider moved; the slider covers a narrower range than pinch
    SliderZoom(f64),
    Pinch { phase: PinchPhase, scale: f64 },
    /// Tap in view coordinates of a preview rendered at `viewport`
    FocusAt { x: f64, y: f64, viewport: Viewport },
    CycleFlash,
    Flip,
    /// Preview hidden
    Suspend,
    /// Preview shown again
    Resume,
}

/// What the session reports back to the presentation layer
#[derive(Debug, Clone)]
pub enum Notification {
    StateChanged { state: SessionState, count: usize },
    /// A captured image waits for confirm or reject
    PreviewReady(CapturedImage),
    PhotoAdded { count: usize },
    /// Cap reached; offer the user to hand off
    CapReached { count: usize },
    ZoomChanged(ZoomFactor),
    FocusChanged(FocusPoint),
    FlashChanged(FlashMode),
    CameraFlipped(CameraPosition),
    ImportStarted { budget: usize },
    ImportFinished { count: usize },
    /// Non-fatal failure of one operation; the session stays usable
    Error(CaptureError),
}

/// Terminal event of a session; exactly one per session
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// Hand-off of the collected images in capture order
    Completed(Vec<CapturedImage>),
    Cancelled,
}

impl SessionOutcome {
    pub fn images(&self) -> &[CapturedImage] {
        match self {
            SessionOutcome::Completed(images) => images,
            SessionOutcome::Cancelled => &[],
        }
    }
}

/// Result of asking for a still capture
#[derive(Debug)]
pub enum CaptureRequest {
    /// The device was asked for a still; resolve it and feed the result back
    Started(PendingCapture),
    /// Set already full; no device call was made
    CapReached,
}

/// Result of asking for a library import
pub enum ImportRequest {
    /// Feed every item of the stream back, then finish the import
    Started {
        budget: usize,
        items: BoxStream<'static, ImportedItem>,
    },
    /// Set already full; the picker was not opened
    CapReached,
}

impl std::fmt::Debug for ImportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportRequest::Started { budget, .. } => {
                f.debug_struct("Started").field("budget", budget).finish()
            }
            ImportRequest::CapReached => f.write_str("CapReached"),
        }
    }
}

/// Input to the session owner: user events plus completions of async work
#[derive(Debug)]
pub enum Message {
    Event(SessionEvent),
    CaptureCompleted(CaptureResult<CapturedImage>),
    ImportItem(ImportedItem),
    ImportFinished,
}

impl From<SessionEvent> for Message {
    fn from(event: SessionEvent) -> Self {
        Message::Event(event)
    }
}
