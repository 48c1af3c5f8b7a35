// SPDX-License-Identifier: GPL-3.0-only

//! Per-shot confirmation slot

use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::CapturedImage;

/// Holds at most one captured image until the user confirms or rejects it
#[derive(Debug, Default)]
pub struct PreviewGate {
    slot: Option<CapturedImage>,
}

impl PreviewGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an image up for confirmation
    pub fn offer(&mut self, image: CapturedImage) -> CaptureResult<()> {
        if self.slot.is_some() {
            return Err(CaptureError::SlotOccupied);
        }
        self.slot = Some(image);
        Ok(())
    }

    /// Take the pending image out for appending
    pub fn confirm(&mut self) -> CaptureResult<CapturedImage> {
        self.slot.take().ok_or(CaptureError::NoPendingShot)
    }

    /// Discard the pending image
    pub fn reject(&mut self) -> CaptureResult<()> {
        self.slot.take().map(drop).ok_or(CaptureError::NoPendingShot)
    }

    pub fn pending(&self) -> Option<&CapturedImage> {
        self.slot.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Drop whatever is pending (session teardown)
    pub(crate) fn clear(&mut self) {
        self.slot = None;
    }
}
