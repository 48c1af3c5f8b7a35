// SPDX-License-Identifier: GPL-3.0-only

//! Library import handlers
//!
//! Imported images skip the preview gate and are appended as they arrive.
//! Each append stands on its own, so a cancelled or partly failed import
//! keeps whatever it delivered.

use crate::app::CaptureSessionManager;
use crate::app::state::{ImportRequest, Notification, SessionState};
use crate::backends::library::{ImportCancel, ImportedItem};
use crate::errors::{CaptureError, CaptureResult};
use tracing::{debug, info, warn};

impl CaptureSessionManager {
    /// Open the picker with the remaining capacity as its limit
    ///
    /// Feed every item of the returned stream to
    /// [`import_item`](Self::import_item) and call
    /// [`finish_import`](Self::finish_import) when it ends.
    pub fn request_import(&mut self) -> CaptureResult<ImportRequest> {
        self.require_session("import")?;

        if self.state == SessionState::AwaitingConfirm {
            return Err(if self.capture_in_flight {
                CaptureError::CaptureInProgress
            } else {
                CaptureError::SlotOccupied
            });
        }
        if self.photos.is_full() {
            info!(session = %self.id, count = self.count(), "Import requested at cap");
            self.set_state(SessionState::AtCap);
            self.notify(Notification::CapReached { count: self.count() });
            return Ok(ImportRequest::CapReached);
        }

        if self.is_importing() {
            return Err(CaptureError::ImportInProgress);
        }

        let budget = self.remaining();
        let cancel = ImportCancel::new();
        let items = self.importer.import_up_to(budget, cancel.clone());
        self.import = Some(cancel);

        info!(session = %self.id, budget, "Library import started");
        self.notify(Notification::ImportStarted { budget });
        Ok(ImportRequest::Started { budget, items })
    }

    /// Append one resolved picker item
    ///
    /// A failed item is reported as [`CaptureError::ImportItemFailed`] and
    /// the import carries on. Returns the new image count.
    pub fn import_item(&mut self, item: ImportedItem) -> CaptureResult<usize> {
        if self.state == SessionState::Terminated {
            return Err(CaptureError::Terminated);
        }
        let Some(cancel) = self.import.clone() else {
            warn!(session = %self.id, index = item.index, "Import item without an import running");
            return Err(self.invalid("import an item"));
        };

        let image = item.result.map_err(|e| CaptureError::ImportItemFailed {
            index: item.index,
            reason: e.to_string(),
        })?;

        let count = match self.photos.try_push(image) {
            Ok(count) => count,
            Err(e) => {
                warn!(session = %self.id, index = item.index, "Import item over cap dropped");
                cancel.cancel();
                return Err(e);
            }
        };

        debug!(session = %self.id, index = item.index, count, "Library image added");
        self.notify(Notification::PhotoAdded { count });

        if self.photos.is_full() {
            cancel.cancel();
            self.set_state(SessionState::AtCap);
            self.notify(Notification::CapReached { count });
        }
        Ok(count)
    }

    /// The import stream ended (exhausted, cancelled or at budget)
    pub fn finish_import(&mut self) {
        if self.import.take().is_some() {
            info!(session = %self.id, count = self.count(), "Library import finished");
            self.notify(Notification::ImportFinished { count: self.count() });
        }
    }

    /// Stop the running import before its next item
    pub fn cancel_import(&mut self) -> CaptureResult<()> {
        match &self.import {
            Some(cancel) => {
                cancel.cancel();
                debug!(session = %self.id, "Library import cancellation requested");
                Ok(())
            }
            None => Err(self.invalid("cancel an import")),
        }
    }
}
