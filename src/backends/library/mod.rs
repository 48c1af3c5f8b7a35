// SPDX-License-Identifier: MPL-2.0

//! Photo library import
//!
//! A [`LibraryPicker`] is whatever lets the user choose existing images: a
//! system photo picker, a folder on disk, a canned list in tests. The
//! [`LibraryImportAdapter`] puts a budget and a cancel flag around one pick
//! and decodes each item as it arrives.
//!
//! Items are pulled one at a time. Once the cancel flag is raised no further
//! item is requested from the picker; items already delivered stay delivered.

pub mod folder;
pub mod memory;

pub use folder::FolderPicker;
pub use memory::MemoryPicker;

use crate::errors::PickerError;
use crate::pipelines::photo::{CapturedImage, ImageOrigin, decode_image};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Capability surface of an image picker
pub trait LibraryPicker: Send + Sync {
    /// Let the user select up to `max_selectable` images
    ///
    /// Each element is the encoded bytes of one selection, or the reason it
    /// could not be loaded.
    fn pick(&self, max_selectable: usize) -> BoxStream<'static, Result<Vec<u8>, PickerError>>;
}

/// Cooperative cancellation for an import in progress
#[derive(Debug, Clone, Default)]
pub struct ImportCancel(Arc<AtomicBool>);

impl ImportCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the import to stop before the next item
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One resolved picker selection
#[derive(Debug, Clone)]
pub struct ImportedItem {
    /// Position of the item in the pick, counting failures
    pub index: usize,
    pub result: Result<CapturedImage, PickerError>,
}

/// Bounded, cancellable import from a [`LibraryPicker`]
#[derive(Clone)]
pub struct LibraryImportAdapter {
    picker: Arc<dyn LibraryPicker>,
}

impl LibraryImportAdapter {
    pub fn new(picker: Arc<dyn LibraryPicker>) -> Self {
        Self { picker }
    }

    /// Import at most `n` items
    ///
    /// The returned stream is lazy: nothing is requested from the picker
    /// until it is polled. It yields at most `n` items and ends early when
    /// `cancel` is raised or the picker runs out.
    pub fn import_up_to(&self, n: usize, cancel: ImportCancel) -> BoxStream<'static, ImportedItem> {
        let picker = self.picker.clone();

        async_stream::stream! {
            if n > 0 {
                info!(budget = n, "Starting library import");
                let mut selections = picker.pick(n);
                let mut index = 0;
                while index < n {
                    if cancel.is_cancelled() {
                        info!(delivered = index, "Library import cancelled");
                        break;
                    }
                    let Some(selection) = selections.next().await else {
                        break;
                    };

                    let result = match selection {
                        Ok(bytes) => decode_selection(bytes).await,
                        Err(e) => Err(e),
                    };
                    match &result {
                        Ok(_) => debug!(index, "Library item decoded"),
                        Err(e) => warn!(index, error = %e, "Library item failed"),
                    }

                    yield ImportedItem { index, result };
                    index += 1;
                }
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for LibraryImportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryImportAdapter").finish_non_exhaustive()
    }
}

async fn decode_selection(bytes: Vec<u8>) -> Result<CapturedImage, PickerError> {
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| PickerError::LoadFailed(format!("Decode task error: {}", e)))?
        .map(|pixels| CapturedImage::new(pixels, ImageOrigin::Library))
        .map_err(PickerError::InvalidImage)
}
