// SPDX-License-Identifier: MPL-2.0

//! Picker over a fixed list of selections

use super::LibraryPicker;
use crate::errors::PickerError;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out a canned list of selections, in order
///
/// Records the limit of every pick and how many items were actually pulled.
#[derive(Debug, Default)]
pub struct MemoryPicker {
    items: Vec<Result<Vec<u8>, PickerError>>,
    limits: Mutex<Vec<usize>>,
    delivered: Arc<AtomicUsize>,
}

impl MemoryPicker {
    pub fn new(items: Vec<Result<Vec<u8>, PickerError>>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// `max_selectable` of every pick so far
    pub fn requested_limits(&self) -> Vec<usize> {
        self.limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of selections pulled from the picker
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl LibraryPicker for MemoryPicker {
    fn pick(&self, max_selectable: usize) -> BoxStream<'static, Result<Vec<u8>, PickerError>> {
        self.limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(max_selectable);

        let delivered = self.delivered.clone();
        let items: Vec<_> = self.items.iter().take(max_selectable).cloned().collect();
        futures::stream::iter(items)
            .inspect(move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }
}
