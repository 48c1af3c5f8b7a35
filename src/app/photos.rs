// SPDX-License-Identifier: GPL-3.0-only

//! The images collected by a session

use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::CapturedImage;

/// Append-only, capped sequence of images in capture/confirm order
#[derive(Debug, Clone)]
pub struct CapturedImageSet {
    images: Vec<CapturedImage>,
    max_count: usize,
}

impl CapturedImageSet {
    pub fn new(max_count: usize) -> Self {
        Self {
            images: Vec::new(),
            max_count,
        }
    }

    /// Append one image, refusing to go past the cap
    ///
    /// Returns the new length.
    pub fn try_push(&mut self, image: CapturedImage) -> CaptureResult<usize> {
        if self.is_full() {
            return Err(CaptureError::CapReached {
                max_count: self.max_count,
            });
        }
        self.images.push(image);
        Ok(self.images.len())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.max_count
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn remaining(&self) -> usize {
        self.max_count.saturating_sub(self.images.len())
    }

    pub fn as_slice(&self) -> &[CapturedImage] {
        &self.images
    }

    /// Hand the images out, leaving the set empty
    pub(crate) fn take(&mut self) -> Vec<CapturedImage> {
        std::mem::take(&mut self.images)
    }
}
