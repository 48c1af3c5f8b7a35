// SPDX-License-Identifier: MPL-2.0

//! Picker backed by a directory of image files
//!
//! Selects the JPEG and PNG files of a directory in file-name order. Files
//! are read one by one as the import pulls them.

use super::LibraryPicker;
use crate::errors::PickerError;
use crate::storage;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FolderPicker {
    dir: PathBuf,
}

impl FolderPicker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LibraryPicker for FolderPicker {
    fn pick(&self, max_selectable: usize) -> BoxStream<'static, Result<Vec<u8>, PickerError>> {
        let dir = self.dir.clone();

        async_stream::stream! {
            match storage::list_image_files(dir).await {
                Ok(files) => {
                    for path in files.into_iter().take(max_selectable) {
                        debug!(path = %path.display(), "Reading library image");
                        yield tokio::fs::read(&path).await.map_err(|e| {
                            PickerError::LoadFailed(format!("{}: {}", path.display(), e))
                        });
                    }
                }
                Err(e) => yield Err(PickerError::LoadFailed(e.to_string())),
            }
        }
        .boxed()
    }
}
