// SPDX-License-Identifier: MPL-2.0

//! Photo Capture - multi-shot camera capture sessions
//!
//! This library provides the core of a camera capture flow: live camera
//! control, per-shot confirmation, library import and hand-off of the
//! collected images, all under one cap on the number of images.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session state machine, event dispatch and the owner task
//! - [`backends`]: Camera platform and photo library abstractions
//! - [`pipelines`]: Still capture completion and image processing
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving handed-off images and listing library files
//!
//! # Example
//!
//! ```no_run
//! use photo_capture::app::{SessionEvent, SessionOutcome, SessionRuntime};
//! use photo_capture::backends::library::MemoryPicker;
//! use photo_capture::backends::virtual_camera::VirtualCamera;
//! use photo_capture::config::Config;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), photo_capture::errors::CaptureError> {
//! let handle = SessionRuntime::start(
//!     Arc::new(VirtualCamera::new()),
//!     Arc::new(MemoryPicker::default()),
//!     Config::default(),
//!     Some(3),
//! )?;
//! handle.send(SessionEvent::Capture).await?;
//! if let SessionOutcome::Completed(images) = handle.outcome().await? {
//!     println!("{} image(s)", images.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{CaptureSessionManager, SessionEvent, SessionOutcome, SessionState};
pub use config::Config;
pub use errors::{AppError, CaptureError, CaptureResult};
