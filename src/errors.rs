// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture session
//!
//! Three layers:
//! - [`DeviceError`]: what a camera platform reports
//! - [`PickerError`]: what a single library item resolves to on failure
//! - [`CaptureError`]: what session operations report to the caller
//!
//! [`AppError`] wraps everything the command-line driver can hit.

use crate::app::SessionState;
use crate::backends::camera::CameraPosition;
use thiserror::Error;

/// Result type alias for session operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Result type alias for camera platform calls
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors reported by a camera platform implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// No device at the requested position
    #[error("no device at the {0} position")]
    NotFound(CameraPosition),
    /// Device exists but could not be turned into a session input
    #[error("failed to bind device: {0}")]
    BindFailed(String),
    /// Device is held by someone else and cannot be locked for configuration
    #[error("device is locked: {0}")]
    LockFailed(String),
    /// Still capture did not produce an image
    #[error("still capture failed: {0}")]
    CaptureFailed(String),
    /// Device does not support the requested control
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Photo output could not be attached to the session
    #[error("photo output unavailable: {0}")]
    OutputFailed(String),
}

/// Errors a library picker item can resolve to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    /// The picker could not load the item's data
    #[error("could not load item: {0}")]
    LoadFailed(String),
    /// The item's data is not a decodable image
    #[error("not a valid image: {0}")]
    InvalidImage(String),
}

/// Errors reported by capture session operations
///
/// Everything except [`CaptureError::DeviceUnavailable`] at start is
/// non-fatal: the session stays usable after reporting it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    /// No capture device can be bound at the given position
    #[error("no capture device available at the {0} position")]
    DeviceUnavailable(CameraPosition),
    /// The user refused camera access
    #[error("camera access denied")]
    AccessDenied,
    /// The photo output pipeline was never initialized
    #[error("photo output is not available")]
    OutputUnavailable,
    /// Device could not be locked for configuration (transient, caller may retry)
    #[error("device could not be locked for configuration: {0}")]
    ConfigurationLocked(String),
    /// A still capture is already in flight
    #[error("a capture is already in progress")]
    CaptureInProgress,
    /// A library import is already in flight
    #[error("a library import is already in progress")]
    ImportInProgress,
    /// The preview gate already holds a shot
    #[error("a shot is already awaiting confirmation")]
    SlotOccupied,
    /// The preview gate is empty
    #[error("no shot is awaiting confirmation")]
    NoPendingShot,
    /// A single library item failed to resolve; the import continues
    #[error("library item {index} could not be imported: {reason}")]
    ImportItemFailed { index: usize, reason: String },
    /// Still capture finished without a usable image
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    /// The image set is already full
    #[error("image limit of {max_count} reached")]
    CapReached { max_count: usize },
    /// The cap must be a positive number
    #[error("maximum image count must be positive, got {0}")]
    InvalidMaxCount(usize),
    /// Operation does not apply to the current session state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    /// The session already emitted its terminal event
    #[error("session has terminated")]
    Terminated,
    /// Device-level failure not covered by a more specific variant
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl CaptureError {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CaptureError::ConfigurationLocked(_)
                | CaptureError::CaptureInProgress
                | CaptureError::ImportInProgress
        )
    }
}

/// Top-level error for the command-line driver
#[derive(Debug, Error)]
pub enum AppError {
    /// Session errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
