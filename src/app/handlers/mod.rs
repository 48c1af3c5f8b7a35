// SPDX-License-Identifier: GPL-3.0-only

//! Session operation handlers
//!
//! Operations are grouped by concern, each adding methods to
//! `CaptureSessionManager`.

pub mod camera;
pub mod capture;
pub mod import;
