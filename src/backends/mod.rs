// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera and photo library access
//!
//! The session core never talks to hardware directly. It consumes two
//! capabilities, each behind a trait:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        App Layer (CaptureSessionManager)     │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │     Camera       │  │     Library     │  │
//! │  │ (CameraPlatform) │  │ (LibraryPicker) │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Virtual Camera  │  │  Folder Picker  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: platform trait, device controller and capture session
//! - [`library`]: picker trait and the bounded import adapter
//! - [`virtual_camera`]: in-process camera platform for the CLI and tests

pub mod camera;
pub mod library;
pub mod virtual_camera;
