// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured images
//!
//! Device and picker results arrive as encoded bytes. The photo pipeline
//! decodes them off the owner thread and applies the orientation policy
//! before anything reaches the session:
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌───────────────┐
//! │ captureStill │ ──▶ │  Photo Pipeline   │ ──▶ │ CapturedImage │
//! │  (encoded)   │     │  - Decode         │     │  (RGBA)       │
//! │              │     │  - Front mirror   │     │               │
//! └──────────────┘     └───────────────────┘     └───────────────┘
//! ```

pub mod photo;
