// SPDX-License-Identifier: GPL-3.0-only

//! Flash mode selection
//!
//! The flash button steps through the modes in a fixed cycle; the active
//! mode is pushed to the device and attached to every still capture.

use serde::{Deserialize, Serialize};

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Device decides per shot based on scene brightness
    #[default]
    Auto,
    /// Flash fires on every shot
    On,
    /// Flash never fires
    Off,
}

impl FlashMode {
    /// All modes in cycle order
    pub const ALL: [FlashMode; 3] = [FlashMode::Auto, FlashMode::On, FlashMode::Off];

    /// Cycle to the next mode: Auto -> On -> Off -> Auto
    pub fn next(self) -> Self {
        match self {
            FlashMode::Auto => FlashMode::On,
            FlashMode::On => FlashMode::Off,
            FlashMode::Off => FlashMode::Auto,
        }
    }

    /// Name shown in logs and the CLI
    pub fn display_name(&self) -> &'static str {
        match self {
            FlashMode::Auto => "auto",
            FlashMode::On => "on",
            FlashMode::Off => "off",
        }
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
