// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide scan settings. In-memory only — reset on session end.

use serde::{Deserialize, Serialize};

use crate::types::{FilterMode, Resolution, RightAngle};

/// Mutable settings shared by the capture and edit flows.
///
/// These values are read by the capture/edit controller and passed into the
/// transform engine; they do not belong to any single page until a capture or
/// save bakes them into that page's derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Target camera device, `None` until a device is chosen.
    pub device_id: Option<String>,
    /// Capture resolution requested from the device.
    pub resolution: Resolution,
    /// DPI label attached to captures for display purposes.
    pub dpi_tag: String,
    /// Filter applied when saving an edit.
    pub filter_mode: FilterMode,
    /// Brightness percentage, 50–150 (100 = unchanged).
    pub brightness_pct: u8,
    /// Contrast percentage, 50–150.
    pub contrast_pct: u8,
    /// Binarization threshold, 0–255.
    pub threshold: u8,
    /// Right-angle rotation applied to the live feed.
    pub live_rotation: RightAngle,
    /// Fine rotation in degrees, -45 to 45, reset after each capture or save.
    pub edit_rotation: f32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            device_id: None,
            resolution: Resolution::default(),
            dpi_tag: "300dpi".into(),
            filter_mode: FilterMode::Bw,
            brightness_pct: 100,
            contrast_pct: 100,
            threshold: 128,
            live_rotation: RightAngle::Deg0,
            edit_rotation: 0.0,
        }
    }
}

impl ScanSettings {
    /// Set brightness, clamped to the 50–150 range.
    pub fn set_brightness_pct(&mut self, pct: u8) {
        self.brightness_pct = pct.clamp(50, 150);
    }

    /// Set contrast, clamped to the 50–150 range.
    pub fn set_contrast_pct(&mut self, pct: u8) {
        self.contrast_pct = pct.clamp(50, 150);
    }

    /// Set the fine edit rotation, clamped to -45..=45 degrees.
    pub fn set_edit_rotation(&mut self, degrees: f32) {
        self.edit_rotation = degrees.clamp(-45.0, 45.0);
    }

    /// Combined rotation baked into the next capture or save: the live
    /// right-angle rotation plus the fine edit rotation.
    pub fn total_rotation(&self) -> f32 {
        self.live_rotation.degrees() + self.edit_rotation
    }
}
