// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen-to-native coordinate mapping for the crop overlay. The edit view
// shows the page scaled down to fit the window; crop handles move in screen
// pixels, while the transform engine wants native image pixels.

use scanwerk_core::types::{CropRect, RightAngle};

/// Map a crop rectangle drawn on the scaled edit view back to native image
/// coordinates.
///
/// `view_scale` is the ratio of displayed size to native size (0.5 means the
/// view shows the page at half size). `rotation` is the quarter-turn applied
/// before display; the mapped rectangle is clamped to the rotated image's
/// dimensions, since that is the frame the crop will be cut from.
pub fn map_screen_crop(
    screen: CropRect,
    view_scale: f32,
    rotation: RightAngle,
    native_width: u32,
    native_height: u32,
) -> CropRect {
    debug_assert!(view_scale > 0.0, "view scale must be positive");

    let (bound_w, bound_h) = rotation.apply_to(native_width, native_height);

    let x = (screen.x as f32 / view_scale).round() as u32;
    let y = (screen.y as f32 / view_scale).round() as u32;
    let w = (screen.width as f32 / view_scale).round() as u32;
    let h = (screen.height as f32 / view_scale).round() as u32;

    // Clamp to the rotated frame so a handle dragged past the edge of the
    // view never produces an out-of-bounds crop.
    let x = x.min(bound_w.saturating_sub(1));
    let y = y.min(bound_h.saturating_sub(1));
    let w = w.min(bound_w - x).max(1);
    let h = h.min(bound_h - y).max(1);

    CropRect {
        x,
        y,
        width: w,
        height: h,
    }
}
