// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document bounds detector.
//
// Finds the bounding box of non-background content in a frame: the document
// sits on a dark scanning mat, so any pixel whose luminance average exceeds
// the background threshold is foreground. Detection runs on a downsampled
// copy for speed; the caller-facing helper maps the result back to
// full-resolution coordinates and pads it.

use image::DynamicImage;
use scanwerk_core::types::CropRect;
use tracing::{debug, instrument};

/// Luminance above which a pixel counts as document rather than mat.
pub const DEFAULT_BACKGROUND_THRESHOLD: u8 = 80;

/// Longest edge of the downsampled detection copy.
const DOWNSAMPLE_CAP: u32 = 512;

/// Fixed padding added around the detected bounds, in full-resolution pixels.
const PADDING_PX: u32 = 12;

/// Minimal axis-aligned rectangle enclosing detected foreground pixels.
/// Coordinates are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Scan an RGB8 buffer for the bounding box of foreground content.
///
/// A pixel is foreground when its channel average `(r + g + b) / 3` exceeds
/// `background_threshold`. Returns `None` when no pixel qualifies — pure
/// background has no document edge to find.
pub fn detect(
    width: u32,
    height: u32,
    pixels: &[u8],
    background_threshold: u8,
) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    let row_len = width as usize * 3;

    for y in 0..height {
        let row = &pixels[y as usize * row_len..(y as usize + 1) * row_len];
        for (x, rgb) in row.chunks_exact(3).enumerate() {
            let luma = (rgb[0] as u16 + rgb[1] as u16 + rgb[2] as u16) / 3;
            if luma <= background_threshold as u16 {
                continue;
            }
            let x = x as u32;
            match &mut bounds {
                None => {
                    bounds = Some(BoundingBox {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    });
                }
                Some(b) => {
                    b.min_x = b.min_x.min(x);
                    b.max_x = b.max_x.max(x);
                    // Rows are scanned top to bottom, min_y never moves.
                    b.max_y = y;
                }
            }
        }
    }

    bounds
}

/// Detect the document bounds of a full-resolution frame and return a padded
/// crop rectangle in full-resolution coordinates.
///
/// The frame is downsampled so its longest edge is at most 512px before
/// scanning; detected bounds are mapped back by dividing by the downsample
/// scale, padded by a fixed margin, and clamped to the image.
#[instrument(skip(image), fields(w = image.width(), h = image.height()))]
pub fn auto_crop_rect(image: &DynamicImage, background_threshold: u8) -> Option<CropRect> {
    let (full_w, full_h) = (image.width(), image.height());
    if full_w == 0 || full_h == 0 {
        return None;
    }

    let longest = full_w.max(full_h);
    let (rgb, scale) = if longest <= DOWNSAMPLE_CAP {
        (image.to_rgb8(), 1.0f32)
    } else {
        let down = image.thumbnail(DOWNSAMPLE_CAP, DOWNSAMPLE_CAP);
        let scale = down.width().max(down.height()) as f32 / longest as f32;
        (down.to_rgb8(), scale)
    };

    let bounds = detect(rgb.width(), rgb.height(), rgb.as_raw(), background_threshold)?;
    debug!(?bounds, scale, "document bounds detected");

    // Map back to full resolution, then pad and clamp.
    let min_x = (bounds.min_x as f32 / scale).floor() as u32;
    let min_y = (bounds.min_y as f32 / scale).floor() as u32;
    let max_x = (((bounds.max_x + 1) as f32 / scale).ceil() as u32).min(full_w);
    let max_y = (((bounds.max_y + 1) as f32 / scale).ceil() as u32).min(full_h);

    let x0 = min_x.saturating_sub(PADDING_PX);
    let y0 = min_y.saturating_sub(PADDING_PX);
    let x1 = (max_x + PADDING_PX).min(full_w);
    let y1 = (max_y + PADDING_PX).min(full_h);

    Some(CropRect::new(x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame_with_patch(
        width: u32,
        height: u32,
        patch: Option<(u32, u32, u32, u32)>,
    ) -> DynamicImage {
        // Dark mat at luminance 30.
        let mut img = RgbImage::from_pixel(width, height, Rgb([30, 30, 30]));
        if let Some((px, py, pw, ph)) = patch {
            for y in py..py + ph {
                for x in px..px + pw {
                    img.put_pixel(x, y, Rgb([230, 230, 230]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    /// A uniformly dark frame has no document edge to find.
    #[test]
    fn uniform_dark_frame_detects_nothing() {
        let img = frame_with_patch(64, 64, None).to_rgb8();
        assert!(detect(64, 64, img.as_raw(), DEFAULT_BACKGROUND_THRESHOLD).is_none());
    }

    #[test]
    fn bright_patch_is_bounded_exactly() {
        let img = frame_with_patch(64, 64, Some((10, 20, 8, 4))).to_rgb8();
        let bounds = detect(64, 64, img.as_raw(), DEFAULT_BACKGROUND_THRESHOLD).expect("bounds");
        assert_eq!(bounds.min_x, 10);
        assert_eq!(bounds.min_y, 20);
        assert_eq!(bounds.max_x, 17);
        assert_eq!(bounds.max_y, 23);
        assert_eq!(bounds.width(), 8);
        assert_eq!(bounds.height(), 4);
    }

    #[test]
    fn single_bright_pixel_is_found() {
        let mut img = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        img.put_pixel(31, 31, Rgb([255, 255, 255]));
        let bounds = detect(32, 32, img.as_raw(), DEFAULT_BACKGROUND_THRESHOLD).expect("bounds");
        assert_eq!((bounds.min_x, bounds.min_y), (31, 31));
        assert_eq!((bounds.max_x, bounds.max_y), (31, 31));
    }

    #[test]
    fn auto_crop_on_dark_frame_is_none() {
        let img = frame_with_patch(200, 200, None);
        assert!(auto_crop_rect(&img, DEFAULT_BACKGROUND_THRESHOLD).is_none());
    }

    /// Small frames skip downsampling; the crop covers the patch plus padding.
    #[test]
    fn auto_crop_pads_and_covers_patch() {
        let img = frame_with_patch(400, 300, Some((100, 80, 120, 60)));
        let rect = auto_crop_rect(&img, DEFAULT_BACKGROUND_THRESHOLD).expect("rect");
        assert!(rect.x <= 100 && rect.x >= 100 - PADDING_PX);
        assert!(rect.y <= 80 && rect.y >= 80 - PADDING_PX);
        assert!(rect.x + rect.width >= 220);
        assert!(rect.y + rect.height >= 140);
        assert!(rect.x + rect.width <= 400);
        assert!(rect.y + rect.height <= 300);
    }

    /// Large frames are detected on a downsampled copy and mapped back.
    #[test]
    fn auto_crop_maps_downsampled_bounds_back() {
        let img = frame_with_patch(2048, 1536, Some((512, 384, 1024, 768)));
        let rect = auto_crop_rect(&img, DEFAULT_BACKGROUND_THRESHOLD).expect("rect");

        // Downsampling is 4:1 here, so allow one downsampled pixel (4px) of
        // slack on each edge in addition to the fixed padding.
        let slack = PADDING_PX + 4;
        assert!(rect.x >= 512 - slack && rect.x <= 512);
        assert!(rect.y >= 384 - slack && rect.y <= 384);
        assert!(rect.x + rect.width >= 1536 && rect.x + rect.width <= 1536 + slack);
        assert!(rect.y + rect.height >= 1152 && rect.y + rect.height <= 1152 + slack);
    }

    /// A fully bright frame clamps the padded crop to the image bounds.
    #[test]
    fn auto_crop_clamps_to_image() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([240, 240, 240]));
        // One dark pixel so the frame is not synthetic-uniform.
        img.put_pixel(50, 50, Rgb([10, 10, 10]));
        let rect =
            auto_crop_rect(&DynamicImage::ImageRgb8(img), DEFAULT_BACKGROUND_THRESHOLD).expect("rect");
        assert_eq!(rect, CropRect::new(0, 0, 100, 100));
    }
}
