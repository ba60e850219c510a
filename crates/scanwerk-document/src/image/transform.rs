// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image transform engine — rotation, brightness/contrast, grayscale and
// black-and-white filtering, crop. Pure: the input image is never mutated,
// every call returns a freshly derived bitmap plus its encoded byte size.
//
// Step order is fixed and load-bearing: rotate first, so that crop
// coordinates are expressed in the already-rotated frame.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{CropRect, FilterMode};
use scanwerk_core::ScanSettings;
use tracing::{debug, instrument};

/// JPEG quality used for every processed-page encoding.
pub const JPEG_QUALITY: u8 = 85;

/// One full transform request.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Rotation in degrees, clockwise. Any value; multiples of 90 are lossless.
    pub rotation_deg: f32,
    /// Brightness percentage, 100 = unchanged.
    pub brightness_pct: u8,
    /// Contrast percentage.
    pub contrast_pct: u8,
    /// Channel filter applied after the photometric pass.
    pub filter_mode: FilterMode,
    /// Binarization threshold for `FilterMode::Bw`.
    pub threshold: u8,
    /// Optional crop, in post-rotation pixel coordinates.
    pub crop: Option<CropRect>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            rotation_deg: 0.0,
            brightness_pct: 100,
            contrast_pct: 100,
            filter_mode: FilterMode::Color,
            threshold: 128,
            crop: None,
        }
    }
}

impl TransformOptions {
    /// Bake the current scan settings into a transform request.
    pub fn from_settings(
        settings: &ScanSettings,
        rotation_deg: f32,
        filter_mode: FilterMode,
        crop: Option<CropRect>,
    ) -> Self {
        Self {
            rotation_deg,
            brightness_pct: settings.brightness_pct,
            contrast_pct: settings.contrast_pct,
            filter_mode,
            threshold: settings.threshold,
            crop,
        }
    }
}

/// Result of one transform: the derived bitmap plus its encoded form.
pub struct TransformOutput {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    /// Length of `encoded`, reported in the UI quota display.
    pub size_bytes: u64,
    /// JPEG encoding of `image` at [`JPEG_QUALITY`].
    pub encoded: Vec<u8>,
}

/// Apply the full transform chain: rotate, photometrics, filter, crop, encode.
#[instrument(skip(image), fields(w = image.width(), h = image.height()))]
pub fn transform(image: &DynamicImage, opts: &TransformOptions) -> Result<TransformOutput> {
    let rotated = rotate_expanded(image, opts.rotation_deg);
    let mut canvas = rotated.to_rgba8();

    apply_photometrics(&mut canvas, opts.brightness_pct, opts.contrast_pct);
    apply_filter(&mut canvas, opts.filter_mode, opts.threshold);

    let mut result = DynamicImage::ImageRgba8(canvas);
    if let Some(rect) = opts.crop {
        result = crop_canvas(&result, rect);
    }

    let encoded = encode_jpeg(&result, JPEG_QUALITY)?;
    debug!(
        out_w = result.width(),
        out_h = result.height(),
        size_bytes = encoded.len(),
        "transform complete"
    );

    Ok(TransformOutput {
        width: result.width(),
        height: result.height(),
        size_bytes: encoded.len() as u64,
        image: result,
        encoded,
    })
}

/// Rotate by an arbitrary angle in degrees (clockwise), expanding the canvas
/// to the rotated bounding box and filling the background with white.
///
/// Multiples of 90 use lossless rotations; zero short-circuits entirely so a
/// no-op rotation never resamples.
pub fn rotate_expanded(image: &DynamicImage, degrees: f32) -> DynamicImage {
    let normalised = degrees.rem_euclid(360.0);
    if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
        return image.clone();
    }
    if (normalised - 90.0).abs() < 0.01 {
        return image.rotate90();
    }
    if (normalised - 180.0).abs() < 0.01 {
        return image.rotate180();
    }
    if (normalised - 270.0).abs() < 0.01 {
        return image.rotate270();
    }

    let (w, h) = (image.width() as f32, image.height() as f32);
    let theta = normalised.to_radians();
    let (sin, cos) = theta.sin_cos();

    // Bounding box of the rotated image: newW = |w cos| + |h sin|, and the
    // transpose for the height.
    let new_w = (w * cos.abs() + h * sin.abs()).ceil() as u32;
    let new_h = (w * sin.abs() + h * cos.abs()).ceil() as u32;

    // Rotate about the source centre, then recentre on the expanded canvas.
    let projection = Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-w / 2.0, -h / 2.0);

    let source = image.to_rgba8();
    let white = Rgba([255u8, 255, 255, 255]);
    let mut output = RgbaImage::from_pixel(new_w, new_h, white);
    warp_into(&source, &projection, Interpolation::Bilinear, white, &mut output);

    DynamicImage::ImageRgba8(output)
}

/// Brightness as an additive offset, then contrast about the mid-point.
///
/// Brightness offset is `(pct - 100) * 2.55`; the contrast factor is
/// `259 * (pct + 255) / (255 * (259 - pct))`. Channels clamp to [0, 255],
/// alpha is untouched.
fn apply_photometrics(canvas: &mut RgbaImage, brightness_pct: u8, contrast_pct: u8) {
    let offset = (brightness_pct as f32 - 100.0) * 2.55;
    let c = contrast_pct as f32;
    let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c));

    for pixel in canvas.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            let brightened = *channel as f32 + offset;
            let contrasted = factor * (brightened - 128.0) + 128.0;
            *channel = contrasted.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Grayscale or black-and-white reduction.
///
/// Luminance is always recomputed from the post-photometric RGB channels, not
/// from any cached gray value, so the pipeline stays order-correct even when
/// brightness/contrast shifted the channels unevenly.
fn apply_filter(canvas: &mut RgbaImage, mode: FilterMode, threshold: u8) {
    if mode == FilterMode::Color {
        return;
    }

    for pixel in canvas.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let value = match mode {
            FilterMode::Grayscale => luma.round().clamp(0.0, 255.0) as u8,
            // Hard threshold, no dithering.
            FilterMode::Bw => {
                if luma > threshold as f32 {
                    255
                } else {
                    0
                }
            }
            FilterMode::Color => unreachable!(),
        };
        pixel.0[0] = value;
        pixel.0[1] = value;
        pixel.0[2] = value;
    }
}

/// Extract the crop rectangle into a new canvas. Coordinates are clamped to
/// image bounds; an in-bounds rectangle yields exactly its own dimensions.
fn crop_canvas(image: &DynamicImage, rect: CropRect) -> DynamicImage {
    let img_w = image.width();
    let img_h = image.height();

    let safe_x = rect.x.min(img_w.saturating_sub(1));
    let safe_y = rect.y.min(img_h.saturating_sub(1));
    let safe_w = rect.width.min(img_w - safe_x).max(1);
    let safe_h = rect.height.min(img_h - safe_y).max(1);

    image.crop_imm(safe_x, safe_y, safe_w, safe_h)
}

/// Encode an image as JPEG bytes with the given quality (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanwerkError::Image(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
    }

    #[test]
    fn zero_rotation_is_a_no_op() {
        let img = solid(30, 20, 90);
        let rotated = rotate_expanded(&img, 0.0);
        assert_eq!((rotated.width(), rotated.height()), (30, 20));
        assert_eq!(img.to_rgb8().as_raw(), rotated.to_rgb8().as_raw());
    }

    #[test]
    fn quarter_rotations_swap_dimensions() {
        let img = solid(30, 20, 90);
        for degrees in [90.0, 270.0] {
            let rotated = rotate_expanded(&img, degrees);
            assert_eq!((rotated.width(), rotated.height()), (20, 30));
        }
        let rotated = rotate_expanded(&img, 180.0);
        assert_eq!((rotated.width(), rotated.height()), (30, 20));
    }

    /// Rotating by θ then by 360-θ restores the original dimensions.
    #[test]
    fn rotation_dimension_round_trip() {
        let img = solid(30, 20, 90);
        for degrees in [90.0, 180.0, 270.0] {
            let there = rotate_expanded(&img, degrees);
            let back = rotate_expanded(&there, 360.0 - degrees);
            assert_eq!(
                (back.width(), back.height()),
                (30, 20),
                "round trip failed for {degrees}"
            );
        }
    }

    #[test]
    fn negative_rotation_normalises() {
        let img = solid(30, 20, 90);
        let rotated = rotate_expanded(&img, -270.0);
        // -270 is the same rotation as +90.
        assert_eq!((rotated.width(), rotated.height()), (20, 30));
    }

    #[test]
    fn arbitrary_rotation_expands_canvas() {
        let img = solid(100, 100, 90);
        let rotated = rotate_expanded(&img, 45.0);
        // 100 * (sin 45 + cos 45) ≈ 141.4, ceiled.
        assert_eq!((rotated.width(), rotated.height()), (142, 142));

        // The expanded corners are filled with white, not black or transparent.
        let corner = rotated.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(corner, [255, 255, 255, 255]);
    }

    /// Black-and-white output contains only pure black and pure white.
    #[test]
    fn bw_filter_binarizes_strictly() {
        let mut img = RgbImage::new(16, 16);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let shade = ((x + y * 16) * 255 / 256) as u8;
            *pixel = Rgb([shade, shade.wrapping_add(40), shade / 2]);
        }
        let opts = TransformOptions {
            filter_mode: FilterMode::Bw,
            threshold: 128,
            ..Default::default()
        };
        let output = transform(&DynamicImage::ImageRgb8(img), &opts).expect("transform");
        for pixel in output.image.to_rgb8().pixels() {
            for channel in pixel.0 {
                assert!(channel == 0 || channel == 255, "got channel {channel}");
            }
        }
    }

    #[test]
    fn grayscale_filter_equalizes_channels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 60, 10])));
        let opts = TransformOptions {
            filter_mode: FilterMode::Grayscale,
            brightness_pct: 100,
            contrast_pct: 100,
            ..Default::default()
        };
        let output = transform(&img, &opts).expect("transform");
        for pixel in output.image.to_rgb8().pixels() {
            let [r, g, b] = pixel.0;
            assert_eq!(r, g);
            assert_eq!(g, b);
        }
    }

    /// Cropping with {x, y, w, h} yields an output of exactly w x h.
    #[test]
    fn crop_yields_exact_dimensions() {
        let img = solid(100, 80, 90);
        let opts = TransformOptions {
            crop: Some(CropRect::new(10, 5, 40, 30)),
            ..Default::default()
        };
        let output = transform(&img, &opts).expect("transform");
        assert_eq!((output.width, output.height), (40, 30));
    }

    #[test]
    fn crop_is_clamped_to_image_bounds() {
        let img = solid(50, 50, 90);
        let opts = TransformOptions {
            crop: Some(CropRect::new(40, 40, 100, 100)),
            ..Default::default()
        };
        let output = transform(&img, &opts).expect("transform");
        assert_eq!((output.width, output.height), (10, 10));
    }

    /// Brightness 150 on a mid-gray image brightens every channel, clamping
    /// at 255 for near-white input.
    #[test]
    fn brightness_increase_brightens_mid_gray() {
        let img = solid(8, 8, 128);
        let opts = TransformOptions {
            brightness_pct: 150,
            contrast_pct: 100,
            ..Default::default()
        };
        let output = transform(&img, &opts).expect("transform");
        for pixel in output.image.to_rgb8().pixels() {
            for channel in pixel.0 {
                assert!(channel > 128, "expected brighter than input, got {channel}");
            }
        }

        let near_white = solid(8, 8, 250);
        let output = transform(&near_white, &opts).expect("transform");
        for pixel in output.image.to_rgb8().pixels() {
            for channel in pixel.0 {
                assert_eq!(channel, 255, "near-white input must clamp at 255");
            }
        }
    }

    #[test]
    fn brightness_decrease_darkens_mid_gray() {
        let img = solid(8, 8, 128);
        let opts = TransformOptions {
            brightness_pct: 50,
            contrast_pct: 100,
            ..Default::default()
        };
        let output = transform(&img, &opts).expect("transform");
        for pixel in output.image.to_rgb8().pixels() {
            for channel in pixel.0 {
                assert!(channel < 128, "expected darker than input, got {channel}");
            }
        }
    }

    #[test]
    fn output_reports_encoded_size() {
        let img = solid(64, 64, 128);
        let output = transform(&img, &TransformOptions::default()).expect("transform");
        assert!(!output.encoded.is_empty());
        assert_eq!(output.size_bytes, output.encoded.len() as u64);
    }
}
