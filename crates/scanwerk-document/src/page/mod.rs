// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Captured pages and the ordered page queue.

pub mod queue;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use scanwerk_core::error::Result;
use scanwerk_core::types::{FilterMode, PageId};

use crate::image::transform::{JPEG_QUALITY, TransformOutput, encode_jpeg};

/// One scanned page.
///
/// `original` is the unmodified captured bitmap, owned exclusively by this
/// page and never mutated in place. `processed` is the render-ready bitmap
/// after the last applied transform chain; it is always derivable by replaying
/// the baked settings against `original` and is replaced wholesale on every
/// edit, never partially mutated.
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub id: PageId,
    original: DynamicImage,
    processed: DynamicImage,
    /// Dimensions of `processed`.
    pub width: u32,
    pub height: u32,
    /// Encoded byte size of `processed`, for quota/feedback display.
    pub size_bytes: u64,
    /// The last filter baked into `processed`.
    pub filter_mode: FilterMode,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPage {
    /// Create a page from a capture: the cleaned original plus the transform
    /// output that was baked from it.
    pub fn new(original: DynamicImage, output: TransformOutput, filter_mode: FilterMode) -> Self {
        Self {
            id: PageId::new(),
            original,
            width: output.width,
            height: output.height,
            size_bytes: output.size_bytes,
            processed: output.image,
            filter_mode,
            captured_at: Utc::now(),
        }
    }

    /// Create a page directly from a bitmap, used for split halves: the half
    /// becomes both the original and the processed image of the new page.
    pub fn from_bitmap(
        bitmap: DynamicImage,
        filter_mode: FilterMode,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        let encoded = encode_jpeg(&bitmap, JPEG_QUALITY)?;
        Ok(Self {
            id: PageId::new(),
            width: bitmap.width(),
            height: bitmap.height(),
            size_bytes: encoded.len() as u64,
            original: bitmap.clone(),
            processed: bitmap,
            filter_mode,
            captured_at,
        })
    }

    /// The unmodified captured bitmap.
    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    /// The current render-ready bitmap.
    pub fn processed(&self) -> &DynamicImage {
        &self.processed
    }

    /// Replace the derived fields atomically from a fresh transform output.
    /// `original` is untouched.
    pub fn apply_output(&mut self, output: TransformOutput, filter_mode: FilterMode) {
        self.processed = output.image;
        self.width = output.width;
        self.height = output.height;
        self.size_bytes = output.size_bytes;
        self.filter_mode = filter_mode;
    }
}
