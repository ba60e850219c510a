// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — Document processing for the Scanwerk digitizer.
//
// Provides the image transform engine (rotation, photometrics, filters, crop),
// the document bounds detector, the ordered page queue, and the multi-page
// PDF assembler.

pub mod image;
pub mod page;
pub mod pdf;
pub mod scan;

// Re-export the primary types so callers can use `scanwerk_document::PageQueue` etc.
pub use image::transform::{
    JPEG_QUALITY, TransformOptions, TransformOutput, encode_jpeg, rotate_expanded, transform,
};
pub use page::queue::PageQueue;
pub use page::CapturedPage;
pub use pdf::assembler::PdfAssembler;
pub use scan::detect::{BoundingBox, DEFAULT_BACKGROUND_THRESHOLD, auto_crop_rect, detect};
