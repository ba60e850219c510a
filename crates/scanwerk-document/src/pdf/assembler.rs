// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — emit one multi-page document from the page queue using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{Orientation, PaperSize};
use tracing::{debug, info, instrument};

use crate::page::CapturedPage;

/// DPI at which page bitmaps are placed on the sheet.
const PLACEMENT_DPI: f32 = 150.0;

/// Assembles the final page queue into a single multi-page PDF.
///
/// The sheet size is fixed; orientation is chosen per page from that page's
/// own aspect ratio, so a mixed batch of portrait and landscape captures
/// still renders correctly page by page.
pub struct PdfAssembler {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfAssembler {
    /// Create a new assembler targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Create a new assembler defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Assemble the pages into a single PDF, in the order given.
    ///
    /// Fails with `EmptyQueue` when there is nothing to assemble; no partial
    /// file is produced.
    #[instrument(skip(self, pages), fields(page_count = pages.len()))]
    pub fn assemble(&self, pages: &[CapturedPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(ScanwerkError::EmptyQueue);
        }

        let title = self.title.as_deref().unwrap_or("Scanwerk Document");
        info!(paper = ?self.paper_size, title, "assembling PDF");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            pdf_pages.push(self.layout_page(&mut doc, page));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF saved");
        Ok(output)
    }

    /// Assemble and write directly to a file.
    pub fn write_to_file(
        &self,
        pages: &[CapturedPage],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.assemble(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("wrote PDF to {}", path.as_ref().display());
        Ok(())
    }

    /// Lay one page bitmap out on its own sheet.
    fn layout_page(&self, doc: &mut PdfDocument, page: &CapturedPage) -> PdfPage {
        // Per-page orientation from the page's own aspect ratio.
        let orientation = Orientation::for_dimensions(page.width, page.height);
        let (paper_w_mm, paper_h_mm) = self.paper_size.dimensions_mm();
        let (sheet_w_mm, sheet_h_mm) = match orientation {
            Orientation::Portrait => (paper_w_mm as f32, paper_h_mm as f32),
            Orientation::Landscape => (paper_h_mm as f32, paper_w_mm as f32),
        };

        let rgb = page.processed().to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: page.width as usize,
            height: page.height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let sheet_w_pt = Mm(sheet_w_mm).into_pt().0;
        let sheet_h_pt = Mm(sheet_h_mm).into_pt().0;

        // Image native size at the placement DPI.
        let img_w_pt = page.width as f32 / PLACEMENT_DPI * 72.0;
        let img_h_pt = page.height as f32 / PLACEMENT_DPI * 72.0;

        // Fit to width first; fall back to fit-to-height when the scaled
        // height overflows the sheet. Aspect ratio is always preserved.
        let mut scale = sheet_w_pt / img_w_pt;
        if img_h_pt * scale > sheet_h_pt {
            scale = sheet_h_pt / img_h_pt;
        }

        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;

        // Centre on the sheet: equal margins on both axes.
        let x_offset = (sheet_w_pt - rendered_w_pt) / 2.0;
        let y_offset = (sheet_h_pt - rendered_h_pt) / 2.0;

        debug!(
            page_id = %page.id,
            ?orientation,
            rendered_w_pt,
            rendered_h_pt,
            scale,
            "page placed on sheet"
        );

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        }];

        PdfPage::new(Mm(sheet_w_mm), Mm(sheet_h_mm), ops)
    }
}
