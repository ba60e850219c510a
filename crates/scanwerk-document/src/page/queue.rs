// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered mutable page queue.
//
// Insertion order is capture/split order is PDF page order — there is no
// independent sort step anywhere. Pages are created only by a successful
// capture or by a split, and destroyed only by explicit deletion or by being
// replaced during a split.

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::PageId;
use tracing::{debug, info, instrument};

use super::CapturedPage;

/// The ordered collection of captured pages awaiting assembly.
#[derive(Debug, Default)]
pub struct PageQueue {
    pages: Vec<CapturedPage>,
}

impl PageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in capture/split order.
    pub fn pages(&self) -> &[CapturedPage] {
        &self.pages
    }

    pub fn contains(&self, id: &PageId) -> bool {
        self.pages.iter().any(|p| p.id == *id)
    }

    pub fn get(&self, id: &PageId) -> Option<&CapturedPage> {
        self.pages.iter().find(|p| p.id == *id)
    }

    pub fn get_mut(&mut self, id: &PageId) -> Option<&mut CapturedPage> {
        self.pages.iter_mut().find(|p| p.id == *id)
    }

    /// Append a freshly captured page.
    pub fn push(&mut self, page: CapturedPage) {
        debug!(page_id = %page.id, position = self.pages.len(), "page appended");
        self.pages.push(page);
    }

    /// Remove a page from the queue.
    #[instrument(skip(self), fields(page_id = %id))]
    pub fn remove(&mut self, id: &PageId) -> Result<CapturedPage> {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == *id)
            .ok_or(ScanwerkError::PageNotFound(*id))?;
        let page = self.pages.remove(index);
        info!(remaining = self.pages.len(), "page deleted");
        Ok(page)
    }

    /// Replace one page with two by vertically bisecting its processed image
    /// at the midpoint width: the left half takes the parent's position, the
    /// right half follows it. Both halves inherit the parent's filter mode
    /// and capture time. Used for scans of open book spreads.
    #[instrument(skip(self), fields(page_id = %id))]
    pub fn split(&mut self, id: &PageId) -> Result<(PageId, PageId)> {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == *id)
            .ok_or(ScanwerkError::PageNotFound(*id))?;

        let parent = &self.pages[index];
        let processed = parent.processed();
        let (w, h) = (processed.width(), processed.height());
        if w < 2 {
            return Err(ScanwerkError::Image(format!(
                "page is only {w}px wide, nothing to split"
            )));
        }

        let left_w = w / 2;
        let left = processed.crop_imm(0, 0, left_w, h);
        let right = processed.crop_imm(left_w, 0, w - left_w, h);

        let left_page = CapturedPage::from_bitmap(left, parent.filter_mode, parent.captured_at)?;
        let right_page = CapturedPage::from_bitmap(right, parent.filter_mode, parent.captured_at)?;
        let ids = (left_page.id, right_page.id);

        // The parent is destroyed by being replaced in place.
        self.pages.splice(index..=index, [left_page, right_page]);
        info!(left = %ids.0, right = %ids.1, "page split into two");
        Ok(ids)
    }

    /// Exact sum of every page's encoded byte size.
    pub fn total_size_bytes(&self) -> u64 {
        self.pages.iter().map(|p| p.size_bytes).sum()
    }
}
