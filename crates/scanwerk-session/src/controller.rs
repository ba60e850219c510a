// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture/edit session controller — the state machine tying the camera
// stream, the remote cleanup collaborator, the page queue, and the PDF
// assembler together. A session is either in the camera view (live preview,
// captures allowed) or in the edit view (one page checked out for rework).

use image::DynamicImage;
use scanwerk_camera::{CaptureBackend, StreamManager};
use scanwerk_core::config::ScanSettings;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::types::{CropRect, DeviceInfo, PageId, PaperSize, Resolution};
use scanwerk_document::{
    CapturedPage, DEFAULT_BACKGROUND_THRESHOLD, JPEG_QUALITY, PageQueue, PdfAssembler,
    TransformOptions, auto_crop_rect, encode_jpeg, rotate_expanded, transform,
};
use tracing::{debug, info, instrument, warn};

use crate::cleanup::CleanupService;
use crate::coords::map_screen_crop;

/// A crop drawn on the scaled edit view, kept in screen coordinates until
/// save time so later zoom changes cannot invalidate it.
#[derive(Debug, Clone, Copy)]
struct PendingCrop {
    screen: CropRect,
    view_scale: f32,
}

/// One page checked out for editing.
struct EditContext {
    page_id: PageId,
    /// Pristine copy of the page's original bitmap; every edit preview and
    /// the final save derive from this, never from prior edit output.
    working: DynamicImage,
    crop: Option<PendingCrop>,
}

/// Which view the session is currently in.
enum SessionState {
    Camera,
    Edit(EditContext),
}

impl SessionState {
    fn view_name(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Edit(_) => "edit",
        }
    }
}

/// Drives one scanning session from first capture to exported PDF.
///
/// All mutation goes through `&mut self`, so captures and edits are
/// serialized by construction; a second capture cannot start while an
/// earlier one is still in flight.
pub struct CaptureSession<C: CleanupService> {
    settings: ScanSettings,
    stream: StreamManager,
    queue: PageQueue,
    cleanup: C,
    state: SessionState,
}

impl<C: CleanupService> CaptureSession<C> {
    /// Create a session over the given capture backend and cleanup service.
    pub fn new(backend: Box<dyn CaptureBackend>, cleanup: C) -> Self {
        Self {
            settings: ScanSettings::default(),
            stream: StreamManager::new(backend),
            queue: PageQueue::new(),
            cleanup,
            state: SessionState::Camera,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ScanSettings {
        &mut self.settings
    }

    pub fn queue(&self) -> &PageQueue {
        &self.queue
    }

    /// Whether the session is currently in the edit view.
    pub fn is_editing(&self) -> bool {
        matches!(self.state, SessionState::Edit(_))
    }

    /// The page currently checked out for editing, if any.
    pub fn editing_page(&self) -> Option<PageId> {
        match &self.state {
            SessionState::Edit(ctx) => Some(ctx.page_id),
            SessionState::Camera => None,
        }
    }

    // -- Camera lifecycle ---------------------------------------------------

    /// List the camera devices currently attached.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        self.stream.devices()
    }

    /// Open the camera stream using the configured device, or the first
    /// enumerated device when none is configured.
    #[instrument(skip(self))]
    pub fn open_camera(&mut self) -> Result<()> {
        let device_id = match &self.settings.device_id {
            Some(id) => id.clone(),
            None => {
                let devices = self.stream.devices()?;
                let first = devices
                    .first()
                    .ok_or_else(|| ScanwerkError::Device("no camera devices attached".into()))?;
                first.device_id.clone()
            }
        };
        self.stream
            .open(&device_id, self.settings.resolution)
            .map_err(|e| {
                let human = humanize_error(&e);
                warn!(error = %e, suggestion = %human.suggestion, "failed to open camera");
                e
            })?;
        self.settings.device_id = Some(device_id);
        Ok(())
    }

    /// Switch to a different device, reopening the stream if one is active.
    pub fn set_device(&mut self, device_id: &str) -> Result<()> {
        self.settings.device_id = Some(device_id.to_string());
        if self.stream.is_ready() {
            self.stream.open(device_id, self.settings.resolution)?;
        }
        Ok(())
    }

    /// Change the capture resolution, reopening the stream if one is active.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.settings.resolution = resolution;
        if self.stream.is_ready() {
            let device_id = self
                .stream
                .current_device()
                .map(str::to_string)
                .unwrap_or_default();
            self.stream.open(&device_id, resolution)?;
        }
        Ok(())
    }

    /// Tear down and reopen the stream in place. The recovery path for a
    /// feed that has stalled mid-session.
    pub fn force_restart(&mut self) -> Result<()> {
        self.stream.force_restart()
    }

    /// Close the camera stream. Idempotent.
    pub fn close_camera(&mut self) {
        self.stream.close();
    }

    // -- Capture ------------------------------------------------------------

    /// Capture one page: grab a frame, pre-rotate it, send it through the
    /// cleanup service, run the capture transform, and append the result to
    /// the queue.
    ///
    /// Any failure along the way leaves the queue exactly as it was; a page
    /// only appears once the whole chain has succeeded.
    #[instrument(skip(self))]
    pub async fn capture(&mut self) -> Result<PageId> {
        if !matches!(self.state, SessionState::Camera) {
            return Err(ScanwerkError::InvalidTransition(self.state.view_name()));
        }

        let frame = self.stream.grab_frame().map_err(|e| {
            let human = humanize_error(&e);
            warn!(error = %e, suggestion = %human.suggestion, "frame grab failed");
            e
        })?;
        let mut bitmap = frame.into_image()?;

        let rotation = self.settings.total_rotation();
        if rotation != 0.0 {
            bitmap = rotate_expanded(&bitmap, rotation);
        }

        let jpeg = encode_jpeg(&bitmap, JPEG_QUALITY)?;
        debug!(bytes = jpeg.len(), "sending frame to cleanup service");
        let cleaned = self.cleanup.clean(&jpeg).await?;

        let original = image::load_from_memory(&cleaned)
            .map_err(|e| ScanwerkError::Image(format!("cleaned frame failed to decode: {e}")))?;

        // Rotation is already baked into the original; the capture transform
        // applies only photometrics and the filter.
        let opts = TransformOptions::from_settings(
            &self.settings,
            0.0,
            self.settings.filter_mode,
            None,
        );
        let output = transform(&original, &opts)?;

        let page = CapturedPage::new(original, output, self.settings.filter_mode);
        let id = page.id;
        self.queue.push(page);
        self.settings.set_edit_rotation(0.0);

        info!(page_id = %id, pages = self.queue.len(), "page captured");
        Ok(id)
    }

    // -- Edit view ----------------------------------------------------------

    /// Check a page out for editing, switching to the edit view.
    pub fn select_page(&mut self, id: &PageId) -> Result<()> {
        let page = self
            .queue
            .get(id)
            .ok_or(ScanwerkError::PageNotFound(*id))?;
        let working = page.original().clone();
        self.settings.set_edit_rotation(0.0);
        self.state = SessionState::Edit(EditContext {
            page_id: *id,
            working,
            crop: None,
        });
        debug!(page_id = %id, "entered edit view");
        Ok(())
    }

    /// Stage a crop rectangle drawn on the edit view.
    ///
    /// `view_scale` is the displayed-to-native size ratio of the edit view at
    /// the moment the rectangle was drawn.
    pub fn set_crop(&mut self, screen: CropRect, view_scale: f32) -> Result<()> {
        match &mut self.state {
            SessionState::Edit(ctx) => {
                ctx.crop = Some(PendingCrop { screen, view_scale });
                Ok(())
            }
            SessionState::Camera => Err(ScanwerkError::InvalidTransition("camera")),
        }
    }

    /// Suggest a crop around the detected document bounds of the page being
    /// edited, in post-rotation native pixels.
    ///
    /// Returns `None` when the frame is uniformly dark and no document edge
    /// can be found; the operator crops by hand in that case.
    pub fn suggest_crop(&self) -> Result<Option<CropRect>> {
        match &self.state {
            SessionState::Edit(ctx) => {
                let rotation = self.settings.total_rotation();
                let frame = if rotation != 0.0 {
                    rotate_expanded(&ctx.working, rotation)
                } else {
                    ctx.working.clone()
                };
                Ok(auto_crop_rect(&frame, DEFAULT_BACKGROUND_THRESHOLD))
            }
            SessionState::Camera => Err(ScanwerkError::InvalidTransition("camera")),
        }
    }

    /// Discard any staged crop.
    pub fn clear_crop(&mut self) -> Result<()> {
        match &mut self.state {
            SessionState::Edit(ctx) => {
                ctx.crop = None;
                Ok(())
            }
            SessionState::Camera => Err(ScanwerkError::InvalidTransition("camera")),
        }
    }

    /// Apply the staged edits to the checked-out page and return to the
    /// camera view.
    ///
    /// The transform runs from the page's pristine original, so repeated
    /// edit rounds never accumulate quality loss. On failure the session
    /// stays in the edit view with all staged edits intact.
    #[instrument(skip(self))]
    pub fn save_edit(&mut self) -> Result<PageId> {
        let ctx = match &self.state {
            SessionState::Edit(ctx) => ctx,
            SessionState::Camera => {
                return Err(ScanwerkError::InvalidTransition("camera"));
            }
        };

        let crop = ctx.crop.map(|pending| {
            map_screen_crop(
                pending.screen,
                pending.view_scale,
                self.settings.live_rotation,
                ctx.working.width(),
                ctx.working.height(),
            )
        });

        let opts = TransformOptions::from_settings(
            &self.settings,
            self.settings.total_rotation(),
            self.settings.filter_mode,
            crop,
        );
        let output = transform(&ctx.working, &opts)?;

        let page_id = ctx.page_id;
        let page = self
            .queue
            .get_mut(&page_id)
            .ok_or(ScanwerkError::PageNotFound(page_id))?;
        page.apply_output(output, self.settings.filter_mode);

        self.settings.set_edit_rotation(0.0);
        self.state = SessionState::Camera;
        info!(page_id = %page_id, "edit saved");
        Ok(page_id)
    }

    /// Abandon the edit and return to the camera view. The page keeps its
    /// last saved state. Safe to call from the camera view.
    pub fn cancel_edit(&mut self) {
        if let SessionState::Edit(ctx) = &self.state {
            debug!(page_id = %ctx.page_id, "edit cancelled");
        }
        self.settings.set_edit_rotation(0.0);
        self.state = SessionState::Camera;
    }

    // -- Queue operations ---------------------------------------------------

    /// Remove a page from the queue. If that page is currently being edited
    /// the edit is cancelled first.
    pub fn delete_page(&mut self, id: &PageId) -> Result<CapturedPage> {
        if self.editing_page().as_ref() == Some(id) {
            warn!(page_id = %id, "deleting the page being edited");
            self.cancel_edit();
        }
        self.queue.remove(id)
    }

    /// Split a page into left and right halves in place. If that page is
    /// currently being edited the edit is cancelled first.
    pub fn split_page(&mut self, id: &PageId) -> Result<(PageId, PageId)> {
        if self.editing_page().as_ref() == Some(id) {
            self.cancel_edit();
        }
        self.queue.split(id)
    }

    // -- Export -------------------------------------------------------------

    /// Assemble the current queue into a single PDF at the given paper size.
    pub fn assemble(&self, paper_size: PaperSize) -> Result<Vec<u8>> {
        PdfAssembler::new(paper_size).assemble(self.queue.pages())
    }
}
