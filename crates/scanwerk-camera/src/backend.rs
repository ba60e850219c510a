// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capture backend traits.
//
// Real implementations wrap a platform capture API; the stub backend stands
// in on headless builds and during tests that never touch hardware.

use image::{DynamicImage, RgbImage};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{DeviceInfo, Resolution};

/// One raw frame pulled off the live feed, tightly packed RGB8.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major RGB.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Decode the raw pixel buffer into a `DynamicImage`.
    ///
    /// Fails if the buffer length does not match the stated dimensions.
    pub fn into_image(self) -> Result<DynamicImage> {
        let expected = self.width as usize * self.height as usize * 3;
        if self.pixels.len() != expected {
            return Err(ScanwerkError::Image(format!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB8",
                self.pixels.len(),
                expected,
                self.width,
                self.height
            )));
        }
        let buffer = RgbImage::from_raw(self.width, self.height, self.pixels).ok_or_else(|| {
            ScanwerkError::Image("frame buffer did not fit its dimensions".into())
        })?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

/// A live frame source backed by one open hardware handle.
///
/// Dropping the stream must release the underlying device; `release` exists
/// so callers can tear down explicitly before requesting a new handle.
pub trait FrameStream {
    /// Grab one frame from the live feed.
    fn grab_frame(&mut self) -> Result<Frame>;

    /// Release the underlying device handle.
    fn release(&mut self);
}

/// Enumerates camera devices and opens capture streams.
pub trait CaptureBackend {
    /// List the devices currently attached.
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a stream on the given device at the requested resolution.
    ///
    /// Implementations surface typed failures: `PermissionDenied` when the
    /// platform refuses camera access, `Overconstrained` when the resolution
    /// is unsupported, `HardwareTimeout` when negotiation stalls (common for
    /// resolutions of 16MP and above).
    fn open_stream(&self, device_id: &str, resolution: Resolution) -> Result<Box<dyn FrameStream>>;
}

/// No-op backend for platforms without camera support.
pub struct StubBackend;

impl CaptureBackend for StubBackend {
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        tracing::warn!("CaptureBackend::enumerate_devices called on stub backend");
        Err(ScanwerkError::BackendUnavailable)
    }

    fn open_stream(
        &self,
        _device_id: &str,
        _resolution: Resolution,
    ) -> Result<Box<dyn FrameStream>> {
        tracing::warn!("CaptureBackend::open_stream called on stub backend");
        Err(ScanwerkError::BackendUnavailable)
    }
}
