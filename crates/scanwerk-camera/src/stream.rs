// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stream manager — owns the single exclusive camera handle.
//
// Concurrent open handles to the same hardware cause hangs, so the previous
// stream is always released before a new one is requested. A forced restart
// tears down and reopens with a fresh instance token for feeds that appear
// stuck.

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{DeviceInfo, Resolution};
use tracing::{debug, info, instrument, warn};

use crate::backend::{CaptureBackend, Frame, FrameStream};

/// Pixel count at which stream negotiation is known to stall on slow devices.
const TIMEOUT_PRONE_PIXELS: u64 = 16_000_000;

/// The one open hardware handle plus the parameters it was opened with.
struct ActiveStream {
    stream: Box<dyn FrameStream>,
    device_id: String,
    resolution: Resolution,
    /// Instance token, bumped on every open so stale callbacks can be ignored.
    token: u64,
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.stream.release();
    }
}

/// Owns the camera device handle and its lifecycle.
///
/// While no frame source is ready (`is_ready() == false`), callers must not
/// attempt capture; `grab_frame` returns `StreamNotReady` in that state.
pub struct StreamManager {
    backend: Box<dyn CaptureBackend>,
    active: Option<ActiveStream>,
    generation: u64,
}

impl StreamManager {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            active: None,
            generation: 0,
        }
    }

    /// List the camera devices currently attached.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        self.backend.enumerate_devices()
    }

    /// Whether a frame source is ready for capture.
    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    /// Device id of the open stream, if any.
    pub fn current_device(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.device_id.as_str())
    }

    /// Instance token of the open stream, if any.
    pub fn current_token(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.token)
    }

    /// Open a stream on `device_id` at `resolution`.
    ///
    /// The previous device handle is fully released first — requesting a new
    /// handle while the old one is open can hang or abort the negotiation.
    #[instrument(skip(self), fields(device_id, %resolution))]
    pub fn open(&mut self, device_id: &str, resolution: Resolution) -> Result<()> {
        // Release before request. Dropping the ActiveStream releases the
        // hardware handle.
        if let Some(previous) = self.active.take() {
            debug!(previous_device = %previous.device_id, "releasing previous stream");
            drop(previous);
        }

        if resolution.pixel_count() >= TIMEOUT_PRONE_PIXELS {
            warn!(
                %resolution,
                "resolutions of 16MP and above are prone to hardware timeouts"
            );
        }

        let stream = self.backend.open_stream(device_id, resolution)?;
        self.generation += 1;
        self.active = Some(ActiveStream {
            stream,
            device_id: device_id.to_string(),
            resolution,
            token: self.generation,
        });

        info!(token = self.generation, "camera stream opened");
        Ok(())
    }

    /// Release the current stream, if any. Idempotent.
    pub fn close(&mut self) {
        if self.active.take().is_some() {
            info!("camera stream closed");
        }
    }

    /// Tear down and recreate the stream with a fresh instance token.
    ///
    /// Used when the feed appears stuck. Fails with `StreamNotReady` when
    /// there is nothing to restart.
    #[instrument(skip(self))]
    pub fn force_restart(&mut self) -> Result<()> {
        let (device_id, resolution) = match &self.active {
            Some(active) => (active.device_id.clone(), active.resolution),
            None => return Err(ScanwerkError::StreamNotReady),
        };
        info!(%device_id, "forcing camera stream restart");
        self.open(&device_id, resolution)
    }

    /// Grab one frame from the open stream.
    pub fn grab_frame(&mut self) -> Result<Frame> {
        match &mut self.active {
            Some(active) => active.stream.grab_frame(),
            None => Err(ScanwerkError::StreamNotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lifecycle events recorded by the test backend.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Open(String),
        Release(String),
    }

    type EventLog = Rc<RefCell<Vec<Event>>>;

    struct TestStream {
        device_id: String,
        resolution: Resolution,
        log: EventLog,
        released: bool,
    }

    impl FrameStream for TestStream {
        fn grab_frame(&mut self) -> Result<Frame> {
            let len = self.resolution.width as usize * self.resolution.height as usize * 3;
            Ok(Frame {
                width: self.resolution.width,
                height: self.resolution.height,
                pixels: vec![128u8; len],
            })
        }

        fn release(&mut self) {
            if !self.released {
                self.released = true;
                self.log
                    .borrow_mut()
                    .push(Event::Release(self.device_id.clone()));
            }
        }
    }

    impl Drop for TestStream {
        fn drop(&mut self) {
            self.release();
        }
    }

    struct TestBackend {
        log: EventLog,
        /// Largest resolution the fake hardware accepts.
        max: Resolution,
    }

    impl CaptureBackend for TestBackend {
        fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
            Ok(vec![DeviceInfo {
                device_id: "cam0".into(),
                label: "Test camera".into(),
                max_resolution: Some(self.max),
            }])
        }

        fn open_stream(
            &self,
            device_id: &str,
            resolution: Resolution,
        ) -> Result<Box<dyn FrameStream>> {
            if resolution.width > self.max.width || resolution.height > self.max.height {
                return Err(ScanwerkError::Overconstrained {
                    width: resolution.width,
                    height: resolution.height,
                });
            }
            self.log
                .borrow_mut()
                .push(Event::Open(device_id.to_string()));
            Ok(Box::new(TestStream {
                device_id: device_id.to_string(),
                resolution,
                log: self.log.clone(),
                released: false,
            }))
        }
    }

    fn manager_with_log() -> (StreamManager, EventLog) {
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        let backend = TestBackend {
            log: log.clone(),
            max: Resolution::new(4000, 3000),
        };
        (StreamManager::new(Box::new(backend)), log)
    }

    #[test]
    fn grab_without_open_stream_fails() {
        let (mut manager, _log) = manager_with_log();
        assert!(!manager.is_ready());
        assert!(matches!(
            manager.grab_frame(),
            Err(ScanwerkError::StreamNotReady)
        ));
    }

    #[test]
    fn open_then_grab_yields_frame_at_resolution() {
        let (mut manager, _log) = manager_with_log();
        manager.open("cam0", Resolution::new(640, 480)).expect("open");
        assert!(manager.is_ready());

        let frame = manager.grab_frame().expect("grab");
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.pixels.len(), 640 * 480 * 3);
    }

    /// Switching devices must release the old handle before the new open.
    #[test]
    fn reopen_releases_previous_stream_first() {
        let (mut manager, log) = manager_with_log();
        manager.open("cam0", Resolution::new(640, 480)).expect("open cam0");
        manager.open("cam1", Resolution::new(640, 480)).expect("open cam1");

        let events = log.borrow();
        assert_eq!(
            *events,
            vec![
                Event::Open("cam0".into()),
                Event::Release("cam0".into()),
                Event::Open("cam1".into()),
            ]
        );
    }

    #[test]
    fn force_restart_issues_fresh_token() {
        let (mut manager, log) = manager_with_log();
        manager.open("cam0", Resolution::new(640, 480)).expect("open");
        let first = manager.current_token().expect("token");

        manager.force_restart().expect("restart");
        let second = manager.current_token().expect("token");
        assert_ne!(first, second);

        // The restart released the stuck handle before reopening.
        let events = log.borrow();
        assert_eq!(
            *events,
            vec![
                Event::Open("cam0".into()),
                Event::Release("cam0".into()),
                Event::Open("cam0".into()),
            ]
        );
    }

    #[test]
    fn force_restart_without_stream_fails() {
        let (mut manager, _log) = manager_with_log();
        assert!(matches!(
            manager.force_restart(),
            Err(ScanwerkError::StreamNotReady)
        ));
    }

    /// An unsupported resolution surfaces the typed error and leaves the
    /// manager without a stream, but the failure releases the prior handle.
    #[test]
    fn overconstrained_resolution_is_typed() {
        let (mut manager, _log) = manager_with_log();
        let result = manager.open("cam0", Resolution::new(8000, 6000));
        assert!(matches!(
            result,
            Err(ScanwerkError::Overconstrained {
                width: 8000,
                height: 6000
            })
        ));
        assert!(!manager.is_ready());
    }

    #[test]
    fn close_is_idempotent() {
        let (mut manager, log) = manager_with_log();
        manager.open("cam0", Resolution::new(640, 480)).expect("open");
        manager.close();
        manager.close();
        assert!(!manager.is_ready());
        assert_eq!(
            log.borrow().iter().filter(|e| matches!(e, Event::Release(_))).count(),
            1
        );
    }
}
