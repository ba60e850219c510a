// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-camera — Camera device lifecycle for the Scanwerk digitizer.
//
// Provides the capture backend abstraction (device enumeration, stream
// opening, frame grabbing) and the stream manager that owns the single
// exclusive hardware handle.

pub mod backend;
pub mod stream;

pub use backend::{CaptureBackend, Frame, FrameStream, StubBackend};
pub use stream::StreamManager;
