// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-session: the capture/edit session controller. Owns the camera
// stream, the remote cleanup collaborator, and the page queue, and exposes
// the state machine the UI drives.

pub mod cleanup;
pub mod controller;
pub mod coords;

pub use cleanup::{CleanupService, HttpCleanupClient};
pub use controller::CaptureSession;
pub use coords::map_screen_crop;
