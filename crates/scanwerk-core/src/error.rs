// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

use crate::types::PageId;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Device errors --
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("requested resolution {width}x{height} is not supported by this device")]
    Overconstrained { width: u32, height: u32 },

    #[error("camera timed out while negotiating the stream: {0}")]
    HardwareTimeout(String),

    #[error("no active camera stream")]
    StreamNotReady,

    #[error("camera device error: {0}")]
    Device(String),

    #[error("no capture backend available on this platform")]
    BackendUnavailable,

    // -- Capture / cleanup --
    #[error("cleanup service request failed: {0}")]
    Network(String),

    // -- Document errors --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("page queue is empty")]
    EmptyQueue,

    #[error("page {0} not found in the queue")]
    PageNotFound(PageId),

    #[error("operation not valid in the {0} view")]
    InvalidTransition(&'static str),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
