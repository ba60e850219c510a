// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages for the scanning workstation.
//
// Every technical error is mapped to plain language with a concrete remedy.
// Nothing in this subsystem is fatal; all failures are scoped to the current
// operation and retries are always operator-initiated.

use crate::error::ScanwerkError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, busy device — trying again may succeed.
    Transient,
    /// Operator must change something (settings, permissions, pages).
    ActionRequired,
    /// Cannot be fixed by retrying or operator action.
    Permanent,
}

/// A plain-language error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same action is worthwhile.
    pub retriable: bool,
    /// Severity level (drives icon/colour in the UI).
    pub severity: Severity,
}

/// Convert a `ScanwerkError` into operator-facing language.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        // -- Device errors --
        ScanwerkError::PermissionDenied => HumanError {
            message: "The app isn't allowed to use the camera.".into(),
            suggestion: "Grant camera permission in your system settings, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::Overconstrained { width, height } => HumanError {
            message: "The camera can't capture at that resolution.".into(),
            suggestion: format!(
                "{width}x{height} isn't supported by this camera. Pick a lower resolution in the scan settings."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::HardwareTimeout(_) => HumanError {
            message: "The camera is taking too long to respond.".into(),
            suggestion: "The device may be busy negotiating a very high resolution. Try a lower resolution, or restart the camera feed.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::StreamNotReady => HumanError {
            message: "The camera feed isn't ready yet.".into(),
            suggestion: "Wait for the live preview to appear before capturing. If it never appears, restart the camera feed.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Device(detail) => HumanError {
            message: "The camera had a problem.".into(),
            suggestion: format!("Try restarting the camera feed. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::BackendUnavailable => HumanError {
            message: "No camera is available on this device.".into(),
            suggestion: "Scanning needs a camera. Connect one, or use a workstation that has one.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Capture / cleanup --
        ScanwerkError::Network(_) => HumanError {
            message: "The page couldn't be cleaned up.".into(),
            suggestion: "The cleanup service didn't respond. Check the network connection and capture the page again — nothing was added to the document.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Document errors --
        ScanwerkError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The captured frame couldn't be processed. Capture the page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Pdf(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try assembling the document again. If this keeps happening, re-capture the affected pages.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::EmptyQueue => HumanError {
            message: "There are no pages to save.".into(),
            suggestion: "Capture at least one page before creating the document.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::PageNotFound(_) => HumanError {
            message: "That page no longer exists.".into(),
            suggestion: "It may have been deleted or replaced by a split. Refresh the page list.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::InvalidTransition(view) => HumanError {
            message: "That action isn't available right now.".into(),
            suggestion: format!("Finish or cancel the current {view} step first."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage / serialization --
        ScanwerkError::Io(_) => HumanError {
            message: "There was a problem writing the file.".into(),
            suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overconstrained_suggests_lower_resolution() {
        let err = ScanwerkError::Overconstrained {
            width: 4608,
            height: 3456,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("lower resolution"));
        assert!(!human.retriable);
    }

    #[test]
    fn hardware_timeout_is_transient() {
        let err = ScanwerkError::HardwareTimeout("negotiation exceeded 10s".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn cleanup_failure_states_queue_untouched() {
        let err = ScanwerkError::Network("connection refused".into());
        let human = humanize_error(&err);
        assert!(human.retriable);
        assert!(human.suggestion.contains("nothing was added"));
    }

    #[test]
    fn empty_queue_is_action_required() {
        let human = humanize_error(&ScanwerkError::EmptyQueue);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }
}
