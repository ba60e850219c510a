// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote cleanup collaborator — sends a captured frame to an external service
// that returns a cleaned version (deskewed, shadow-removed, etc.). The
// transport and the service contract are intentionally opaque to the rest of
// the session: the controller only sees JPEG bytes in, JPEG bytes out.

use std::time::Duration;

use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, instrument, warn};

/// Request timeout for one cleanup round trip.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

/// A collaborator that turns a raw camera frame into a cleaned page bitmap.
///
/// Implementations must be total: either the cleaned bytes come back, or an
/// error does. A failed cleanup must never leave partial state behind, so the
/// controller can treat any `Err` as "this capture did not happen".
#[allow(async_fn_in_trait)]
pub trait CleanupService {
    /// Clean one JPEG-encoded frame, returning the cleaned JPEG bytes.
    async fn clean(&self, frame_jpeg: &[u8]) -> Result<Vec<u8>>;
}

/// HTTP-backed cleanup client posting frames to a remote endpoint.
pub struct HttpCleanupClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCleanupClient {
    /// Build a client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("scanwerk/0.1.0")
            .timeout(CLEANUP_TIMEOUT)
            .build()
            .map_err(|e| ScanwerkError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CleanupService for HttpCleanupClient {
    #[instrument(skip(self, frame_jpeg), fields(bytes = frame_jpeg.len()))]
    async fn clean(&self, frame_jpeg: &[u8]) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(frame_jpeg.to_vec())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "cleanup request failed to send");
                ScanwerkError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "cleanup service rejected frame");
            return Err(ScanwerkError::Network(format!(
                "cleanup service returned HTTP {}",
                response.status()
            )));
        }

        let cleaned = response
            .bytes()
            .await
            .map_err(|e| ScanwerkError::Network(e.to_string()))?;
        debug!(bytes = cleaned.len(), "cleanup round trip complete");
        Ok(cleaned.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_and_keeps_endpoint() {
        let client = HttpCleanupClient::new("http://localhost:9090/clean").expect("build client");
        assert_eq!(client.endpoint(), "http://localhost:9090/clean");
    }
}
