//! Error types for the PDF rendering service.
//!
//! This module provides [`RenderError`], a unified error type for all
//! rendering operations, a convenient [`Result`] type alias, and the
//! failure-classification helpers that decide whether an engine error means
//! "this request failed" or "the shared browser is gone".
//!
//! # Classification
//!
//! The headless engine surfaces most failures as plain strings, so the only
//! reliable way to recognise a dead browser session is to match the message
//! against a set of known fatal signatures. That set is configuration
//! ([`crate::config::RenderConfig::fatal_error_signatures`]), not hard-coded
//! logic; [`classify_render_failure`] applies it after a render fails.
//!
//! # Example
//!
//! ```rust
//! use reportpdf_service::{RenderError, Result};
//!
//! fn render() -> Result<Vec<u8>> {
//!     Err(RenderError::Capture("page went away".to_string()))
//! }
//!
//! match render() {
//!     Ok(pdf) => println!("rendered {} bytes", pdf.len()),
//!     Err(e) => eprintln!("render failed ({}): {}", e.status_code(), e),
//! }
//! ```

/// Errors that can occur while rendering a PDF.
///
/// Each variant corresponds to one stage of a render request and maps to an
/// HTTP status via [`status_code()`](Self::status_code).
///
/// | Variant | Meaning | Browser handle |
/// |---------|---------|----------------|
/// | [`Validation`](Self::Validation) | Bad request input, rejected before any browser work | untouched |
/// | [`Launch`](Self::Launch) | Chrome could not start | none existed |
/// | [`SessionLost`](Self::SessionLost) | Browser process/session died mid-render | invalidated |
/// | [`ContentTimeout`](Self::ContentTimeout) | Content, navigation or image wait exceeded its bound | kept |
/// | [`Capture`](Self::Capture) | The PDF capture step itself failed | kept |
/// | [`Timeout`](Self::Timeout) | End-to-end request deadline expired | kept |
/// | [`ShuttingDown`](Self::ShuttingDown) | Service is terminating | being closed |
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// A required input field was missing or empty.
    ///
    /// Rejected before any browser resource is touched. Always a
    /// client-facing `400`; the message is surfaced verbatim as the
    /// `error` field of the JSON body.
    #[error("{0}")]
    Validation(String),

    /// The headless browser process could not be started.
    ///
    /// Fatal to the triggering acquisition only. No handle is corrupted
    /// because none existed; the next request simply retries the launch.
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// The browser process died or its session closed mid-operation.
    ///
    /// Produced by [`classify_render_failure`] when an engine error matches
    /// one of the configured fatal signatures, or directly when a
    /// connectivity probe fails. The supervisor's cached handle must be
    /// invalidated so the next acquisition relaunches.
    #[error("Browser session lost: {0}")]
    SessionLost(String),

    /// Content load, navigation or image wait exceeded its time bound.
    ///
    /// The current request fails; the shared browser is assumed healthy
    /// and remains pooled.
    #[error("Content did not finish loading: {0}")]
    ContentTimeout(String),

    /// The PDF capture step threw.
    ///
    /// Treated like [`ContentTimeout`](Self::ContentTimeout) unless the
    /// message also matches a fatal signature, in which case
    /// [`classify_render_failure`] upgrades it to
    /// [`SessionLost`](Self::SessionLost).
    #[error("PDF capture failed: {0}")]
    Capture(String),

    /// The end-to-end request deadline expired.
    ///
    /// The in-flight render task keeps running to its page-close step so no
    /// page handle leaks; only the waiting caller gives up.
    #[error("Render did not complete within {0} seconds")]
    Timeout(u64),

    /// The service received a termination signal.
    ///
    /// All new acquisitions are rejected once shutdown begins.
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl RenderError {
    /// HTTP status code this error should be reported with.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reportpdf_service::RenderError;
    ///
    /// assert_eq!(RenderError::Validation("URL is required".into()).status_code(), 400);
    /// assert_eq!(RenderError::ShuttingDown.status_code(), 503);
    /// assert_eq!(RenderError::Capture("boom".into()).status_code(), 500);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            RenderError::Validation(_) => 400,
            RenderError::ShuttingDown => 503,
            RenderError::Launch(_)
            | RenderError::SessionLost(_)
            | RenderError::ContentTimeout(_)
            | RenderError::Capture(_)
            | RenderError::Timeout(_) => 500,
        }
    }

    /// Whether this failure means the pooled browser handle is poisoned.
    ///
    /// Only [`SessionLost`](Self::SessionLost) invalidates the supervisor's
    /// cached handle; every other failure leaves it in place.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, RenderError::SessionLost(_))
    }
}

/// Check whether an engine error message matches a renderer-fatal signature.
///
/// Plain substring matching, because the engine reports transport death as
/// free-form text. An empty signature list disables reclassification.
pub fn matches_fatal_signature(message: &str, signatures: &[String]) -> bool {
    signatures.iter().any(|s| message.contains(s.as_str()))
}

/// Reclassify a render failure against the configured fatal signatures.
///
/// A [`ContentTimeout`](RenderError::ContentTimeout) or
/// [`Capture`](RenderError::Capture) whose message matches a fatal signature
/// becomes [`SessionLost`](RenderError::SessionLost); everything else passes
/// through unchanged. Callers invalidate the supervisor handle when the
/// result [`is_session_fatal`](RenderError::is_session_fatal).
///
/// # Example
///
/// ```rust
/// use reportpdf_service::error::classify_render_failure;
/// use reportpdf_service::RenderError;
///
/// let signatures = vec!["Target closed".to_string()];
/// let err = RenderError::Capture("Target closed while printing".to_string());
/// let classified = classify_render_failure(err, &signatures);
/// assert!(classified.is_session_fatal());
/// ```
pub fn classify_render_failure(error: RenderError, signatures: &[String]) -> RenderError {
    let message = match &error {
        RenderError::ContentTimeout(m) | RenderError::Capture(m) => m,
        _ => return error,
    };

    if matches_fatal_signature(message, signatures) {
        RenderError::SessionLost(message.clone())
    } else {
        error
    }
}

/// Result type alias using [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn default_signatures() -> Vec<String> {
        vec![
            "Target closed".to_string(),
            "Session closed".to_string(),
            "connection is closed".to_string(),
        ]
    }

    /// Verifies the HTTP status mapping for every variant.
    #[test]
    fn test_status_codes() {
        assert_eq!(RenderError::Validation("x".into()).status_code(), 400);
        assert_eq!(RenderError::Launch("x".into()).status_code(), 500);
        assert_eq!(RenderError::SessionLost("x".into()).status_code(), 500);
        assert_eq!(RenderError::ContentTimeout("x".into()).status_code(), 500);
        assert_eq!(RenderError::Capture("x".into()).status_code(), 500);
        assert_eq!(RenderError::Timeout(120).status_code(), 500);
        assert_eq!(RenderError::ShuttingDown.status_code(), 503);
    }

    /// Verifies that validation messages surface verbatim.
    #[test]
    fn test_validation_display_is_verbatim() {
        let err = RenderError::Validation("HTML content is required".into());
        assert_eq!(err.to_string(), "HTML content is required");
    }

    /// A capture failure whose message names a closed target is fatal to
    /// the pooled browser.
    #[test]
    fn test_classify_capture_failure_as_session_lost() {
        let err = RenderError::Capture("Target closed during printToPDF".into());
        let classified = classify_render_failure(err, &default_signatures());

        assert!(classified.is_session_fatal());
        match classified {
            RenderError::SessionLost(msg) => assert!(msg.contains("Target closed")),
            other => panic!("expected SessionLost, got {:?}", other),
        }
    }

    /// A content timeout caused by a severed CDP connection is also fatal.
    #[test]
    fn test_classify_timeout_with_dead_connection() {
        let err = RenderError::ContentTimeout(
            "Unable to make method calls because underlying connection is closed".into(),
        );
        let classified = classify_render_failure(err, &default_signatures());
        assert!(classified.is_session_fatal());
    }

    /// An ordinary slow page stays an ordinary error.
    #[test]
    fn test_classify_ordinary_timeout_is_not_fatal() {
        let err = RenderError::ContentTimeout("The event waited for never came".into());
        let classified = classify_render_failure(err, &default_signatures());

        assert!(!classified.is_session_fatal());
        assert!(matches!(classified, RenderError::ContentTimeout(_)));
    }

    /// Launch and validation failures are never reclassified, whatever
    /// their message happens to contain.
    #[test]
    fn test_classify_leaves_other_variants_alone() {
        let err = RenderError::Launch("Target closed".into());
        let classified = classify_render_failure(err, &default_signatures());
        assert!(matches!(classified, RenderError::Launch(_)));

        let err = RenderError::Validation("Session closed".into());
        let classified = classify_render_failure(err, &default_signatures());
        assert!(matches!(classified, RenderError::Validation(_)));
    }

    /// An empty signature list disables reclassification entirely.
    #[test]
    fn test_empty_signature_list_disables_matching() {
        let err = RenderError::Capture("Target closed".into());
        let classified = classify_render_failure(err, &[]);
        assert!(!classified.is_session_fatal());
    }

    /// Verifies that RenderError is Send + Sync for cross-task use.
    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderError>();
    }
}
