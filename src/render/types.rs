//! Request and response types for the render endpoints.
//!
//! Wire names are camelCase, matching the JSON contract the report client
//! sends (`htmlContent`, `browserReady`, …).
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`HtmlRenderRequest`] | Body of `POST /api/generate-pdf` |
//! | [`UrlRenderRequest`] | Body of `POST /api/generate-pdf-from-url` |
//! | [`RenderedPdf`] | Successful render result |
//! | [`ErrorBody`] | JSON error payload |
//! | [`HealthResponse`] | Payload of `GET /api/health` |

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Filename used when a request does not name its report.
pub const DEFAULT_REPORT_FILENAME: &str = "Vehicle_Inspection_Report.pdf";

// ============================================================================
// Request Types
// ============================================================================

/// Request body for rendering inline HTML to PDF.
///
/// `htmlContent` is required; an absent or blank value is rejected with
/// `400 {"error": "HTML content is required"}` before any browser work.
///
/// # Example
///
/// ```json
/// {
///     "htmlContent": "<!DOCTYPE html><html><body>…</body></html>",
///     "filename": "inspection-2026-08.pdf"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HtmlRenderRequest {
    /// Complete HTML document to render.
    ///
    /// The report client inlines its styles and embeds images as absolute
    /// URLs or base64 data URLs; relative URLs will not resolve.
    #[serde(default)]
    pub html_content: String,

    /// Output filename for the `Content-Disposition` header.
    ///
    /// Defaults to [`DEFAULT_REPORT_FILENAME`].
    #[serde(default)]
    pub filename: Option<String>,
}

impl HtmlRenderRequest {
    /// The requested filename, or the default report name.
    pub fn filename_or_default(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_FILENAME.to_string())
    }
}

/// Request body for rendering a URL to PDF.
///
/// `url` is required and must parse as an absolute URL; absence is rejected
/// with `400 {"error": "URL is required"}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UrlRenderRequest {
    /// The URL to navigate to and capture.
    #[serde(default)]
    pub url: String,

    /// Output filename for the `Content-Disposition` header.
    ///
    /// Defaults to [`DEFAULT_REPORT_FILENAME`].
    #[serde(default)]
    pub filename: Option<String>,
}

impl UrlRenderRequest {
    /// The requested filename, or the default report name.
    pub fn filename_or_default(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_FILENAME.to_string())
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Successful render result: the PDF bytes plus the filename the caller
/// should attach them under.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    /// Raw PDF bytes. Valid output always starts with `%PDF-`.
    pub data: Vec<u8>,

    /// Filename for the `Content-Disposition` header.
    pub filename: String,
}

impl RenderedPdf {
    /// Create a new render result.
    pub fn new(data: Vec<u8>, filename: String) -> Self {
        Self { data, filename }
    }

    /// `Content-Disposition` header value for this result.
    ///
    /// ```rust
    /// use reportpdf_service::render::RenderedPdf;
    ///
    /// let pdf = RenderedPdf::new(vec![0x25], "report.pdf".to_string());
    /// assert_eq!(pdf.content_disposition(), "attachment; filename=\"report.pdf\"");
    /// ```
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    /// Size of the PDF in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// JSON error payload.
///
/// Validation failures carry just the message (`{"error": "…"}`); render
/// failures carry a stable summary plus the engine detail
/// (`{"error": "Failed to generate PDF", "details": "…"}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub error: String,

    /// Engine-level detail, omitted for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&RenderError> for ErrorBody {
    fn from(err: &RenderError) -> Self {
        match err {
            RenderError::Validation(msg) => ErrorBody {
                error: msg.clone(),
                details: None,
            },
            other => ErrorBody {
                error: "Failed to generate PDF".to_string(),
                details: Some(other.to_string()),
            },
        }
    }
}

/// Payload of `GET /api/health`.
///
/// ```json
/// {
///     "status": "ok",
///     "browserReady": true,
///     "environment": "development",
///     "timestamp": "2026-08-06T10:00:00+00:00"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the endpoint responds at all.
    pub status: String,

    /// Whether a resident browser is currently live. `false` until the
    /// first successful render (or always, under launch-per-request).
    pub browser_ready: bool,

    /// Deployment environment label (`development` / `production`).
    pub environment: String,

    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// The wire contract uses camelCase field names.
    #[test]
    fn test_html_request_wire_names() {
        let request: HtmlRenderRequest = serde_json::from_str(
            r#"{"htmlContent": "<html></html>", "filename": "r.pdf"}"#,
        )
        .unwrap();

        assert_eq!(request.html_content, "<html></html>");
        assert_eq!(request.filename.as_deref(), Some("r.pdf"));
    }

    /// An empty body deserializes to defaults rather than failing, so the
    /// handler can reject it with the contract's 400 message.
    #[test]
    fn test_empty_body_deserializes() {
        let request: HtmlRenderRequest = serde_json::from_str("{}").unwrap();
        assert!(request.html_content.is_empty());

        let request: UrlRenderRequest = serde_json::from_str("{}").unwrap();
        assert!(request.url.is_empty());
    }

    /// Missing filenames fall back to the fixed report name.
    #[test]
    fn test_filename_defaults() {
        let request = HtmlRenderRequest::default();
        assert_eq!(request.filename_or_default(), DEFAULT_REPORT_FILENAME);

        let request = UrlRenderRequest {
            url: "https://example.com".to_string(),
            filename: Some("custom.pdf".to_string()),
        };
        assert_eq!(request.filename_or_default(), "custom.pdf");
    }

    /// Content-Disposition always forces an attachment.
    #[test]
    fn test_content_disposition() {
        let pdf = RenderedPdf::new(vec![0; 16], "report.pdf".to_string());
        assert_eq!(
            pdf.content_disposition(),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(pdf.size(), 16);
    }

    /// Validation errors serialize bare; render errors carry details.
    #[test]
    fn test_error_body_shapes() {
        let body = ErrorBody::from(&RenderError::Validation("HTML content is required".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "HTML content is required");
        assert!(json.get("details").is_none());

        let body = ErrorBody::from(&RenderError::Capture("printToPDF failed".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Failed to generate PDF");
        assert!(
            json["details"]
                .as_str()
                .unwrap()
                .contains("printToPDF failed")
        );
    }

    /// Health payload uses the camelCase `browserReady` key.
    #[test]
    fn test_health_response_wire_names() {
        let health = HealthResponse {
            status: "ok".to_string(),
            browser_ready: false,
            environment: "development".to_string(),
            timestamp: "2026-08-06T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["browserReady"], false);
        assert_eq!(json["environment"], "development");
    }
}
