//! Render request orchestration.
//!
//! The handler layer of the service: validates input, acquires a browser
//! from the supervisor, delegates to the page lifecycle on a blocking
//! worker, applies the end-to-end deadline, and classifies failures —
//! deciding whether the shared browser must be invalidated.
//!
//! A request moves through `Validating → AcquiringBrowser → Rendering →
//! {Succeeded | Failed}`. There is no retry here; retry policy belongs to
//! the caller.

use std::time::Instant;

use crate::config::RenderConfig;
use crate::error::{RenderError, Result, classify_render_failure};
use crate::supervisor::BrowserSupervisor;

use super::page::{ContentSource, PageOptions, render_page};
use super::types::{HtmlRenderRequest, RenderedPdf, UrlRenderRequest};

/// Render inline HTML to a PDF.
///
/// # Errors
///
/// - [`RenderError::Validation`] for absent/blank `htmlContent`, rejected
///   before any browser acquisition
/// - [`RenderError::Launch`] when the browser cannot start
/// - [`RenderError::SessionLost`] when the browser died mid-render (the
///   supervisor handle has already been invalidated by the time this
///   returns)
/// - [`RenderError::ContentTimeout`] / [`RenderError::Capture`] for
///   ordinary content failures; the pooled browser stays valid
/// - [`RenderError::Timeout`] when the end-to-end deadline expires
pub async fn render_pdf_from_html(
    supervisor: &BrowserSupervisor,
    config: &RenderConfig,
    request: &HtmlRenderRequest,
) -> Result<RenderedPdf> {
    if request.html_content.trim().is_empty() {
        return Err(RenderError::Validation("HTML content is required".to_string()));
    }

    log::debug!(
        "📄 Rendering PDF from {} bytes of HTML",
        request.html_content.len()
    );

    let source = ContentSource::Html(request.html_content.clone());
    let data = render_with_deadline(supervisor, config, source).await?;

    Ok(RenderedPdf::new(data, request.filename_or_default()))
}

/// Render an external URL to a PDF.
///
/// The URL must be present and parse as an absolute URL; both checks run
/// before any browser acquisition.
///
/// # Errors
///
/// As [`render_pdf_from_html`], plus [`RenderError::Validation`] for a
/// malformed URL.
pub async fn render_pdf_from_url(
    supervisor: &BrowserSupervisor,
    config: &RenderConfig,
    request: &UrlRenderRequest,
) -> Result<RenderedPdf> {
    if request.url.trim().is_empty() {
        return Err(RenderError::Validation("URL is required".to_string()));
    }

    let url = url::Url::parse(&request.url)
        .map_err(|e| RenderError::Validation(format!("Invalid URL: {}", e)))?;

    log::debug!("📄 Rendering PDF from URL {}", url);

    let source = ContentSource::Url(url.to_string());
    let data = render_with_deadline(supervisor, config, source).await?;

    Ok(RenderedPdf::new(data, request.filename_or_default()))
}

/// Acquire, render, classify — all under the end-to-end deadline.
///
/// On deadline expiry only the waiting caller gives up: the blocking render
/// task is detached, runs on, and still closes its page, so no page handle
/// leaks from an abandoned request.
async fn render_with_deadline(
    supervisor: &BrowserSupervisor,
    config: &RenderConfig,
    source: ContentSource,
) -> Result<Vec<u8>> {
    let deadline = config.request_timeout;
    let started = Instant::now();

    let outcome = tokio::time::timeout(deadline, async {
        let lease = supervisor.acquire().await?;
        let browser = lease.shared_browser();
        let options = PageOptions::from_config(config);
        let task_source = source;

        let rendered =
            tokio::task::spawn_blocking(move || render_page(&browser, &task_source, &options))
                .await
                .map_err(|e| RenderError::Capture(format!("render task failed: {}", e)))?;

        match rendered {
            Ok(data) => {
                log::info!(
                    "✅ PDF generated: {:.1}KB in {}ms",
                    data.len() as f64 / 1024.0,
                    started.elapsed().as_millis()
                );
                Ok(data)
            }
            Err(error) => {
                let error = classify_render_failure(error, &config.fatal_error_signatures);
                if error.is_session_fatal() {
                    supervisor.invalidate(lease.id()).await;
                }
                log::error!("❌ PDF generation failed: {}", error);
                Err(error)
            }
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            log::error!(
                "❌ Render abandoned after {}s deadline (cleanup continues in background)",
                deadline.as_secs()
            );
            Err(RenderError::Timeout(deadline.as_secs()))
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
