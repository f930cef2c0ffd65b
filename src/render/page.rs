//! Page lifecycle for one render request.
//!
//! Everything here is **blocking** and runs under
//! [`tokio::task::spawn_blocking`]; the async orchestration lives in
//! [`super::pdf`].
//!
//! Each request gets its own freshly opened page on the shared browser —
//! pages are never reused, so one request's DOM state cannot leak into
//! another's. The sequence for a request is strictly:
//!
//! 1. open page
//! 2. load content (DOM parsed, not full resource load), time-bounded
//! 3. wait for images, each bounded by the per-image ceiling
//! 4. fixed settle delay for late layout/reflow
//! 5. capture a paginated A4 PDF
//! 6. close the page — always, whatever happened above

use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::Browser;
use headless_chrome::Tab;
use headless_chrome::types::PrintToPdfOptions;

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};

// ============================================================================
// Constants
// ============================================================================

/// A4 paper width in inches (210 mm), as the capture API expects.
const A4_PAPER_WIDTH_INCHES: f64 = 8.27;

/// A4 paper height in inches (297 mm).
const A4_PAPER_HEIGHT_INCHES: f64 = 11.69;

/// Page margin in inches (10 mm) applied on all four sides.
const PAGE_MARGIN_INCHES: f64 = 0.39;

// ============================================================================
// Types
// ============================================================================

/// What the page should load.
#[derive(Debug, Clone)]
pub(crate) enum ContentSource {
    /// Inline HTML, loaded through a percent-encoded `data:` URL.
    Html(String),

    /// External URL to navigate to.
    Url(String),
}

/// Timing knobs for one render, copied out of [`RenderConfig`] so the
/// blocking task does not need the whole configuration.
#[derive(Debug, Clone)]
pub(crate) struct PageOptions {
    /// Bound on loading inline HTML content.
    pub content_load_timeout: Duration,

    /// Bound on navigating to an external URL.
    pub navigation_timeout: Duration,

    /// Per-image ceiling during the image wait.
    pub image_wait_ceiling: Duration,

    /// Fixed post-image settle delay.
    pub settle_delay: Duration,
}

impl PageOptions {
    /// Extract the page-level timing knobs from the service configuration.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            content_load_timeout: config.content_load_timeout,
            navigation_timeout: config.navigation_timeout,
            image_wait_ceiling: config.image_wait_ceiling,
            settle_delay: config.settle_delay,
        }
    }
}

// ============================================================================
// Page lifecycle
// ============================================================================

/// Render one request on the given browser and return the PDF bytes.
///
/// The page is closed on every exit path; close errors are swallowed since
/// the page may already be gone if the browser crashed mid-render.
pub(crate) fn render_page(
    browser: &Browser,
    source: &ContentSource,
    options: &PageOptions,
) -> Result<Vec<u8>> {
    let started = Instant::now();

    let tab = browser
        .new_tab()
        .map_err(|e| RenderError::Capture(format!("failed to open page: {}", e)))?;

    let result = load_and_capture(&tab, source, options);

    close_page(&tab);

    match &result {
        Ok(pdf) => log::debug!(
            "Rendered {:.1}KB in {}ms",
            pdf.len() as f64 / 1024.0,
            started.elapsed().as_millis()
        ),
        Err(e) => log::debug!(
            "Render failed after {}ms: {}",
            started.elapsed().as_millis(),
            e
        ),
    }

    result
}

/// Steps 2–5: load, wait for images, settle, capture.
///
/// Separated from [`render_page`] so the page-close step wraps every exit
/// path exactly once.
fn load_and_capture(
    tab: &Arc<Tab>,
    source: &ContentSource,
    options: &PageOptions,
) -> Result<Vec<u8>> {
    match source {
        ContentSource::Html(html) => {
            tab.set_default_timeout(options.content_load_timeout);

            // The engine drives pages by navigation, so inline HTML goes
            // through a data URL; percent-encoding keeps markup intact.
            let data_url = format!(
                "data:text/html;charset=utf-8,{}",
                urlencoding::encode(html)
            );

            log::trace!("Loading {} bytes of HTML via data URL", html.len());
            tab.navigate_to(&data_url)
                .map_err(|e| RenderError::ContentTimeout(e.to_string()))?
                .wait_until_navigated()
                .map_err(|e| RenderError::ContentTimeout(e.to_string()))?;
        }
        ContentSource::Url(url) => {
            tab.set_default_timeout(options.navigation_timeout);

            log::trace!("Navigating to {}", url);
            tab.navigate_to(url)
                .map_err(|e| RenderError::ContentTimeout(e.to_string()))?
                .wait_until_navigated()
                .map_err(|e| RenderError::ContentTimeout(e.to_string()))?;
        }
    }

    wait_for_images(tab, options.image_wait_ceiling)?;

    // Engines can report DOM-ready before layout stabilizes after image
    // injection; give reflow a fixed window.
    std::thread::sleep(options.settle_delay);

    log::trace!("Capturing PDF");
    let pdf = tab
        .print_to_pdf(Some(print_options()))
        .map_err(|e| RenderError::Capture(e.to_string()))?;

    Ok(pdf)
}

/// Wait for every image in the document to resolve.
///
/// Each image resolves as soon as it reports complete, on its load or
/// error event, or when the per-image ceiling passes — whichever comes
/// first. All images are waited on concurrently inside the page, and a
/// broken image counts as resolved: only a failure of the wait itself
/// (e.g. a severed browser connection) surfaces as an error.
fn wait_for_images(tab: &Arc<Tab>, ceiling: Duration) -> Result<()> {
    let script = image_wait_script(ceiling);

    let resolved = tab
        .evaluate(&script, true)
        .map_err(|e| RenderError::ContentTimeout(format!("image wait failed: {}", e)))?;

    if let Some(count) = resolved.value.as_ref().and_then(|v| v.as_u64()) {
        log::trace!("Resolved {} image(s)", count);
    }

    Ok(())
}

/// Build the in-page promise that resolves when every image has settled.
fn image_wait_script(ceiling: Duration) -> String {
    format!(
        r#"(async () => {{
    const images = Array.from(document.querySelectorAll('img'));
    await Promise.all(images.map((img) => {{
        if (img.complete) return Promise.resolve();
        return new Promise((resolve) => {{
            img.addEventListener('load', resolve);
            img.addEventListener('error', resolve);
            setTimeout(resolve, {ceiling_ms});
        }});
    }}));
    return images.length;
}})()"#,
        ceiling_ms = ceiling.as_millis()
    )
}

/// Capture options: explicit A4 page size with 10 mm margins, backgrounds
/// printed, page size driven by these options rather than CSS.
fn print_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(A4_PAPER_WIDTH_INCHES),
        paper_height: Some(A4_PAPER_HEIGHT_INCHES),
        margin_top: Some(PAGE_MARGIN_INCHES),
        margin_bottom: Some(PAGE_MARGIN_INCHES),
        margin_left: Some(PAGE_MARGIN_INCHES),
        margin_right: Some(PAGE_MARGIN_INCHES),
        prefer_css_page_size: Some(false),
        display_header_footer: Some(false),
        ..Default::default()
    }
}

/// Close the page, swallowing errors.
///
/// The page may already be gone if the browser crashed; what matters is
/// that no page handle survives the request.
fn close_page(tab: &Arc<Tab>) {
    if let Err(e) = tab.close(true) {
        log::debug!("Page close failed (may already be gone): {}", e);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// The image wait embeds the configured ceiling in milliseconds.
    #[test]
    fn test_image_wait_script_embeds_ceiling() {
        let script = image_wait_script(Duration::from_secs(3));
        assert!(script.contains("setTimeout(resolve, 3000)"));
        assert!(script.contains("querySelectorAll('img')"));

        let script = image_wait_script(Duration::from_millis(7500));
        assert!(script.contains("setTimeout(resolve, 7500)"));
    }

    /// Broken images resolve rather than reject: the promise chain only
    /// ever calls resolve.
    #[test]
    fn test_image_wait_script_never_rejects() {
        let script = image_wait_script(Duration::from_secs(3));
        assert!(script.contains("addEventListener('error', resolve)"));
        assert!(!script.contains("reject"));
    }

    /// Capture is pinned to A4 with 10 mm margins and explicit sizing.
    #[test]
    fn test_print_options() {
        let options = print_options();

        assert_eq!(options.paper_width, Some(A4_PAPER_WIDTH_INCHES));
        assert_eq!(options.paper_height, Some(A4_PAPER_HEIGHT_INCHES));
        assert_eq!(options.margin_top, Some(PAGE_MARGIN_INCHES));
        assert_eq!(options.margin_bottom, Some(PAGE_MARGIN_INCHES));
        assert_eq!(options.margin_left, Some(PAGE_MARGIN_INCHES));
        assert_eq!(options.margin_right, Some(PAGE_MARGIN_INCHES));
        assert_eq!(options.print_background, Some(true));
        assert_eq!(options.prefer_css_page_size, Some(false));
        assert_eq!(options.display_header_footer, Some(false));
    }

    /// PageOptions mirrors the service configuration.
    #[test]
    fn test_page_options_from_config() {
        let config = RenderConfig::default();
        let options = PageOptions::from_config(&config);

        assert_eq!(options.content_load_timeout, config.content_load_timeout);
        assert_eq!(options.navigation_timeout, config.navigation_timeout);
        assert_eq!(options.image_wait_ceiling, config.image_wait_ceiling);
        assert_eq!(options.settle_delay, config.settle_delay);
    }
}
