//! HTTP surface of the rendering service.
//!
//! Three routes, JSON in, binary or JSON out:
//!
//! | Endpoint | Method | Body |
//! |----------|--------|------|
//! | `/api/generate-pdf` | POST | `{htmlContent, filename?}` |
//! | `/api/generate-pdf-from-url` | POST | `{url, filename?}` |
//! | `/api/health` | GET | — |
//!
//! Handlers are a thin shell over [`crate::render`]: they map
//! [`RenderError`] to status codes and stream PDF bytes back with the
//! attachment headers. A counting semaphore bounds concurrent in-flight
//! renders, since every open page costs browser memory.
//!
//! # Caller retry contract
//!
//! The service never retries internally. Callers should treat a refused
//! connection or `503` as "cold start / unreachable" — ping `/api/health`
//! to wake the server and retry with backoff — while a `400` means the
//! input itself is bad and a `500` means this content failed to render;
//! neither is retriable without changing the request.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::sync::Semaphore;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::render::{
    ErrorBody, HealthResponse, HtmlRenderRequest, RenderedPdf, UrlRenderRequest,
    render_pdf_from_html, render_pdf_from_url,
};
use crate::supervisor::BrowserSupervisor;

/// Report HTML arrives with inlined styles and base64 images; allow
/// generously sized bodies.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The browser supervisor, shared with the shutdown path.
    supervisor: Arc<BrowserSupervisor>,

    /// Service configuration.
    config: Arc<RenderConfig>,

    /// Bounds concurrent in-flight renders; excess requests queue here
    /// inside their end-to-end deadline.
    render_slots: Arc<Semaphore>,
}

impl AppState {
    /// Create handler state from a supervisor and configuration.
    pub fn new(supervisor: Arc<BrowserSupervisor>, config: Arc<RenderConfig>) -> Self {
        let render_slots = Arc::new(Semaphore::new(config.max_concurrent_renders));
        Self {
            supervisor,
            config,
            render_slots,
        }
    }
}

/// Build the service router.
///
/// # Example
///
/// ```rust,ignore
/// let app = router(AppState::new(supervisor, config));
/// axum::serve(listener, app).await?;
/// ```
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate-pdf", post(generate_pdf))
        .route("/api/generate-pdf-from-url", post(generate_pdf_from_url))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// `POST /api/generate-pdf` — render inline HTML.
async fn generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<HtmlRenderRequest>,
) -> Response {
    let _permit = match state.render_slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return error_response(&RenderError::ShuttingDown),
    };

    match render_pdf_from_html(&state.supervisor, &state.config, &request).await {
        Ok(pdf) => pdf_response(pdf),
        Err(error) => error_response(&error),
    }
}

/// `POST /api/generate-pdf-from-url` — render an external URL.
async fn generate_pdf_from_url(
    State(state): State<AppState>,
    Json(request): Json<UrlRenderRequest>,
) -> Response {
    let _permit = match state.render_slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return error_response(&RenderError::ShuttingDown),
    };

    match render_pdf_from_url(&state.supervisor, &state.config, &request).await {
        Ok(pdf) => pdf_response(pdf),
        Err(error) => error_response(&error),
    }
}

/// `GET /api/health` — liveness plus browser readiness.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        browser_ready: state.supervisor.browser_ready().await,
        environment: state.config.deployment_mode.environment_label().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Build the binary success response with attachment headers.
fn pdf_response(pdf: RenderedPdf) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, pdf.content_disposition()),
        ],
        pdf.data,
    )
        .into_response()
}

/// Map a render error to its JSON response.
fn error_response(error: &RenderError) -> Response {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody::from(error))).into_response()
}

/// Resolve when the process receives SIGINT or SIGTERM, then close the
/// live browser.
///
/// Pass to [`axum::serve`]'s `with_graceful_shutdown` so the browser is
/// gone before the process exits.
pub async fn shutdown_signal(supervisor: Arc<BrowserSupervisor>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, closing browser...");
    supervisor.shutdown().await;
    log::info!("Cleanup complete");
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Error → response mapping covers the contract's three shapes.
    #[test]
    fn test_error_response_statuses() {
        let response = error_response(&RenderError::Validation("URL is required".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&RenderError::Capture("boom".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = error_response(&RenderError::ShuttingDown);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    /// Success responses carry the PDF content type and attachment header.
    #[test]
    fn test_pdf_response_headers() {
        let pdf = RenderedPdf::new(b"%PDF-1.4".to_vec(), "report.pdf".to_string());
        let response = pdf_response(pdf);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"report.pdf\""
        );
    }
}
