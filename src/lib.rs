//! # reportpdf-service
//!
//! PDF rendering service for vehicle inspection reports: takes arbitrary
//! report HTML (or a URL), drives a headless Chrome instance to lay it out,
//! waits for asynchronous image loading, and produces a paginated A4 PDF —
//! while amortizing browser startup cost across requests via a pooled,
//! self-expiring browser instance that recovers from renderer crashes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              HTTP (axum)                    │
//! │  /api/generate-pdf   /api/health            │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │            render module                    │
//! │  validate → acquire → render → classify     │
//! └───────┬─────────────────────┬───────────────┘
//!         │                     │
//!         ▼                     ▼
//! ┌──────────────────┐  ┌─────────────────────┐
//! │ BrowserSupervisor│  │   Page lifecycle    │
//! │  one resident    │  │  open page → load   │
//! │  browser, launch │  │  → wait images →    │
//! │  coalescing,     │  │  settle → capture   │
//! │  idle expiry     │  │  → always close     │
//! └────────┬─────────┘  └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────┐
//! │        Headless Chrome process              │
//! │     (managed by headless_chrome crate)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Single browser**: at most one browser process exists under the
//!   pooled policy, and at most one launch attempt is ever outstanding —
//!   concurrent cold-start requests share one launch.
//! - **Idle expiry**: the browser closes after a full idle window (default
//!   5 minutes) with zero acquisitions; every use re-arms the clock.
//! - **Page isolation**: each request renders in its own freshly opened
//!   page, closed on every exit path.
//! - **Crash recovery**: failures matching the configured renderer-fatal
//!   signatures invalidate the pooled handle so the next request
//!   relaunches; ordinary content failures leave it alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reportpdf_service::{
//!     AppState, BrowserSupervisor, ChromeBrowserFactory, RenderConfig, router, shutdown_signal,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(RenderConfig::default());
//!
//!     let supervisor = Arc::new(
//!         BrowserSupervisor::builder()
//!             .policy(config.policy)
//!             .idle_timeout(config.idle_timeout)
//!             .factory(Box::new(ChromeBrowserFactory::from_config(&config)))
//!             .build()?,
//!     );
//!
//!     let app = router(AppState::new(Arc::clone(&supervisor), config));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3002").await?;
//!     axum::serve(listener, app)
//!         .with_graceful_shutdown(shutdown_signal(supervisor))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | `app.env` / environment-based configuration (default) |
//! | `test-utils` | Mock browser factory for testing without Chrome |

#![doc(html_root_url = "https://docs.rs/reportpdf-service/0.3.1")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod factory;
pub mod lease;
pub mod prelude;
pub mod render;
pub mod server;
pub mod supervisor;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod tracked;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

pub use config::{BrowserPolicy, DeploymentMode, RenderConfig, RenderConfigBuilder};
pub use error::{RenderError, Result};
pub use factory::{BrowserFactory, ChromeBrowserFactory, create_launch_options};
pub use lease::BrowserLease;
pub use render::{HtmlRenderRequest, RenderedPdf, UrlRenderRequest};
pub use server::{AppState, router, shutdown_signal};
pub use supervisor::{BrowserSupervisor, BrowserSupervisorBuilder};
pub use traits::Healthcheck;

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::from_env;

// ============================================================================
// Convenience type aliases
// ============================================================================

/// Shared supervisor handle for web handlers and the shutdown path.
pub type SharedSupervisor = std::sync::Arc<BrowserSupervisor>;
