//! Convenient re-exports for common usage.
//!
//! ```rust
//! use reportpdf_service::prelude::*;
//! ```

pub use crate::config::{BrowserPolicy, DeploymentMode, RenderConfig, RenderConfigBuilder};
pub use crate::error::{RenderError, Result};
pub use crate::factory::{BrowserFactory, ChromeBrowserFactory};
pub use crate::lease::BrowserLease;
pub use crate::render::{
    DEFAULT_REPORT_FILENAME, ErrorBody, HealthResponse, HtmlRenderRequest, RenderedPdf,
    UrlRenderRequest, render_pdf_from_html, render_pdf_from_url,
};
pub use crate::server::{AppState, router, shutdown_signal};
pub use crate::supervisor::{BrowserSupervisor, BrowserSupervisorBuilder};
pub use crate::traits::Healthcheck;
pub use crate::SharedSupervisor;
