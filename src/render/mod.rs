//! PDF rendering core.
//!
//! Framework-agnostic rendering logic, split the same way the service is
//! described: [`types`] defines the wire contract, [`page`] drives one
//! page's lifecycle on a blocking worker, and [`pdf`] orchestrates a whole
//! request (validate → acquire → render → classify) on the async side.
//!
//! The HTTP layer in [`crate::server`] is a thin shell over
//! [`render_pdf_from_html`] and [`render_pdf_from_url`].

mod page;
mod pdf;
mod types;

pub use types::DEFAULT_REPORT_FILENAME;
pub use types::ErrorBody;
pub use types::HealthResponse;
pub use types::HtmlRenderRequest;
pub use types::RenderedPdf;
pub use types::UrlRenderRequest;

pub use pdf::render_pdf_from_html;
pub use pdf::render_pdf_from_url;
