//! Shared traits.
//!
//! Currently this module only hosts [`Healthcheck`], the connectivity probe
//! used by the supervisor before reusing a pooled browser.

mod healthcheck;

pub use healthcheck::Healthcheck;
