//! Browser factory implementations.
//!
//! This module provides the [`BrowserFactory`] trait and the concrete
//! [`ChromeBrowserFactory`]. The factory abstracts how a browser process is
//! started so the supervisor can be exercised in tests without a Chrome
//! installation (see [`mock`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use reportpdf_service::{BrowserFactory, ChromeBrowserFactory, RenderConfig};
//!
//! let factory = ChromeBrowserFactory::from_config(&RenderConfig::default());
//! let browser = factory.create()?;
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeBrowserFactory, create_launch_options};

use headless_chrome::Browser;

use crate::error::Result;

/// Trait for browser creation.
///
/// The supervisor calls [`create()`](Self::create) at most once per launch
/// (cold start, relaunch after idle expiry, relaunch after session loss).
/// Concurrent launch attempts are coalesced upstream, so implementations
/// never see overlapping calls from a pooled supervisor.
///
/// # Thread Safety
///
/// Requires `Send + Sync`: creation runs on a blocking worker thread while
/// the supervisor owns the factory from the async side.
pub trait BrowserFactory: Send + Sync {
    /// Launch a new browser process.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`](crate::RenderError::Launch) when the
    /// binary is missing, the launch flags are invalid, or the process
    /// fails to come up.
    fn create(&self) -> Result<Browser>;
}
