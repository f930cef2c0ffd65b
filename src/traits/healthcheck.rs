//! Connectivity probe for browser instances.
//!
//! The supervisor holds one resident browser between requests. Before
//! handing it out again it must know whether the process behind the handle
//! is still alive — the engine exposes no connectivity flag, so liveness is
//! derived by probing: open a throwaway tab, close it. If that round-trip
//! fails, the handle is dead and the supervisor relaunches.

use crate::error::Result;

/// Trait for browser-like objects that support a liveness probe.
///
/// # Thread Safety
///
/// Requires `Send + Sync` because the probe runs on a blocking worker
/// thread while the supervisor lock is held on the async side.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use reportpdf_service::{Healthcheck, RenderError, Result};
///
/// struct MyBrowser {
///     inner: SomeBrowserType,
/// }
///
/// impl Healthcheck for MyBrowser {
///     fn ping(&self) -> Result<()> {
///         let tab = self.inner.new_tab()
///             .map_err(|e| RenderError::SessionLost(e.to_string()))?;
///         let _ = tab.close();
///         Ok(())
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Probe the browser for liveness.
    ///
    /// Should be a lightweight round-trip (create/close a tab). A failure
    /// means the underlying process or its control connection is gone.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SessionLost`](crate::RenderError::SessionLost)
    /// when the browser does not respond.
    fn ping(&self) -> Result<()>;
}
