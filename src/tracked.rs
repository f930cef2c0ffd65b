//! Tracked browser with metadata for supervision.
//!
//! [`TrackedBrowser`] wraps one [`Browser`] instance with the identity and
//! timing data the supervisor needs: a unique id (so invalidation can tell
//! "the browser that crashed" apart from "the browser launched after it")
//! and the launch timestamp.
//!
//! Users never see this type directly; they get a
//! [`BrowserLease`](crate::BrowserLease).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use headless_chrome::Browser;

use crate::error::{RenderError, Result};
use crate::traits::Healthcheck;

/// A browser instance with supervision metadata.
///
/// Cloning is cheap (the browser is ref-counted) and shares the same
/// underlying process; the process exits when the last clone is dropped.
#[derive(Clone)]
pub(crate) struct TrackedBrowser {
    /// Unique identifier, assigned from a process-wide counter.
    ///
    /// Invalidation compares ids so a crash report for an old browser can
    /// never tear down its replacement.
    id: u64,

    /// The engine browser handle (ref-counted).
    browser: Arc<Browser>,

    /// Launch timestamp, for logging the lifetime of closed browsers.
    launched_at: Instant,
}

impl TrackedBrowser {
    /// Wrap a freshly launched browser, validating it first.
    ///
    /// Opens a test tab, navigates it to an empty document and closes it,
    /// proving the process is alive and the control connection works
    /// before the supervisor caches the handle.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] if validation fails — a browser that
    /// cannot open a tab is as good as one that never started.
    pub(crate) fn new(browser: Browser) -> Result<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let browser = Arc::new(browser);
        let launched_at = Instant::now();

        log::debug!("Validating freshly launched browser...");

        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Launch(format!("validation tab failed: {}", e)))?;

        tab.navigate_to("data:text/html,<html></html>").map_err(|e| {
            let _ = tab.close(true);
            RenderError::Launch(format!("validation navigation failed: {}", e))
        })?;

        let _ = tab.close(true);

        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        log::debug!("✅ Browser {} validated and ready", id);

        Ok(TrackedBrowser {
            id,
            browser,
            launched_at,
        })
    }

    /// Unique identifier of this browser instance.
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Shared handle to the underlying engine browser.
    #[inline]
    pub(crate) fn browser(&self) -> &Arc<Browser> {
        &self.browser
    }

    /// Time since launch.
    #[inline]
    pub(crate) fn age(&self) -> Duration {
        self.launched_at.elapsed()
    }
}

impl Healthcheck for TrackedBrowser {
    /// Probe liveness by opening and closing a throwaway tab.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SessionLost`] if the round-trip fails; the
    /// supervisor treats that as a dead handle and relaunches.
    fn ping(&self) -> Result<()> {
        log::trace!("Pinging browser {}...", self.id);

        let tab = self.browser.new_tab().map_err(|e| {
            log::warn!("Browser {} failed liveness probe: {}", self.id, e);
            RenderError::SessionLost(e.to_string())
        })?;

        let _ = tab.close(true);

        log::trace!("Browser {} is alive", self.id);
        Ok(())
    }
}

impl std::fmt::Debug for TrackedBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedBrowser")
            .field("id", &self.id)
            .field("age_secs", &self.age().as_secs())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    /// Age is derived from the launch instant; verify the arithmetic used
    /// by the idle-close log line without needing a real browser.
    #[test]
    #[cfg(not(windows))]
    fn test_age_arithmetic() {
        let launched_at = Instant::now() - Duration::from_secs(42);
        assert!(launched_at.elapsed() >= Duration::from_secs(42));
    }

    /// Windows version: `Instant::now() - Duration` can panic there if the
    /// duration exceeds process uptime, so compare plain durations.
    #[test]
    #[cfg(windows)]
    fn test_age_arithmetic() {
        let age = Duration::from_secs(42);
        assert!(age >= Duration::from_secs(42));
    }
}
