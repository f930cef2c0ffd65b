//! Lease on a supervised browser for the duration of one render request.
//!
//! A [`BrowserLease`] is the only way browser access leaves the
//! supervisor. Under the pooled policy the lease is a borrow — dropping it
//! leaves the resident browser in the supervisor's slot for the next
//! request. Under the launch-per-request policy the lease owns the browser
//! outright and closes it on drop.
//!
//! # Deref Behavior
//!
//! `BrowserLease` implements [`Deref<Target = Browser>`](std::ops::Deref),
//! so engine methods work directly on the lease:
//!
//! ```rust,ignore
//! let lease = supervisor.acquire().await?;
//! let tab = lease.new_tab()?;   // Browser::new_tab
//! ```

use std::sync::Arc;

use headless_chrome::Browser;

use crate::tracked::TrackedBrowser;

/// Capability to use one browser for one render request.
///
/// # Thread Safety
///
/// `Send` but used by a single request at a time; the page opened through
/// it is the request's exclusively-owned sub-resource.
pub struct BrowserLease {
    /// The tracked browser (`Option` so Drop can take it).
    tracked: Option<TrackedBrowser>,

    /// Whether dropping this lease closes the browser.
    ///
    /// `true` only under the launch-per-request policy; pooled leases
    /// leave the resident browser alive for the next request.
    close_on_drop: bool,
}

impl BrowserLease {
    /// Lease on the resident pooled browser.
    pub(crate) fn pooled(tracked: TrackedBrowser) -> Self {
        Self {
            tracked: Some(tracked),
            close_on_drop: false,
        }
    }

    /// Lease owning a per-request browser, closed on drop.
    pub(crate) fn ephemeral(tracked: TrackedBrowser) -> Self {
        Self {
            tracked: Some(tracked),
            close_on_drop: true,
        }
    }

    /// Unique id of the leased browser, for logging and invalidation.
    pub fn id(&self) -> u64 {
        self.tracked.as_ref().map(TrackedBrowser::id).unwrap_or(0)
    }

    /// Shared handle to the engine browser, for moving into a blocking
    /// render task. The process stays alive at least until every shared
    /// handle is dropped, so an in-flight render is never killed under a
    /// racing idle expiry.
    pub fn shared_browser(&self) -> Arc<Browser> {
        Arc::clone(
            self.tracked
                .as_ref()
                .expect("lease used after drop")
                .browser(),
        )
    }
}

impl std::ops::Deref for BrowserLease {
    type Target = Browser;

    /// Transparent access to the underlying [`Browser`].
    ///
    /// # Panics
    ///
    /// Panics if called after the lease was dropped, which cannot happen
    /// through safe use — the lease owns its browser until Drop.
    fn deref(&self) -> &Self::Target {
        self.tracked.as_ref().expect("lease used after drop").browser()
    }
}

impl Drop for BrowserLease {
    fn drop(&mut self) {
        if let Some(tracked) = self.tracked.take() {
            if self.close_on_drop {
                log::debug!(
                    "Closing per-request browser {} (lived {}s)",
                    tracked.id(),
                    tracked.age().as_secs()
                );
                // Dropping the handle terminates the process once the last
                // clone (e.g. a still-running render task) lets go.
            }
        }
    }
}

impl std::fmt::Debug for BrowserLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tracked {
            Some(tracked) => f
                .debug_struct("BrowserLease")
                .field("id", &tracked.id())
                .field("close_on_drop", &self.close_on_drop)
                .finish(),
            None => f
                .debug_struct("BrowserLease")
                .field("state", &"released")
                .finish(),
        }
    }
}
