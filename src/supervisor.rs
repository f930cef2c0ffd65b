//! Browser process supervision.
//!
//! [`BrowserSupervisor`] owns the single expensive resource in this service:
//! one headless browser process, launched lazily, shared by every render
//! request and torn down after a full idle window with no use.
//!
//! # Invariants
//!
//! - **At most one browser process exists** (pooled policy), and **at most
//!   one launch attempt is ever outstanding**, no matter how many render
//!   requests arrive during a cold start. The browser slot lives behind an
//!   async mutex that is held across the launch, so concurrent cold-start
//!   callers queue on the lock and find the freshly launched browser
//!   instead of starting their own.
//! - Every acquisition that finds a live browser re-arms the idle clock;
//!   the browser is closed only after the full window passes with zero
//!   acquisitions.
//! - A launch failure is fatal to that acquisition only. Nothing is cached,
//!   so the next request retries from scratch.
//!
//! # Architecture
//!
//! ```text
//! BrowserSupervisor
//!   └─ SupervisorInner (Arc-shared)
//!       ├─ slot: Mutex<Option<TrackedBrowser>>   (the resident browser)
//!       ├─ idle_epoch: AtomicU64                 (touch-on-use clock)
//!       └─ shutting_down: AtomicBool
//! ```
//!
//! The idle clock is an epoch counter: each acquisition bumps it and arms a
//! fresh expiry task carrying the epoch it saw. When a task wakes it closes
//! the browser only if the epoch is still current — any acquisition in the
//! meantime has silently cancelled it.
//!
//! # Example
//!
//! ```rust,no_run
//! use reportpdf_service::{BrowserSupervisor, ChromeBrowserFactory, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::default();
//!     let supervisor = BrowserSupervisor::builder()
//!         .policy(config.policy)
//!         .idle_timeout(config.idle_timeout)
//!         .factory(Box::new(ChromeBrowserFactory::from_config(&config)))
//!         .build()?;
//!
//!     let lease = supervisor.acquire().await?;
//!     let tab = lease.new_tab()?;
//!     // ... render ...
//!
//!     supervisor.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::BrowserPolicy;
use crate::error::{RenderError, Result};
use crate::factory::BrowserFactory;
use crate::lease::BrowserLease;
use crate::tracked::TrackedBrowser;
use crate::traits::Healthcheck;

// ============================================================================
// SupervisorInner
// ============================================================================

/// Shared supervisor state.
pub(crate) struct SupervisorInner {
    /// Browser lifecycle policy.
    policy: BrowserPolicy,

    /// Idle window after which an unused resident browser is closed.
    idle_timeout: Duration,

    /// Factory performing the actual process launch.
    factory: Box<dyn BrowserFactory>,

    /// The resident browser (pooled policy only).
    ///
    /// Held across launches: this lock IS the launch-coalescing mechanism.
    slot: Mutex<Option<TrackedBrowser>>,

    /// Idle clock epoch. Bumped on every acquisition and on shutdown;
    /// expiry tasks fire only if their epoch is still current.
    idle_epoch: AtomicU64,

    /// Set once a termination signal arrives; rejects new acquisitions.
    shutting_down: AtomicBool,

    /// Total process launches, reported by [`BrowserSupervisor::launches`].
    launch_count: AtomicU64,
}

impl SupervisorInner {
    /// Launch and validate a browser on a blocking worker thread.
    async fn launch(self: &Arc<Self>) -> Result<TrackedBrowser> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(RenderError::ShuttingDown);
        }

        let inner = Arc::clone(self);
        let tracked = tokio::task::spawn_blocking(move || {
            let browser = inner.factory.create()?;
            TrackedBrowser::new(browser)
        })
        .await
        .map_err(|e| RenderError::Launch(format!("launch task failed: {}", e)))??;

        self.launch_count.fetch_add(1, Ordering::SeqCst);
        log::info!("✅ Browser {} ready", tracked.id());
        Ok(tracked)
    }

    /// Re-arm the idle clock and schedule the matching expiry task.
    ///
    /// Only the task holding the *current* epoch ever closes the browser;
    /// earlier tasks wake, see a newer epoch, and do nothing.
    fn touch(self: &Arc<Self>) {
        let epoch = self.idle_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(self);

        tokio::spawn(async move {
            tokio::time::sleep(inner.idle_timeout).await;

            if inner.idle_epoch.load(Ordering::SeqCst) != epoch {
                return; // renewed by a later acquisition
            }
            if inner.shutting_down.load(Ordering::Acquire) {
                return;
            }

            let mut slot = inner.slot.lock().await;

            // Re-check under the lock: an acquisition may have been waiting
            // on it when we woke.
            if inner.idle_epoch.load(Ordering::SeqCst) != epoch {
                return;
            }

            if let Some(tracked) = slot.take() {
                log::info!(
                    "⏰ Closing idle browser {} ({}s without use)",
                    tracked.id(),
                    inner.idle_timeout.as_secs()
                );
            }
        });
    }
}

// ============================================================================
// BrowserSupervisor
// ============================================================================

/// Supervisor for the shared headless-browser process.
///
/// Construct once at process start via [`builder()`](Self::builder) and
/// share by reference (or `Arc`) with every request handler.
pub struct BrowserSupervisor {
    inner: Arc<SupervisorInner>,
}

impl BrowserSupervisor {
    /// Create a new builder.
    pub fn builder() -> BrowserSupervisorBuilder {
        BrowserSupervisorBuilder::new()
    }

    /// Acquire a browser for one render request.
    ///
    /// Pooled policy: returns the resident browser when its liveness probe
    /// passes (re-arming the idle clock), otherwise launches a replacement.
    /// Callers that arrive while a launch is in flight wait for that launch
    /// instead of starting another.
    ///
    /// Launch-per-request policy: always launches a fresh browser, which
    /// the returned lease closes on drop.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ShuttingDown`] after [`shutdown()`](Self::shutdown)
    /// - [`RenderError::Launch`] if the process cannot start; the next
    ///   acquisition retries
    pub async fn acquire(&self) -> Result<BrowserLease> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(RenderError::ShuttingDown);
        }

        if self.inner.policy == BrowserPolicy::LaunchPerRequest {
            let tracked = self.inner.launch().await?;
            return Ok(BrowserLease::ephemeral(tracked));
        }

        let mut slot = self.inner.slot.lock().await;

        if let Some(tracked) = slot.clone() {
            let probe = {
                let tracked = tracked.clone();
                tokio::task::spawn_blocking(move || tracked.ping()).await
            };

            match probe {
                Ok(Ok(())) => {
                    log::debug!("♻️ Reusing resident browser {}", tracked.id());
                    self.inner.touch();
                    return Ok(BrowserLease::pooled(tracked));
                }
                Ok(Err(e)) => {
                    log::warn!(
                        "Resident browser {} failed liveness probe ({}); relaunching",
                        tracked.id(),
                        e
                    );
                    *slot = None;
                }
                Err(e) => {
                    log::warn!(
                        "Liveness probe task for browser {} failed ({}); relaunching",
                        tracked.id(),
                        e
                    );
                    *slot = None;
                }
            }
        }

        // Slot is empty; launch while still holding the lock so concurrent
        // cold-start callers coalesce onto this attempt.
        let tracked = self.inner.launch().await?;
        *slot = Some(tracked.clone());
        self.inner.touch();

        Ok(BrowserLease::pooled(tracked))
    }

    /// Drop the resident browser if it is still the one identified by `id`.
    ///
    /// Called after a render fails with a session-fatal error. The id check
    /// means a stale crash report can never tear down the replacement
    /// browser launched after it. The failing request still fails; this
    /// only stops the dead handle from poisoning subsequent requests.
    pub async fn invalidate(&self, id: u64) {
        if self.inner.policy == BrowserPolicy::LaunchPerRequest {
            return; // nothing is cached
        }

        let mut slot = self.inner.slot.lock().await;
        match slot.as_ref().map(TrackedBrowser::id) {
            Some(current) if current == id => {
                log::warn!(
                    "Invalidating browser {} after session loss; next acquisition relaunches",
                    id
                );
                *slot = None;
            }
            Some(current) => {
                log::debug!(
                    "Ignoring stale invalidation for browser {} (current is {})",
                    id,
                    current
                );
            }
            None => {
                log::debug!("Ignoring invalidation for browser {} (slot already empty)", id);
            }
        }
    }

    /// Whether a resident browser is currently live in the slot.
    ///
    /// Reported by the health endpoint. Always `false` under the
    /// launch-per-request policy.
    pub async fn browser_ready(&self) -> bool {
        self.inner.slot.lock().await.is_some()
    }

    /// Total browser processes launched over this supervisor's lifetime.
    pub fn launches(&self) -> u64 {
        self.inner.launch_count.load(Ordering::SeqCst)
    }

    /// Reject further acquisitions and close any live browser.
    ///
    /// Called on the process termination signal. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::Release);

        // Bump the epoch so pending expiry tasks become no-ops.
        self.inner.idle_epoch.fetch_add(1, Ordering::SeqCst);

        let mut slot = self.inner.slot.lock().await;
        if let Some(tracked) = slot.take() {
            log::info!(
                "Closing browser {} on shutdown (lived {}s)",
                tracked.id(),
                tracked.age().as_secs()
            );
        } else {
            log::debug!("Shutdown with no live browser");
        }
    }
}

impl std::fmt::Debug for BrowserSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSupervisor")
            .field("policy", &self.inner.policy)
            .field("idle_timeout", &self.inner.idle_timeout)
            .field("launches", &self.launches())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BrowserSupervisorBuilder
// ============================================================================

/// Builder for [`BrowserSupervisor`].
///
/// # Example
///
/// ```rust,ignore
/// let supervisor = BrowserSupervisor::builder()
///     .policy(BrowserPolicy::Pooled)
///     .idle_timeout(Duration::from_secs(300))
///     .factory(Box::new(ChromeBrowserFactory::from_config(&config)))
///     .build()?;
/// ```
pub struct BrowserSupervisorBuilder {
    policy: BrowserPolicy,
    idle_timeout: Duration,
    factory: Option<Box<dyn BrowserFactory>>,
}

impl BrowserSupervisorBuilder {
    /// Create a new builder with defaults (pooled policy, 5-minute idle
    /// window).
    pub fn new() -> Self {
        Self {
            policy: BrowserPolicy::default(),
            idle_timeout: Duration::from_secs(300),
            factory: None,
        }
    }

    /// Set the browser lifecycle policy.
    pub fn policy(mut self, policy: BrowserPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the idle-expiry window for the pooled policy.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the browser factory (required).
    pub fn factory(mut self, factory: Box<dyn BrowserFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the supervisor.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] if no factory was provided.
    pub fn build(self) -> Result<BrowserSupervisor> {
        let factory = self
            .factory
            .ok_or_else(|| RenderError::Validation("No browser factory provided".to_string()))?;

        log::info!(
            "Building browser supervisor (policy: {:?}, idle timeout: {}s)",
            self.policy,
            self.idle_timeout.as_secs()
        );

        Ok(BrowserSupervisor {
            inner: Arc::new(SupervisorInner {
                policy: self.policy,
                idle_timeout: self.idle_timeout,
                factory,
                slot: Mutex::new(None),
                idle_epoch: AtomicU64::new(0),
                shutting_down: AtomicBool::new(false),
                launch_count: AtomicU64::new(0),
            }),
        })
    }
}

impl Default for BrowserSupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
