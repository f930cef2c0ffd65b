//! Mock browser factory for testing.
//!
//! Provides a [`BrowserFactory`] implementation that fails on demand, so
//! supervisor behavior (launch failure, retry, launch exclusivity,
//! shutdown) can be tested without a Chrome installation.
//!
//! # Feature Flag
//!
//! Available when the `test-utils` feature is enabled, or during testing
//! (`#[cfg(test)]`).
//!
//! # Example
//!
//! ```rust,ignore
//! use reportpdf_service::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::always_fails("Chrome not installed");
//! let launches = factory.counter();
//! // move factory into a supervisor, then assert on `launches`
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use headless_chrome::Browser;

use super::BrowserFactory;
use crate::error::{RenderError, Result};

/// Mock browser factory for testing without Chrome.
///
/// Tracks every creation attempt and — because the supervisor promises
/// that launches never overlap — also records the highest number of
/// simultaneously in-flight `create()` calls it ever observed.
///
/// # Thread Safety
///
/// `Send + Sync`; all bookkeeping uses atomics.
pub struct MockBrowserFactory {
    /// Whether to fail on creation.
    should_fail: bool,

    /// Error message returned when failing.
    error_message: String,

    /// Artificial delay inside `create()`, used to widen the window in
    /// which overlapping launches would be observable.
    delay: Option<Duration>,

    /// Total creation attempts.
    creation_count: Arc<AtomicUsize>,

    /// Creations currently in flight.
    in_flight: Arc<AtomicUsize>,

    /// High-water mark of simultaneous creations.
    max_in_flight: Arc<AtomicUsize>,
}

impl MockBrowserFactory {
    /// Create a mock factory that attempts real browser creation.
    ///
    /// Still requires Chrome to be installed to actually succeed. For pure
    /// mocking use [`always_fails`](Self::always_fails).
    pub fn new() -> Self {
        Self {
            should_fail: false,
            error_message: String::new(),
            delay: None,
            creation_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock factory that always fails with the given message.
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self {
            should_fail: true,
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// Like [`always_fails`](Self::always_fails), but each attempt blocks
    /// for `delay` first.
    ///
    /// With a supervisor in front, concurrent acquisitions during the
    /// delay must coalesce rather than stack up — verify with
    /// [`max_in_flight`](Self::max_in_flight).
    pub fn always_fails_with_delay<S: Into<String>>(message: S, delay: Duration) -> Self {
        Self {
            should_fail: true,
            error_message: message.into(),
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Total creation attempts so far.
    pub fn creation_count(&self) -> usize {
        self.creation_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the attempt counter, usable after the factory has
    /// been moved into a supervisor.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.creation_count)
    }

    /// Highest number of simultaneously in-flight creations observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Shared handle to the in-flight high-water mark.
    pub fn max_in_flight_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }
}

impl Default for MockBrowserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserFactory for MockBrowserFactory {
    /// Create a browser or return the configured mock error.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] when configured to fail.
    fn create(&self) -> Result<Browser> {
        self.creation_count.fetch_add(1, Ordering::SeqCst);

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let result = self.create_inner();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockBrowserFactory {
    fn create_inner(&self) -> Result<Browser> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.should_fail {
            log::debug!("MockBrowserFactory: returning configured failure");
            return Err(RenderError::Launch(self.error_message.clone()));
        }

        log::debug!("MockBrowserFactory: attempting real browser creation");

        use super::chrome::create_launch_options;
        use crate::config::DeploymentMode;

        let options =
            create_launch_options(DeploymentMode::Local, None, Duration::from_secs(360))
                .map_err(|e| RenderError::Launch(e.to_string()))?;

        Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))
    }
}

impl std::fmt::Debug for MockBrowserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowserFactory")
            .field("should_fail", &self.should_fail)
            .field("error_message", &self.error_message)
            .field("creation_count", &self.creation_count.load(Ordering::SeqCst))
            .field("max_in_flight", &self.max_in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// always_fails returns the configured launch error.
    #[test]
    fn test_mock_factory_always_fails() {
        let factory = MockBrowserFactory::always_fails("Test error");

        let result = factory.create();
        match result {
            Err(RenderError::Launch(msg)) => assert_eq!(msg, "Test error"),
            other => panic!("expected Launch error, got {:?}", other.map(|_| ())),
        }
    }

    /// Attempts are counted per call.
    #[test]
    fn test_mock_factory_creation_count() {
        let factory = MockBrowserFactory::always_fails("Test");

        assert_eq!(factory.creation_count(), 0);
        let _ = factory.create();
        let _ = factory.create();
        assert_eq!(factory.creation_count(), 2);
    }

    /// The counter handle survives moving the factory.
    #[test]
    fn test_mock_factory_counter_handle() {
        let factory = MockBrowserFactory::always_fails("Test");
        let counter = factory.counter();

        let boxed: Box<dyn BrowserFactory> = Box::new(factory);
        let _ = boxed.create();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    /// Sequential creations never overlap, so the high-water mark is 1.
    #[test]
    fn test_mock_factory_in_flight_tracking() {
        let factory = MockBrowserFactory::always_fails("Test");

        let _ = factory.create();
        let _ = factory.create();

        assert_eq!(factory.max_in_flight(), 1);
    }

    /// The configured delay actually blocks the caller.
    #[test]
    fn test_mock_factory_delay() {
        let factory =
            MockBrowserFactory::always_fails_with_delay("Test", Duration::from_millis(30));

        let start = std::time::Instant::now();
        let _ = factory.create();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
