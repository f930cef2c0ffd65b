//! Integration tests for the browser supervisor.
//!
//! These run without a Chrome installation by using the mock factory, so
//! they exercise the supervisor's bookkeeping: launch failure surfacing,
//! retry-on-next-request, launch exclusivity under concurrency, and
//! shutdown behavior.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reportpdf_service::factory::mock::MockBrowserFactory;
use reportpdf_service::prelude::*;
use tokio::task::JoinSet;

fn supervisor_with(factory: MockBrowserFactory) -> BrowserSupervisor {
    BrowserSupervisor::builder()
        .factory(Box::new(factory))
        .build()
        .unwrap()
}

/// A launch failure surfaces as a Launch error to the acquiring request.
#[tokio::test]
async fn test_launch_failure_surfaces() {
    let supervisor = supervisor_with(MockBrowserFactory::always_fails("Chrome not installed"));

    let result = supervisor.acquire().await;
    match result {
        Err(RenderError::Launch(msg)) => assert!(msg.contains("Chrome not installed")),
        other => panic!("expected Launch error, got {:?}", other.map(|_| ())),
    }
}

/// A launch failure is fatal to that acquisition only: the next request
/// triggers a fresh attempt instead of inheriting a poisoned handle.
#[tokio::test]
async fn test_launch_failure_retried_by_next_request() {
    let factory = MockBrowserFactory::always_fails("Chrome not installed");
    let attempts = factory.counter();
    let supervisor = supervisor_with(factory);

    assert!(supervisor.acquire().await.is_err());
    assert!(supervisor.acquire().await.is_err());

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(!supervisor.browser_ready().await);
}

/// Concurrent cold-start acquisitions never overlap their launch attempts:
/// the slot lock serializes them, so the factory observes at most one
/// in-flight creation at any moment regardless of caller count.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_launch_attempts_never_overlap() {
    let factory =
        MockBrowserFactory::always_fails_with_delay("Chrome not installed", Duration::from_millis(50));
    let max_in_flight = factory.max_in_flight_counter();

    let supervisor = Arc::new(supervisor_with(factory));

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let supervisor = Arc::clone(&supervisor);
        tasks.spawn(async move { supervisor.acquire().await.err() });
    }

    while let Some(result) = tasks.join_next().await {
        let error = result.expect("task should not panic");
        assert!(
            matches!(error, Some(RenderError::Launch(_))),
            "every caller should see the launch failure"
        );
    }

    assert_eq!(
        max_in_flight.load(Ordering::SeqCst),
        1,
        "launch attempts must be serialized by the supervisor"
    );
}

/// Shutdown rejects new acquisitions without consulting the factory.
#[tokio::test]
async fn test_shutdown_rejects_acquisitions() {
    let factory = MockBrowserFactory::always_fails("Chrome not installed");
    let attempts = factory.counter();
    let supervisor = supervisor_with(factory);

    supervisor.shutdown().await;

    let result = supervisor.acquire().await;
    assert!(matches!(result, Err(RenderError::ShuttingDown)));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

/// Invalidation of an id that is not resident leaves the supervisor in a
/// clean state for the next request.
#[tokio::test]
async fn test_stale_invalidation_is_harmless() {
    let factory = MockBrowserFactory::always_fails("Chrome not installed");
    let attempts = factory.counter();
    let supervisor = supervisor_with(factory);

    supervisor.invalidate(7).await;
    supervisor.invalidate(7).await;

    assert!(!supervisor.browser_ready().await);
    assert!(supervisor.acquire().await.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
