//! Element lookups either succeed before the deadline or give up with
//! exactly one error event.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use acceptor::locators;
use acceptor::mock::FakeStore;
use acceptor::{BrowserDriver, Interactor, Timeouts};
use tokio::time::Instant;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

const STORE: &str = "https://www.saucedemo.com/";

/// Counts ERROR events
#[derive(Debug, Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn interactor(render_delay: Duration) -> Interactor {
    let store = FakeStore::new(STORE).with_render_delay(render_delay);
    store.navigate(STORE).await.unwrap();
    let driver: Arc<dyn BrowserDriver> = Arc::new(store);
    Interactor::new(
        driver,
        Timeouts::uniform(Duration::from_secs(1), Duration::from_millis(100)),
        "login",
    )
}

#[tokio::test(start_paused = true)]
async fn test_element_before_deadline_is_found_without_errors() {
    let counter = ErrorCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

    let ui = interactor(Duration::from_millis(450)).await;
    let start = Instant::now();
    let found = ui.find(&locators::LOGIN_BUTTON, Duration::from_secs(1)).await;

    assert!(found.is_some());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(450));
    assert!(elapsed < Duration::from_millis(600));
    assert_eq!(counter.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_element_after_deadline_logs_exactly_one_error() {
    let counter = ErrorCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

    let ui = interactor(Duration::from_secs(3)).await;
    let start = Instant::now();
    let found = ui.find(&locators::LOGIN_BUTTON, Duration::from_secs(1)).await;

    assert!(found.is_none());
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(counter.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_click_logs_once() {
    let counter = ErrorCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

    let ui = interactor(Duration::ZERO).await;
    assert!(!ui.click(&locators::FINISH_BUTTON, Duration::from_millis(500)).await);
    assert_eq!(counter.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_absence_checks_at_deadline() {
    let counter = ErrorCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

    let ui = interactor(Duration::from_secs(1)).await;
    assert!(!ui.is_present(&locators::LOGIN_BUTTON, Duration::from_secs(1)).await);
    assert!(ui.is_present(&locators::LOGIN_BUTTON, Duration::from_secs(1)).await);
    assert_eq!(counter.count(), 1);
}
