//! Tests for the escalation table and the cached browser probe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

/// Probe that succeeds for one browser and counts calls.
struct CountingProbe {
    accepts: Option<BrowserId>,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingProbe {
    fn new(accepts: Option<BrowserId>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            accepts,
            calls: AtomicUsize::new(0),
            delay,
        })
    }
}

impl BrowserProbe for CountingProbe {
    fn probe(&self, browser: BrowserId, _timeout: Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.accepts == Some(browser)
    }
}

fn joined(s: &AuthStrategy) -> String {
    s.args().collect::<Vec<_>>().join(" ")
}

#[test]
fn first_attempt_is_plain() {
    let s = build_strategy(1, Some(BrowserId::Chrome), None);
    assert!(s.cookie_args.is_empty());
    assert!(s.client_args.is_empty());
    assert!(s.network_args.is_empty());
    assert!(s.bot_bypass_args.is_empty());
    assert_eq!(s.description, "Default (no special client)");
    assert_eq!(build_strategy(0, Some(BrowserId::Chrome), None), s);
}

#[test]
fn escalation_table_rows() {
    let b = Some(BrowserId::Firefox);

    for attempt in [2, 3] {
        let s = build_strategy(attempt, b, None);
        assert_eq!(s.cookie_args, ["--cookies-from-browser", "firefox"]);
        assert_eq!(s.client_args, ["--extractor-args", "youtube:player_client=ios"]);
        assert_eq!(s.network_args, ["--force-ipv4"]);
    }
    for attempt in [4, 5] {
        let s = build_strategy(attempt, b, None);
        assert_eq!(s.cookie_args, ["--cookies-from-browser", "firefox"]);
        assert_eq!(s.client_args, ["--extractor-args", "youtube:player_client=tv"]);
        assert_eq!(s.network_args, ["--force-ipv4"]);
    }
    for attempt in [6, 7] {
        let s = build_strategy(attempt, b, None);
        assert!(s.cookie_args.is_empty());
        assert_eq!(s.client_args, ["--extractor-args", "youtube:player_client=tv"]);
        assert_eq!(s.network_args, ["--force-ipv4"]);
        assert_eq!(s.description, "TV client (no cookies) over IPv4");
    }
    for attempt in [8, 9] {
        let s = build_strategy(attempt, b, None);
        assert_eq!(s.cookie_args, ["--cookies-from-browser", "firefox"]);
        assert_eq!(s.client_args, ["--extractor-args", "youtube:player_client=web"]);
        assert!(s.network_args.is_empty());
    }
    for attempt in [10, 11, 50] {
        let s = build_strategy(attempt, b, None);
        assert!(s.cookie_args.is_empty());
        assert_eq!(s.client_args, ["--extractor-args", "youtube:player_client=web"]);
        assert!(s.network_args.is_empty());
    }
}

#[test]
fn without_browser_cookie_rows_fall_through() {
    let expected: [(u32, Option<&str>, bool, &str); 10] = [
        (1, None, false, "Default (no special client)"),
        (2, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (3, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (4, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (5, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (6, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (7, Some("tv"), true, "TV client (no cookies) over IPv4"),
        (8, Some("web"), false, "Web client (no cookies)"),
        (9, Some("web"), false, "Web client (no cookies)"),
        (10, Some("web"), false, "Web client (no cookies)"),
    ];
    for (attempt, client, ipv4, description) in expected {
        let s = build_strategy(attempt, None, None);
        assert!(s.cookie_args.is_empty(), "attempt {attempt}");
        match client {
            Some(c) => assert_eq!(
                s.client_args,
                ["--extractor-args".to_string(), format!("youtube:player_client={c}")],
                "attempt {attempt}"
            ),
            None => assert!(s.client_args.is_empty()),
        }
        assert_eq!(s.network_args.is_empty(), !ipv4, "attempt {attempt}");
        assert_eq!(s.description, description, "attempt {attempt}");
    }
}

#[test]
fn resilience_args_on_every_attempt() {
    for attempt in 1..=12 {
        let s = build_strategy(attempt, None, None);
        assert_eq!(
            s.retry_args,
            [
                "--retries",
                "3",
                "--fragment-retries",
                "5",
                "--extractor-retries",
                "3"
            ]
        );
    }
}

#[test]
fn token_appended_to_every_attempt() {
    for attempt in 1..=12 {
        let s = build_strategy(attempt, Some(BrowserId::Edge), Some("abc123"));
        assert_eq!(
            s.bot_bypass_args,
            ["--extractor-args", "youtube:po_token=abc123"]
        );
        assert!(s.description.ends_with(" + PO token"), "{}", s.description);
    }
}

#[test]
fn build_args_is_pure_over_attempts() {
    let provider = AuthStrategyProvider::new(CountingProbe::new(None, Duration::ZERO));
    provider.set_bot_bypass_token("tok");
    for attempt in 1..=12 {
        let a = provider.build_args(attempt);
        let b = provider.build_args(attempt);
        assert_eq!(a, b);
        assert_eq!(joined(&a), joined(&b));
    }
    assert_eq!(provider.probe_runs(), 0);
}

#[tokio::test]
async fn setting_token_keeps_browser_cache() {
    let probe = CountingProbe::new(Some(BrowserId::Brave), Duration::ZERO);
    let provider = AuthStrategyProvider::new(probe.clone());
    assert_eq!(provider.detect_browser(false).await, Some(BrowserId::Brave));
    provider.set_bot_bypass_token("t");
    assert_eq!(provider.cached_browser(), Some(BrowserId::Brave));
    let s = provider.build_args(2);
    assert_eq!(s.cookie_args, ["--cookies-from-browser", "brave"]);
    assert_eq!(
        s.description,
        "Browser cookies (brave) + iOS client over IPv4 + PO token"
    );
    provider.clear_bot_bypass_token();
    assert!(provider.build_args(2).bot_bypass_args.is_empty());
}

#[tokio::test]
async fn detection_follows_priority_order() {
    let probe = CountingProbe::new(Some(BrowserId::Brave), Duration::ZERO);
    let provider = AuthStrategyProvider::new(probe.clone());
    assert_eq!(provider.detect_browser(false).await, Some(BrowserId::Brave));
    // chrome, edge, brave
    assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    assert!(provider.user_message().contains("Brave"));
}

#[tokio::test]
async fn none_found_is_cached_too() {
    let probe = CountingProbe::new(None, Duration::ZERO);
    let provider = AuthStrategyProvider::new(probe.clone());
    assert_eq!(provider.detect_browser(false).await, None);
    assert_eq!(provider.detect_browser(false).await, None);
    assert_eq!(provider.probe_runs(), 1);
    assert_eq!(probe.calls.load(Ordering::SeqCst), BrowserId::PRIORITY.len());
    assert!(provider.user_message().starts_with("No browser cookies found"));
}

#[tokio::test]
async fn force_refresh_reprobes() {
    let probe = CountingProbe::new(Some(BrowserId::Chrome), Duration::ZERO);
    let provider = AuthStrategyProvider::new(probe.clone());
    provider.detect_browser(false).await;
    provider.detect_browser(true).await;
    assert_eq!(provider.probe_runs(), 2);
}

#[tokio::test]
async fn expired_cache_reprobes() {
    let probe = CountingProbe::new(Some(BrowserId::Chrome), Duration::ZERO);
    let provider =
        AuthStrategyProvider::new(probe.clone()).with_validity(Duration::from_millis(20));
    provider.detect_browser(false).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    provider.detect_browser(false).await;
    assert_eq!(provider.probe_runs(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_detection_probes_once() {
    let probe = CountingProbe::new(Some(BrowserId::Chrome), Duration::from_millis(150));
    let provider = Arc::new(AuthStrategyProvider::new(probe.clone()));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let p = Arc::clone(&provider);
        handles.push(tokio::spawn(async move { p.detect_browser(false).await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), Some(BrowserId::Chrome));
    }
    assert_eq!(provider.probe_runs(), 1);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn build_args_never_probes() {
    let probe = CountingProbe::new(Some(BrowserId::Chrome), Duration::ZERO);
    let provider = AuthStrategyProvider::new(probe.clone());
    let s = provider.build_args(2);
    assert!(s.cookie_args.is_empty());
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
}
