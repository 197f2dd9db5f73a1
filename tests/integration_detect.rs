//! Integration tests for provider detection.
//!
//! These tests drive the public API against an in-memory host, using the
//! paused tokio clock so timing-sensitive properties are deterministic.

use futures::future::join_all;
use serde_json::json;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallet_detect::{
    detect, detect_with_options, DetectOptions, InjectedProvider, InMemoryHost, OptionsError,
    WalletProvider, DEFAULT_TIMEOUT, PROVIDER_INITIALIZED_EVENT,
};

/// Records the message of every WARN event on the current thread.
#[derive(Clone, Default)]
struct WarningRecorder {
    messages: Arc<Mutex<Vec<String>>>,
}

impl WarningRecorder {
    fn warnings(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        }
    }
}

impl tracing::Subscriber for WarningRecorder {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
    }

    fn record(&self, _span: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.messages.lock().unwrap().push(message);
        }
    }

    fn enter(&self, _span: &tracing::span::Id) {}

    fn exit(&self, _span: &tracing::span::Id) {}
}

async fn wait_for_listener(host: &InMemoryHost) {
    while host.listener_count(PROVIDER_INITIALIZED_EVENT) == 0 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_invalid_options_fail_before_any_async_work() {
    // Wrong-typed fields fail synchronously; no future is ever constructed.
    let cases = [
        (json!({ "mustBeKnownWallet": "yes" }), "mustBeKnownWallet"),
        (json!({ "silent": 0 }), "silent"),
        (json!({ "timeout": "3000" }), "timeout"),
    ];

    for (value, expected_field) in cases {
        let err = DetectOptions::from_value(&value).unwrap_err();
        match err {
            OptionsError::InvalidOption { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_preinstalled_provider_resolves_without_timer_wait() {
    let host = InMemoryHost::new();
    host.install(Arc::new(InjectedProvider::new(false)));

    let started = tokio::time::Instant::now();
    let provider = detect(&host).await;

    assert!(provider.is_some());
    // The paused clock only advances while sleeping, so any timer wait
    // would be visible here.
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_absent_provider_resolves_none_no_earlier_than_timeout() {
    let host = InMemoryHost::new();
    let options = DetectOptions {
        silent: true,
        timeout: Duration::from_millis(750),
        ..Default::default()
    };

    let started = tokio::time::Instant::now();
    let provider = detect_with_options(&host, options).await;

    assert!(provider.is_none());
    assert!(started.elapsed() >= Duration::from_millis(750));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_late_announcement_resolves_before_timeout() {
    let recorder = WarningRecorder::default();
    let _guard = tracing::subscriber::set_default(recorder.clone());

    let host = Arc::new(InMemoryHost::new());
    let started = tokio::time::Instant::now();

    let detecting = host.clone();
    let detection = tokio::spawn(async move { detect(&*detecting).await });

    wait_for_listener(&host).await;
    host.announce(Arc::new(InjectedProvider::new(true)));

    let provider = detection.await.expect("detection task panicked");
    assert!(provider.is_some());
    // Resolved on announcement, long before the 3s default timeout.
    assert!(started.elapsed() < DEFAULT_TIMEOUT);

    // The pending timer's later expiry must be absorbed: no second
    // resolution path, no diagnostic, no leftover listener.
    tokio::time::sleep(DEFAULT_TIMEOUT * 2).await;
    assert!(recorder.warnings().is_empty());
    assert_eq!(host.listener_count(PROVIDER_INITIALIZED_EVENT), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_timeout_then_late_notification_is_absorbed() {
    let recorder = WarningRecorder::default();
    let _guard = tracing::subscriber::set_default(recorder.clone());

    let host = InMemoryHost::new();
    let options = DetectOptions {
        timeout: Duration::from_millis(100),
        ..Default::default()
    };

    assert!(detect_with_options(&host, options).await.is_none());
    assert_eq!(recorder.warnings().len(), 1);

    // The notification arriving after the timer already decided the race
    // finds no listener and changes nothing.
    host.announce(Arc::new(InjectedProvider::new(true)));
    assert_eq!(recorder.warnings().len(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_silent_failing_detection_emits_nothing() {
    let recorder = WarningRecorder::default();
    let _guard = tracing::subscriber::set_default(recorder.clone());

    let host = InMemoryHost::new();
    host.install(Arc::new(InjectedProvider::new(false)));
    let options = DetectOptions {
        must_be_known_wallet: true,
        silent: true,
        timeout: Duration::from_millis(100),
    };

    assert!(detect_with_options(&host, options).await.is_none());
    assert!(recorder.warnings().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_concurrent_detections_are_independent() {
    let host = Arc::new(InMemoryHost::new());

    let calls: Vec<_> = (0..4)
        .map(|index| {
            let host = host.clone();
            tokio::spawn(async move {
                let options = DetectOptions {
                    // Half the calls insist on the known wallet.
                    must_be_known_wallet: index % 2 == 0,
                    silent: true,
                    ..Default::default()
                };
                detect_with_options(&*host, options).await
            })
        })
        .collect();

    // Every call registers its own listener.
    while host.listener_count(PROVIDER_INITIALIZED_EVENT) < 4 {
        tokio::task::yield_now().await;
    }

    host.announce(Arc::new(InjectedProvider::new(true)));

    for result in join_all(calls).await {
        let provider = result.expect("detection task panicked");
        assert!(provider.is_some_and(|p| p.is_known_wallet()));
    }
    assert_eq!(host.listener_count(PROVIDER_INITIALIZED_EVENT), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_mixed_outcomes_share_one_host() {
    let host = Arc::new(InMemoryHost::new());
    host.install(Arc::new(InjectedProvider::new(false)));

    let strict_host = host.clone();
    let strict = tokio::spawn(async move {
        let options = DetectOptions {
            must_be_known_wallet: true,
            silent: true,
            ..Default::default()
        };
        detect_with_options(&*strict_host, options).await
    });
    let lenient_host = host.clone();
    let lenient = tokio::spawn(async move {
        let options = DetectOptions {
            silent: true,
            ..Default::default()
        };
        detect_with_options(&*lenient_host, options).await
    });

    // The unflagged provider satisfies one call and fails the other; the
    // outcomes must not leak into each other.
    assert!(strict.await.expect("strict task panicked").is_none());
    assert!(lenient.await.expect("lenient task panicked").is_some());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_options_from_json_drive_detection() {
    let host = InMemoryHost::new();
    host.install(Arc::new(InjectedProvider::new(true)));

    let options = DetectOptions::from_value(&json!({
        "mustBeKnownWallet": true,
        "silent": true,
        "timeout": 100,
    }))
    .expect("options should validate");

    let provider = detect_with_options(&host, options).await;
    assert!(provider.is_some_and(|p| p.is_known_wallet()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_detection_never_leaks_listeners() {
    let host = Arc::new(InMemoryHost::new());

    // Timed-out call.
    let options = DetectOptions {
        silent: true,
        timeout: Duration::from_millis(10),
        ..Default::default()
    };
    assert!(detect_with_options(&*host, options).await.is_none());
    assert_eq!(host.listener_count(PROVIDER_INITIALIZED_EVENT), 0);

    // Notified call.
    let detecting = host.clone();
    let detection = tokio::spawn(async move { detect(&*detecting).await });
    wait_for_listener(&host).await;
    host.announce(Arc::new(InjectedProvider::new(false)));
    assert!(detection.await.expect("detection task panicked").is_some());
    assert_eq!(host.listener_count(PROVIDER_INITIALIZED_EVENT), 0);
}
