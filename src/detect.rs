//! Provider detection.

use crate::host::{HostEnvironment, PROVIDER_INITIALIZED_EVENT};
use crate::options::DetectOptions;
use crate::provider::ProviderRef;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Identifier prefixing every diagnostic line this crate emits.
pub(crate) const LOG_PREFIX: &str = "wallet-detect";

pub(crate) const MSG_NON_MATCHING: &str = "non-matching wallet provider detected";
pub(crate) const MSG_UNABLE_TO_DETECT: &str = "unable to detect a wallet provider";

/// Detect the host's wallet provider with default options.
///
/// Shorthand for [`detect_with_options`] with [`DetectOptions::default`]:
/// accept any provider, log on failure, wait up to 3 seconds.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use wallet_detect::{detect, InjectedProvider, InMemoryHost, WalletProvider};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let host = InMemoryHost::new();
///     host.install(Arc::new(InjectedProvider::new(true)));
///
///     match detect(&host).await {
///         Some(provider) => println!("known wallet: {}", provider.is_known_wallet()),
///         None => println!("no provider detected"),
///     }
/// }
/// ```
pub async fn detect(host: &dyn HostEnvironment) -> Option<ProviderRef> {
    detect_with_options(host, DetectOptions::default()).await
}

/// Detect the host's wallet provider.
///
/// Resolves with the provider in the host's well-known slot, or with `None`
/// once `options.timeout` elapses without an acceptable provider appearing.
/// The returned future always resolves; every miss is expressed as `None`
/// plus (unless `options.silent`) one diagnostic line.
///
/// # Detection Process
///
/// 1. If the slot is already populated, decide immediately with no wait.
/// 2. Otherwise register a one-shot listener for the host's
///    `ethereum#initialized` notification and race it against the timeout.
/// 3. Whichever fires first, remove the listener, re-read the slot (the
///    provider may have appeared or disappeared in the meantime) and decide:
///    a provider passing the known-wallet check resolves as `Some`, anything
///    else as `None`.
///
/// A late loser of the race is absorbed: the notification firing after the
/// timer (or the timer after the notification) triggers no second decision,
/// no extra diagnostic and no error. Each call owns its listener and timer,
/// so concurrent calls against one host are independent. There is no way to
/// cancel a call once made; it always runs to resolution.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use wallet_detect::{detect_with_options, DetectOptions, InMemoryHost};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let host = InMemoryHost::new();
///     let options = DetectOptions {
///         must_be_known_wallet: true,
///         silent: true,
///         timeout: Duration::from_millis(100),
///     };
///
///     // Nothing injects a provider, so this resolves None after 100ms.
///     assert!(detect_with_options(&host, options).await.is_none());
/// }
/// ```
pub async fn detect_with_options(
    host: &dyn HostEnvironment,
    options: DetectOptions,
) -> Option<ProviderRef> {
    if host.provider().is_some() {
        debug!("provider already present at call time");
        return finalize(host, &options);
    }

    let (notify, notified) = oneshot::channel::<()>();
    let listener = host.subscribe_once(
        PROVIDER_INITIALIZED_EVENT,
        Box::new(move || {
            // A send after the race has been decided lands in a dropped
            // receiver, which is the no-op we want.
            let _ = notify.send(());
        }),
    );

    tokio::select! {
        _ = notified => {
            debug!("initialized notification received");
        }
        _ = tokio::time::sleep(options.timeout) => {
            debug!(timeout_ms = options.timeout.as_millis() as u64, "detection timer expired");
        }
    }

    // Safe even though a fired one-shot listener is already gone.
    host.unsubscribe(PROVIDER_INITIALIZED_EVENT, listener);
    finalize(host, &options)
}

/// Re-read the slot and decide the outcome.
///
/// The slot is read fresh here rather than trusting the trigger: the
/// provider may have appeared between the triggers, and a notification does
/// not by itself prove the slot is populated.
fn finalize(host: &dyn HostEnvironment, options: &DetectOptions) -> Option<ProviderRef> {
    match host.provider() {
        Some(provider) if !options.must_be_known_wallet || provider.is_known_wallet() => {
            Some(provider)
        }
        Some(_) => {
            if !options.silent {
                warn!("{LOG_PREFIX}: {MSG_NON_MATCHING}");
            }
            None
        }
        None => {
            if !options.silent {
                warn!("{LOG_PREFIX}: {MSG_UNABLE_TO_DETECT}");
            }
            None
        }
    }
}
