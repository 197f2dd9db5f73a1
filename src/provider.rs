//! Wallet provider handle types.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared handle to a detected wallet provider.
pub type ProviderRef = Arc<dyn WalletProvider>;

/// Callback invoked when a subscribed provider event fires.
pub type EventCallback = Box<dyn Fn(&Value) + Send>;

/// Capability interface of a wallet provider injected by the host.
///
/// The detection routine only observes objects implementing this trait; it
/// never mutates them and never takes ownership away from the host. Any
/// object satisfying this narrow interface works, regardless of which wallet
/// produced it.
///
/// # Example
///
/// ```rust
/// use wallet_detect::{EventEmitter, WalletProvider};
///
/// struct MyWallet {
///     events: EventEmitter,
/// }
///
/// impl WalletProvider for MyWallet {
///     fn is_known_wallet(&self) -> bool {
///         true
///     }
///
///     fn events(&self) -> &EventEmitter {
///         &self.events
///     }
/// }
/// ```
pub trait WalletProvider: Send + Sync {
    /// Whether the provider marks itself as the recognized wallet
    /// implementation.
    ///
    /// Detection consults this flag only when
    /// [`DetectOptions::must_be_known_wallet`](crate::DetectOptions) is set;
    /// providers from other wallets are then resolved as absent.
    fn is_known_wallet(&self) -> bool;

    /// Event-subscription surface of the provider.
    fn events(&self) -> &EventEmitter;
}

/// Identifier for a registered event subscription.
///
/// Returned by [`EventEmitter::on`] and [`EventEmitter::once`]; pass it to
/// [`EventEmitter::off`] to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    once: bool,
    callback: EventCallback,
}

/// Minimal event-emitter shape exposed by wallet providers.
///
/// Supports persistent registration ([`on`](Self::on)), one-shot
/// registration ([`once`](Self::once)), removal by id ([`off`](Self::off))
/// and removal of every subscription for an event name
/// ([`remove_all`](Self::remove_all)). Subscriptions are keyed by event name.
///
/// Removing a subscription that was never registered, already fired (for
/// one-shot registrations) or already removed is a no-op, not an error.
///
/// # Example
///
/// ```rust
/// use wallet_detect::EventEmitter;
///
/// let emitter = EventEmitter::new();
/// let id = emitter.on("accountsChanged", Box::new(|accounts| {
///     println!("accounts changed: {accounts}");
/// }));
///
/// emitter.emit("accountsChanged", &serde_json::json!(["0xabc"]));
/// emitter.off("accountsChanged", id);
/// ```
#[derive(Default)]
pub struct EventEmitter {
    inner: Mutex<EmitterState>,
}

#[derive(Default)]
struct EmitterState {
    next_id: u64,
    subscriptions: HashMap<String, Vec<Subscription>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, EmitterState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a persistent callback for `event`.
    pub fn on(&self, event: &str, callback: EventCallback) -> SubscriptionId {
        self.register(event, false, callback)
    }

    /// Register a one-shot callback for `event`.
    ///
    /// The callback is unregistered automatically after its first invocation.
    pub fn once(&self, event: &str, callback: EventCallback) -> SubscriptionId {
        self.register(event, true, callback)
    }

    fn register(&self, event: &str, once: bool, callback: EventCallback) -> SubscriptionId {
        let mut state = self.state();
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state
            .subscriptions
            .entry(event.to_string())
            .or_default()
            .push(Subscription { id, once, callback });
        id
    }

    /// Unregister a single subscription by id. No-op when absent.
    pub fn off(&self, event: &str, id: SubscriptionId) {
        let mut state = self.state();
        if let Some(subscriptions) = state.subscriptions.get_mut(event) {
            subscriptions.retain(|subscription| subscription.id != id);
        }
    }

    /// Unregister every subscription for `event`. No-op when none exist.
    pub fn remove_all(&self, event: &str) {
        let mut state = self.state();
        state.subscriptions.remove(event);
    }

    /// Dispatch `event` with `payload` to every registered callback.
    ///
    /// One-shot subscriptions are consumed by the dispatch. Callbacks run
    /// outside the emitter lock, so they may re-enter the emitter.
    pub fn emit(&self, event: &str, payload: &Value) {
        let fired = {
            let mut state = self.state();
            match state.subscriptions.remove(event) {
                Some(subscriptions) => subscriptions,
                None => return,
            }
        };

        let mut persistent = Vec::new();
        for subscription in fired {
            (subscription.callback)(payload);
            if !subscription.once {
                persistent.push(subscription);
            }
        }

        if !persistent.is_empty() {
            let mut state = self.state();
            let current = state.subscriptions.entry(event.to_string()).or_default();
            // Callbacks may have registered new subscriptions; keep the
            // surviving older ones ahead of them.
            persistent.append(current);
            *current = persistent;
        }
    }

    /// Number of live subscriptions for `event`.
    pub fn subscription_count(&self, event: &str) -> usize {
        let state = self.state();
        state
            .subscriptions
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// A ready-made provider for hosts that simulate wallet injection.
///
/// Embedders (and this crate's tests) use it together with
/// [`InMemoryHost`](crate::InMemoryHost) to stand in for a real
/// browser-injected wallet object.
pub struct InjectedProvider {
    known_wallet: bool,
    events: EventEmitter,
}

impl InjectedProvider {
    /// Create a provider whose known-wallet flag is `known_wallet`.
    pub fn new(known_wallet: bool) -> Self {
        Self {
            known_wallet,
            events: EventEmitter::new(),
        }
    }
}

impl WalletProvider for InjectedProvider {
    fn is_known_wallet(&self) -> bool {
        self.known_wallet
    }

    fn events(&self) -> &EventEmitter {
        &self.events
    }
}
