//! Host environment access.
//!
//! The well-known provider slot is global mutable state owned by the host,
//! not by this crate. Detection reaches it through the narrow
//! [`HostEnvironment`] interface: a read-only accessor for the slot plus
//! one-shot event registration keyed by event name. Anything satisfying that
//! interface can back a detection call, which keeps real environment globals
//! out of tests entirely.

use crate::provider::ProviderRef;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Name of the notification dispatched when a provider lands in the slot.
pub const PROVIDER_INITIALIZED_EVENT: &str = "ethereum#initialized";

/// One-shot listener registered on the host's event surface.
///
/// The host invokes it at most once and unregisters it in the same step.
pub type OnceListener = Box<dyn FnOnce() + Send>;

/// Identifier for a registered host listener.
///
/// Returned by [`HostEnvironment::subscribe_once`]; pass it to
/// [`HostEnvironment::unsubscribe`] to remove the listener by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Narrow interface to the environment hosting the provider slot.
///
/// # Contract
///
/// - [`provider`](Self::provider) reads the current slot value without
///   mutating anything.
/// - [`subscribe_once`](Self::subscribe_once) registers a listener that the
///   host invokes at most once, unregistering it as it fires.
/// - [`unsubscribe`](Self::unsubscribe) with an id that is unknown, already
///   fired or already removed is a no-op, not an error.
pub trait HostEnvironment: Send + Sync {
    /// Current value of the well-known provider slot.
    fn provider(&self) -> Option<ProviderRef>;

    /// Register a one-shot listener for the named notification.
    fn subscribe_once(&self, event: &str, listener: OnceListener) -> ListenerId;

    /// Remove a listener by id.
    fn unsubscribe(&self, event: &str, id: ListenerId);
}

/// In-memory [`HostEnvironment`] simulating provider injection.
///
/// Embedders that are not running inside a real browser environment use this
/// host to drive detection: install a provider up front with
/// [`install`](Self::install), or [`announce`](Self::announce) one later to
/// model a wallet that injects itself after page load. The crate's own tests
/// run against it as well.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use wallet_detect::{HostEnvironment, InjectedProvider, InMemoryHost};
///
/// let host = InMemoryHost::new();
/// assert!(host.provider().is_none());
///
/// host.announce(Arc::new(InjectedProvider::new(false)));
/// assert!(host.provider().is_some());
/// ```
#[derive(Default)]
pub struct InMemoryHost {
    inner: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    provider: Option<ProviderRef>,
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, OnceListener)>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Put a provider into the slot without dispatching any notification.
    ///
    /// Models a wallet that was already injected before detection started.
    pub fn install(&self, provider: ProviderRef) {
        self.state().provider = Some(provider);
    }

    /// Put a provider into the slot and dispatch
    /// [`PROVIDER_INITIALIZED_EVENT`].
    ///
    /// Models a wallet injecting itself while detection is already waiting.
    pub fn announce(&self, provider: ProviderRef) {
        self.install(provider);
        self.dispatch(PROVIDER_INITIALIZED_EVENT);
    }

    /// Invoke and consume every one-shot listener registered for `event`.
    ///
    /// Listeners run outside the host lock.
    pub fn dispatch(&self, event: &str) {
        let fired = self.state().listeners.remove(event);
        if let Some(fired) = fired {
            for (_, listener) in fired {
                listener();
            }
        }
    }

    /// Number of live listeners for `event`.
    ///
    /// Lets tests assert that detection never leaks a registration.
    pub fn listener_count(&self, event: &str) -> usize {
        self.state().listeners.get(event).map(Vec::len).unwrap_or(0)
    }
}

impl HostEnvironment for InMemoryHost {
    fn provider(&self) -> Option<ProviderRef> {
        self.state().provider.clone()
    }

    fn subscribe_once(&self, event: &str, listener: OnceListener) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state
            .listeners
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn unsubscribe(&self, event: &str, id: ListenerId) {
        let mut state = self.state();
        if let Some(listeners) = state.listeners.get_mut(event) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }
}
