//! # wallet-detect
//!
//! Detection of browser-injected wallet providers at a well-known host slot.
//!
//! A wallet extension injects its provider object into the host environment
//! at some point around page load. This crate provides the small
//! race-and-timeout routine that waits for that injection: resolve with the
//! provider as soon as it is present (or announced via the host's
//! `ethereum#initialized` notification), or with `None` once a timeout
//! expires. That is the whole job; there is no signing, no RPC and no wallet
//! implementation here.
//!
//! ## Features
//!
//! - [`detect()`] / [`detect_with_options()`] async functions resolving with
//!   `Option<ProviderRef>` and never failing
//! - [`DetectOptions`] with a validating [`DetectOptions::from_value`]
//!   constructor for configuration arriving as untyped JSON
//! - [`HostEnvironment`] trait isolating the global provider slot behind a
//!   narrow interface, with [`InMemoryHost`] for tests and simulations
//! - [`WalletProvider`] capability trait and the minimal [`EventEmitter`]
//!   shape providers expose
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wallet_detect::{detect, InjectedProvider, InMemoryHost, WalletProvider};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let host = InMemoryHost::new();
//!
//!     // A wallet (here simulated) injects its provider into the host.
//!     host.announce(Arc::new(InjectedProvider::new(true)));
//!
//!     match detect(&host).await {
//!         Some(provider) => println!("provider found, known wallet: {}", provider.is_known_wallet()),
//!         None => println!("no provider detected"),
//!     }
//! }
//! ```

mod detect;
mod host;
mod options;
mod provider;

pub use detect::{detect, detect_with_options};
pub use host::{
    HostEnvironment, InMemoryHost, ListenerId, OnceListener, PROVIDER_INITIALIZED_EVENT,
};
pub use options::{DetectOptions, OptionsError, DEFAULT_TIMEOUT};
pub use provider::{
    EventCallback, EventEmitter, InjectedProvider, ProviderRef, SubscriptionId, WalletProvider,
};
