//! Detection options configuration.
//!
//! This module provides the [`DetectOptions`] struct for configuring
//! provider detection, plus a validating constructor for configuration that
//! arrives as untyped JSON.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// How long detection waits for a provider by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Configuration options for provider detection.
///
/// # Default Behavior
///
/// By default any provider in the slot is accepted
/// (`must_be_known_wallet: false`), missed detections are logged
/// (`silent: false`) and detection waits up to 3 seconds. Three seconds
/// covers wallets that inject their provider shortly after page load; raise
/// it for hosts known to inject late.
///
/// # Example
///
/// ```rust
/// use wallet_detect::DetectOptions;
/// use std::time::Duration;
///
/// // Accept any provider, wait up to 3 seconds
/// let opts = DetectOptions::default();
///
/// // Only accept the recognized wallet, and don't log on failure
/// let opts = DetectOptions {
///     must_be_known_wallet: true,
///     silent: true,
///     ..Default::default()
/// };
///
/// // Give up quickly
/// let opts = DetectOptions {
///     timeout: Duration::from_millis(500),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Only resolve with providers carrying the known-wallet flag.
    ///
    /// When set, a provider from any other wallet is treated the same as no
    /// provider at all (with its own diagnostic message).
    ///
    /// Default: `false`
    pub must_be_known_wallet: bool,

    /// Suppress the diagnostic emitted when no acceptable provider is found.
    ///
    /// Default: `false`
    pub silent: bool,

    /// Maximum time to wait for the provider to appear.
    ///
    /// The wait ends early if the host dispatches its initialized
    /// notification. A zero timeout resolves on the next scheduler turn,
    /// so it means "resolve immediately if absent".
    ///
    /// Default: 3 seconds
    pub timeout: Duration,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            must_be_known_wallet: false,
            silent: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Errors raised while validating untyped detection options.
///
/// These are raised synchronously by [`DetectOptions::from_value`], before
/// any asynchronous work starts. Detection itself never fails; this
/// validation tier is the only fallible surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionsError {
    /// A supplied option has the wrong type.
    #[error("invalid option: expected `{field}` to be {expected}")]
    InvalidOption {
        /// Name of the offending field.
        field: &'static str,
        /// The type the field must have.
        expected: &'static str,
    },
}

impl DetectOptions {
    /// Build options from untyped JSON, validating field types.
    ///
    /// Recognized fields are `mustBeKnownWallet` (boolean), `silent`
    /// (boolean) and `timeout` (number of milliseconds). Missing fields take
    /// their defaults; unrecognized fields are ignored; `null` yields the
    /// defaults. Only types are validated, not ranges: a negative or
    /// non-finite `timeout` clamps to zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use wallet_detect::{DetectOptions, OptionsError};
    /// use serde_json::json;
    ///
    /// let opts = DetectOptions::from_value(&json!({
    ///     "mustBeKnownWallet": true,
    ///     "timeout": 500,
    /// }))
    /// .unwrap();
    /// assert!(opts.must_be_known_wallet);
    ///
    /// let err = DetectOptions::from_value(&json!({ "silent": "yes" })).unwrap_err();
    /// assert!(matches!(err, OptionsError::InvalidOption { field: "silent", .. }));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, OptionsError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => {
                return Err(OptionsError::InvalidOption {
                    field: "options",
                    expected: "an object",
                })
            }
        };

        let mut options = Self::default();

        match map.get("mustBeKnownWallet") {
            None => {}
            Some(Value::Bool(flag)) => options.must_be_known_wallet = *flag,
            Some(_) => {
                return Err(OptionsError::InvalidOption {
                    field: "mustBeKnownWallet",
                    expected: "a boolean",
                })
            }
        }

        match map.get("silent") {
            None => {}
            Some(Value::Bool(flag)) => options.silent = *flag,
            Some(_) => {
                return Err(OptionsError::InvalidOption {
                    field: "silent",
                    expected: "a boolean",
                })
            }
        }

        match map.get("timeout") {
            None => {}
            Some(value) if value.is_number() => {
                let millis = value.as_f64().unwrap_or(0.0);
                options.timeout = if millis.is_finite() && millis > 0.0 {
                    Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
                } else {
                    Duration::ZERO
                };
            }
            Some(_) => {
                return Err(OptionsError::InvalidOption {
                    field: "timeout",
                    expected: "a number",
                })
            }
        }

        Ok(options)
    }
}
