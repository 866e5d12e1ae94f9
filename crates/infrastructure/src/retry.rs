//! Capped retries with a cooldown window
//!
//! One retry discipline for every outbound service call: up to
//! `max_attempts` attempts with a fixed delay between them; when the last
//! attempt fails the gate enters a cooldown window during which calls fail
//! immediately, and attempts resume once it expires. A simple circuit
//! breaker, not exponential backoff - both the geocoding and routing
//! adapters go through it.
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryGate, RetryPolicy};
//!
//! let gate = RetryGate::new("geocoding", RetryPolicy::default());
//! let result = gate.call(|| async {
//!     backend.lookup(address).await
//! }).await;
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per call before giving up (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds (default: 1000)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cooldown window after exhausting attempts, in seconds (default: 30)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_cooldown_secs() -> u64 {
    30
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom parameters
    #[must_use]
    pub const fn new(max_attempts: u32, retry_delay_ms: u64, cooldown_secs: u64) -> Self {
        Self {
            max_attempts,
            retry_delay_ms,
            cooldown_secs,
        }
    }

    /// Create a policy suitable for tests (no delays, short cooldown)
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 0,
            cooldown_secs: 1,
        }
    }
}

/// Trait for errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for integration_geocoding::GeocodingError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl Retryable for integration_routing::RoutingError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Outcome of a gated call
#[derive(Debug)]
pub enum GateError<E> {
    /// The operation failed on its last permitted attempt (or with a
    /// non-retryable error)
    Failed(E),
    /// The gate is cooling down; the operation was not attempted
    CoolingDown {
        /// Time until the cooldown window expires
        retry_in: Duration,
    },
}

impl<E: std::fmt::Display> std::fmt::Display for GateError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "{err}"),
            Self::CoolingDown { retry_in } => {
                write!(f, "cooling down for another {}s", retry_in.as_secs())
            },
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    cooldown_until: Option<Instant>,
}

/// A named retry gate guarding one external service
#[derive(Debug)]
pub struct RetryGate {
    name: &'static str,
    policy: RetryPolicy,
    state: Mutex<GateState>,
}

impl RetryGate {
    /// Create a gate for the named service
    #[must_use]
    pub fn new(name: &'static str, policy: RetryPolicy) -> Self {
        Self {
            name,
            policy,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Service name this gate guards
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Remaining cooldown, if the gate is cooling down
    #[must_use]
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.cooldown_until.and_then(|until| {
            let now = Instant::now();
            if until > now { Some(until - now) } else { None }
        })
    }

    /// Execute an operation through the gate
    ///
    /// Non-retryable errors fail immediately without consuming further
    /// attempts and without opening the cooldown window.
    pub async fn call<F, Fut, T, E>(&self, mut operation: F) -> Result<T, GateError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        if let Some(retry_in) = self.cooldown_remaining() {
            debug!(gate = self.name, retry_in_secs = retry_in.as_secs(), "Gate cooling down");
            return Err(GateError::CoolingDown { retry_in });
        }

        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(gate = self.name, attempt, "Operation succeeded after retries");
                    }
                    return Ok(value);
                },
                Err(err) if !err.is_retryable() => {
                    debug!(gate = self.name, error = %err, "Non-retryable failure");
                    return Err(GateError::Failed(err));
                },
                Err(err) if attempt == attempts => {
                    warn!(
                        gate = self.name,
                        attempts,
                        cooldown_secs = self.policy.cooldown_secs,
                        error = %err,
                        "Attempts exhausted, entering cooldown"
                    );
                    self.state.lock().cooldown_until =
                        Some(Instant::now() + Duration::from_secs(self.policy.cooldown_secs));
                    return Err(GateError::Failed(err));
                },
                Err(err) => {
                    debug!(gate = self.name, attempt, error = %err, "Attempt failed, retrying");
                    tokio::time::sleep(Duration::from_millis(self.policy.retry_delay_ms)).await;
                },
            }
        }
        unreachable!("loop always returns")
    }
}
