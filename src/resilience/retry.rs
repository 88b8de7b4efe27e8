//! Retry classification and exponential backoff.

use std::time::Duration;

use crate::errors::{classify_status, classify_transport, MarketplaceError};
use crate::transport::{HttpResponse, TransportError};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Delay multiplier for exponential backoff.
    pub multiplier: f64,
    /// Whether to add 0-25% random jitter.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub fn multiplier(mut self, mult: f64) -> Self {
        self.multiplier = mult;
        self
    }

    /// Sets whether to use jitter.
    #[must_use]
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Outcome of one failed attempt, before classification.
#[derive(Debug, Clone)]
pub enum AttemptFailure {
    /// Nothing usable came back.
    Transport(TransportError),
    /// Upstream answered with a non-2xx status.
    Status(HttpResponse),
}

impl AttemptFailure {
    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            AttemptFailure::Transport(_) => None,
            AttemptFailure::Status(response) => Some(response.status),
        }
    }

    /// Classifies the failure into the error taxonomy.
    pub fn into_error(self) -> MarketplaceError {
        match self {
            AttemptFailure::Transport(error) => classify_transport(&error),
            AttemptFailure::Status(response) => {
                classify_status(response.status, &response.headers, &response.body)
            }
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Transport(error) => write!(f, "{error}"),
            AttemptFailure::Status(response) => write!(f, "HTTP {}", response.status),
        }
    }
}

/// Retry policy with exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Decides whether a failed attempt is worth repeating.
    ///
    /// Retries when no response was received (connection failure, abort,
    /// timeout) or upstream answered 5xx. Client errors, 429 included, are
    /// terminal, and so is a request that could not even be built.
    pub fn is_retryable(failure: &AttemptFailure) -> bool {
        match failure {
            AttemptFailure::Transport(TransportError::Request { .. }) => false,
            AttemptFailure::Transport(_) => true,
            AttemptFailure::Status(response) => (500..600).contains(&response.status),
        }
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    ///
    /// With the defaults this is 1s, 2s, 4s, ... capped at `max_delay`.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_ms = self.config.initial_delay.as_secs_f64() * 1000.0
            * self.config.multiplier.powi(exponent);
        let capped = delay_ms.min(self.config.max_delay.as_secs_f64() * 1000.0);
        Duration::from_secs_f64(capped.max(0.0) / 1000.0)
    }

    /// Backoff before retry number `retry`, with jitter when enabled.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.config.jitter {
            base.mul_f64(1.0 + rand::random::<f64>() * 0.25)
        } else {
            base
        }
    }

    /// The full jitter-free schedule for `retries` retries.
    pub fn schedule(&self, retries: u32) -> Vec<Duration> {
        (0..retries).map(|retry| self.base_delay(retry)).collect()
    }

    /// Sum of the jitter-free schedule for `retries` retries.
    ///
    /// Once the delay stops changing (capped, or a multiplier of 1) the rest
    /// is added in one step, so huge retry counts cost nothing.
    pub fn total_delay(&self, retries: u32) -> Duration {
        let mut total = Duration::ZERO;
        let mut previous = None;
        for retry in 0..retries {
            let delay = self.base_delay(retry);
            if previous == Some(delay) {
                return total.saturating_add(delay.saturating_mul(retries - retry));
            }
            total = total.saturating_add(delay);
            previous = Some(delay);
        }
        total
    }
}
