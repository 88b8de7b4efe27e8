//! Per-language rate limits.
//!
//! Limits are keyed by language prefix. By default they are advisory
//! metadata; the executor only consults [`RateLimiter`] when enforcement is
//! switched on.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::MarketplaceError;
use crate::types::language::LanguageTag;

/// Rate limit for one language prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in minutes.
    pub per_minute_window: u32,
    /// Suggested wait once the window is exhausted.
    pub retry_after_ms: u64,
}

impl RateLimitConfig {
    /// Creates a limit.
    pub const fn new(max_requests: u32, per_minute_window: u32, retry_after_ms: u64) -> Self {
        Self {
            max_requests,
            per_minute_window,
            retry_after_ms,
        }
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.per_minute_window.max(1)) * 60)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(60, 1, 1000)
    }
}

/// Window key shared by every language without its own limit.
const DEFAULT_BUCKET: &str = "*";

/// Immutable table of limits keyed by language prefix.
#[derive(Debug, Clone)]
pub struct RateLimitTable {
    default: RateLimitConfig,
    by_prefix: HashMap<String, RateLimitConfig>,
}

impl RateLimitTable {
    /// Creates a table where every language gets `default`.
    pub fn new(default: RateLimitConfig) -> Self {
        Self {
            default,
            by_prefix: HashMap::new(),
        }
    }

    /// Adds a limit for a language prefix.
    #[must_use]
    pub fn with_language(mut self, prefix: &str, config: RateLimitConfig) -> Self {
        self.by_prefix.insert(prefix.to_ascii_lowercase(), config);
        self
    }

    /// The built-in table.
    ///
    /// Non-English requests also pay for a translation call, so their
    /// budget is smaller.
    pub fn builtin() -> Self {
        let translated = RateLimitConfig::new(30, 1, 2000);
        Self::new(RateLimitConfig::default())
            .with_language("en", RateLimitConfig::default())
            .with_language("es", translated)
            .with_language("fr", translated)
            .with_language("de", translated)
    }

    /// Limit for `language`, falling back to the default.
    pub fn for_language(&self, language: &LanguageTag) -> RateLimitConfig {
        self.bucket(language).1
    }

    /// Window key and limit for `language`. Languages without their own
    /// limit share one default window.
    fn bucket(&self, language: &LanguageTag) -> (String, RateLimitConfig) {
        let prefix = language.prefix();
        match self.by_prefix.get(&prefix) {
            Some(config) => (prefix, *config),
            None => (DEFAULT_BUCKET.to_string(), self.default),
        }
    }
}

impl Default for RateLimitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Sliding-window limiter over a [`RateLimitTable`].
#[derive(Debug)]
pub struct RateLimiter {
    table: RateLimitTable,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter.
    pub fn new(table: RateLimitTable) -> Self {
        Self {
            table,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// The limit table.
    pub fn table(&self) -> &RateLimitTable {
        &self.table
    }

    /// Records one request for `language`, or refuses it when the window
    /// is full.
    pub fn acquire(&self, language: &LanguageTag) -> Result<(), MarketplaceError> {
        let (key, config) = self.table.bucket(language);
        let window = config.window();
        let now = Instant::now();

        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.retain(|bucket, stamps| {
            let window = if bucket == &key { window } else { self.window_of(bucket) };
            while stamps
                .front()
                .is_some_and(|oldest| now.duration_since(*oldest) >= window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });
        let stamps = windows.entry(key).or_default();

        if stamps.len() >= config.max_requests as usize {
            let until_free = stamps
                .front()
                .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or_default();
            let retry_after = until_free.max(Duration::from_millis(config.retry_after_ms));
            return Err(MarketplaceError::RateLimited {
                message: format!(
                    "{} requests per {} min exceeded for language '{}'",
                    config.max_requests,
                    config.per_minute_window,
                    language.prefix()
                ),
                retry_after: Some(retry_after),
            });
        }

        stamps.push_back(now);
        Ok(())
    }

    fn window_of(&self, bucket: &str) -> Duration {
        self.table
            .by_prefix
            .get(bucket)
            .unwrap_or(&self.table.default)
            .window()
    }

    /// Number of windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
