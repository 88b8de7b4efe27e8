//! Service configuration.
//!
//! Holds upstream credentials and endpoints, call defaults, per-feature
//! mock/live modes and the HTTP bind address. Built with
//! [`MarketplaceConfig::builder`] or read from the environment.

use secrecy::{ExposeSecret, SecretString};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::executor::{RequestOptions, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use crate::services::ServiceMode;
use crate::types::language::LanguageTag;

/// Default chat completions API root.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Default Google Speech recognize endpoint.
pub const DEFAULT_SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Default Google Vision annotate endpoint.
pub const DEFAULT_VISION_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Mock or live mode per feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureModes {
    /// Search enhancement.
    pub search: ServiceMode,
    /// Expert matching.
    pub experts: ServiceMode,
    /// Material recommendations.
    pub materials: ServiceMode,
    /// Image analysis.
    pub vision: ServiceMode,
    /// Voice transcription.
    pub speech: ServiceMode,
}

impl FeatureModes {
    /// Every feature in `mode`.
    pub fn all(mode: ServiceMode) -> Self {
        Self {
            search: mode,
            experts: mode,
            materials: mode,
            vision: mode,
            speech: mode,
        }
    }

    /// Returns true when a live feature calls the chat model.
    pub fn needs_chat(&self) -> bool {
        [self.search, self.experts, self.materials, self.vision].contains(&ServiceMode::Live)
    }

    /// Returns true when a live feature calls Google Cloud.
    pub fn needs_google(&self) -> bool {
        [self.vision, self.speech].contains(&ServiceMode::Live)
    }
}

/// Configuration for the marketplace AI layer.
#[derive(Clone)]
pub struct MarketplaceConfig {
    pub(crate) groq_api_key: Option<SecretString>,
    /// Chat completions API root.
    pub groq_base_url: String,
    /// Chat model.
    pub groq_model: String,
    pub(crate) google_access_token: Option<SecretString>,
    /// Speech recognize endpoint.
    pub speech_url: String,
    /// Vision annotate endpoint.
    pub vision_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Language assumed for HTTP requests that carry none.
    pub default_language: LanguageTag,
    /// Feature modes.
    pub modes: FeatureModes,
    /// Artificial delay before fixture answers.
    pub mock_latency: Duration,
    /// Enforce the per-language rate limits instead of only advertising them.
    pub enforce_rate_limits: bool,
    /// Listings file; the bundled catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// HTTP bind address.
    pub bind: SocketAddr,
}

impl MarketplaceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MarketplaceConfigBuilder {
        MarketplaceConfigBuilder::new()
    }

    /// Reads the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GROQ_API_KEY`, `GROQ_BASE_URL`, `GROQ_MODEL`
    /// - `GOOGLE_CLOUD_ACCESS_TOKEN`, `GOOGLE_SPEECH_URL`, `GOOGLE_VISION_URL`
    /// - `MARKETPLACE_TIMEOUT_MS`, `MARKETPLACE_MAX_RETRIES`,
    ///   `MARKETPLACE_DEFAULT_LANGUAGE`
    /// - `MARKETPLACE_MOCK_{SEARCH,EXPERTS,MATERIALS,VISION,SPEECH}`:
    ///   `true` (default) answers from fixtures, `false` calls upstream
    /// - `MARKETPLACE_MOCK_LATENCY_MS`, `MARKETPLACE_ENFORCE_RATE_LIMITS`
    /// - `MARKETPLACE_CATALOG_PATH`, `MARKETPLACE_BIND`
    pub fn from_env() -> MarketplaceResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, one variable at a time.
    pub fn from_lookup<F>(lookup: F) -> MarketplaceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = MarketplaceConfigBuilder::new();

        if let Some(key) = get("GROQ_API_KEY") {
            builder = builder.groq_api_key(key);
        }
        if let Some(url) = get("GROQ_BASE_URL") {
            builder = builder.groq_base_url(url);
        }
        if let Some(model) = get("GROQ_MODEL") {
            builder = builder.groq_model(model);
        }
        if let Some(token) = get("GOOGLE_CLOUD_ACCESS_TOKEN") {
            builder = builder.google_access_token(token);
        }
        if let Some(url) = get("GOOGLE_SPEECH_URL") {
            builder = builder.speech_url(url);
        }
        if let Some(url) = get("GOOGLE_VISION_URL") {
            builder = builder.vision_url(url);
        }
        if let Some(value) = get("MARKETPLACE_TIMEOUT_MS") {
            builder = builder.timeout_ms(parse_number("MARKETPLACE_TIMEOUT_MS", &value)?);
        }
        if let Some(value) = get("MARKETPLACE_MAX_RETRIES") {
            builder = builder.max_retries(parse_number("MARKETPLACE_MAX_RETRIES", &value)?);
        }
        if let Some(language) = get("MARKETPLACE_DEFAULT_LANGUAGE") {
            builder = builder.default_language(LanguageTag::parse(&language));
        }

        let mut modes = FeatureModes::default();
        for (name, slot) in [
            ("MARKETPLACE_MOCK_SEARCH", &mut modes.search),
            ("MARKETPLACE_MOCK_EXPERTS", &mut modes.experts),
            ("MARKETPLACE_MOCK_MATERIALS", &mut modes.materials),
            ("MARKETPLACE_MOCK_VISION", &mut modes.vision),
            ("MARKETPLACE_MOCK_SPEECH", &mut modes.speech),
        ] {
            if let Some(value) = get(name) {
                *slot = if parse_flag(name, &value)? {
                    ServiceMode::Mock
                } else {
                    ServiceMode::Live
                };
            }
        }
        builder = builder.modes(modes);

        if let Some(value) = get("MARKETPLACE_MOCK_LATENCY_MS") {
            let millis: u64 = parse_number("MARKETPLACE_MOCK_LATENCY_MS", &value)?;
            builder = builder.mock_latency(Duration::from_millis(millis));
        }
        if let Some(value) = get("MARKETPLACE_ENFORCE_RATE_LIMITS") {
            builder =
                builder.enforce_rate_limits(parse_flag("MARKETPLACE_ENFORCE_RATE_LIMITS", &value)?);
        }
        if let Some(path) = get("MARKETPLACE_CATALOG_PATH") {
            builder = builder.catalog_path(path);
        }
        if let Some(bind) = get("MARKETPLACE_BIND") {
            builder = builder.bind(bind);
        }

        builder.build()
    }

    /// Chat API key, if configured.
    pub(crate) fn groq_api_key(&self) -> Option<&SecretString> {
        self.groq_api_key.as_ref()
    }

    /// Google access token, if configured.
    pub(crate) fn google_access_token(&self) -> Option<&SecretString> {
        self.google_access_token.as_ref()
    }

    /// Base options for outbound calls.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::new()
            .retries(self.max_retries)
            .timeout_ms(self.timeout_ms)
            .language(self.default_language.clone())
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.request_options().timeout()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> MarketplaceResult<T> {
    value.trim().parse().map_err(|_| {
        MarketplaceError::configuration(format!("{name} must be a non-negative integer, got '{value}'"))
    })
}

fn parse_flag(name: &str, value: &str) -> MarketplaceResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MarketplaceError::configuration(format!(
            "{name} must be true or false, got '{value}'"
        ))),
    }
}

/// Requires HTTPS, allowing plain HTTP only for loopback hosts.
fn validate_endpoint(name: &str, raw: &str) -> MarketplaceResult<String> {
    let url = Url::parse(raw)?;
    let loopback = match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    match url.scheme() {
        "https" => {}
        "http" if loopback => {}
        _ => {
            return Err(MarketplaceError::configuration(format!(
                "{name} must use HTTPS: {raw}"
            )))
        }
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn redacted(secret: Option<&SecretString>) -> String {
    secret.map_or_else(
        || "unset".to_string(),
        |s| crate::auth::key_hint(s.expose_secret()),
    )
}

impl std::fmt::Debug for MarketplaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceConfig")
            .field("groq_api_key", &redacted(self.groq_api_key.as_ref()))
            .field("groq_base_url", &self.groq_base_url)
            .field("groq_model", &self.groq_model)
            .field(
                "google_access_token",
                &redacted(self.google_access_token.as_ref()),
            )
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("modes", &self.modes)
            .field("bind", &self.bind)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MarketplaceConfig`].
#[derive(Default)]
pub struct MarketplaceConfigBuilder {
    groq_api_key: Option<String>,
    groq_base_url: Option<String>,
    groq_model: Option<String>,
    google_access_token: Option<String>,
    speech_url: Option<String>,
    vision_url: Option<String>,
    timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    default_language: Option<LanguageTag>,
    modes: FeatureModes,
    mock_latency: Duration,
    enforce_rate_limits: bool,
    catalog_path: Option<PathBuf>,
    bind: Option<String>,
}

impl MarketplaceConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat API key.
    #[must_use]
    pub fn groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.groq_api_key = Some(key.into());
        self
    }

    /// Sets the chat API root.
    #[must_use]
    pub fn groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.groq_base_url = Some(url.into());
        self
    }

    /// Sets the chat model.
    #[must_use]
    pub fn groq_model(mut self, model: impl Into<String>) -> Self {
        self.groq_model = Some(model.into());
        self
    }

    /// Sets the Google Cloud access token.
    #[must_use]
    pub fn google_access_token(mut self, token: impl Into<String>) -> Self {
        self.google_access_token = Some(token.into());
        self
    }

    /// Sets the Speech endpoint.
    #[must_use]
    pub fn speech_url(mut self, url: impl Into<String>) -> Self {
        self.speech_url = Some(url.into());
        self
    }

    /// Sets the Vision endpoint.
    #[must_use]
    pub fn vision_url(mut self, url: impl Into<String>) -> Self {
        self.vision_url = Some(url.into());
        self
    }

    /// Sets the per-attempt timeout in milliseconds.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the default language.
    #[must_use]
    pub fn default_language(mut self, language: LanguageTag) -> Self {
        self.default_language = Some(language);
        self
    }

    /// Sets every feature mode.
    #[must_use]
    pub fn modes(mut self, modes: FeatureModes) -> Self {
        self.modes = modes;
        self
    }

    /// Sets the mock latency.
    #[must_use]
    pub fn mock_latency(mut self, latency: Duration) -> Self {
        self.mock_latency = latency;
        self
    }

    /// Enables rate-limit enforcement.
    #[must_use]
    pub fn enforce_rate_limits(mut self, enforce: bool) -> Self {
        self.enforce_rate_limits = enforce;
        self
    }

    /// Sets the catalog file.
    #[must_use]
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> MarketplaceResult<MarketplaceConfig> {
        let groq_api_key = self.groq_api_key.filter(|k| !k.trim().is_empty());
        let google_access_token = self.google_access_token.filter(|t| !t.trim().is_empty());

        if self.modes.needs_chat() && groq_api_key.is_none() {
            return Err(MarketplaceError::configuration(
                "GROQ_API_KEY is required when a chat-backed feature is live",
            ));
        }
        if self.modes.needs_google() && google_access_token.is_none() {
            return Err(MarketplaceError::configuration(
                "GOOGLE_CLOUD_ACCESS_TOKEN is required when vision or speech is live",
            ));
        }
        if let Some(key) = &groq_api_key {
            if !key.starts_with("gsk_") {
                tracing::warn!("Chat API key does not match the expected format (gsk_*)");
            }
        }

        let bind_raw = self.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| {
            MarketplaceError::configuration(format!("Invalid bind address: {bind_raw}"))
        })?;

        Ok(MarketplaceConfig {
            groq_api_key: groq_api_key.map(SecretString::new),
            groq_base_url: validate_endpoint(
                "GROQ_BASE_URL",
                self.groq_base_url.as_deref().unwrap_or(DEFAULT_GROQ_BASE_URL),
            )?,
            groq_model: self
                .groq_model
                .unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            google_access_token: google_access_token.map(SecretString::new),
            speech_url: validate_endpoint(
                "GOOGLE_SPEECH_URL",
                self.speech_url.as_deref().unwrap_or(DEFAULT_SPEECH_URL),
            )?,
            vision_url: validate_endpoint(
                "GOOGLE_VISION_URL",
                self.vision_url.as_deref().unwrap_or(DEFAULT_VISION_URL),
            )?,
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            max_retries: self.max_retries.unwrap_or(DEFAULT_RETRIES),
            default_language: self.default_language.unwrap_or_default(),
            modes: self.modes,
            mock_latency: self.mock_latency,
            enforce_rate_limits: self.enforce_rate_limits,
            catalog_path: self.catalog_path,
            bind,
        })
    }
}
