//! Authentication for outbound calls.
//!
//! Every upstream (chat completions, speech, vision) authenticates with a
//! bearer token; secrets are held in [`SecretString`] and never logged.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::errors::MarketplaceError;

/// Attaches credentials to outbound request headers.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);

    /// Rejects credentials that can never authenticate.
    fn validate(&self) -> Result<(), MarketplaceError>;
}

/// Bearer token authentication provider.
pub struct BearerAuth {
    token: SecretString,
}

impl BearerAuth {
    /// Creates a new bearer token provider.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Creates from a plain string token.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }

    /// Gets a hint of the token for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        key_hint(self.token.expose_secret())
    }
}

/// Last four characters of a secret, or `****` for short secrets.
pub(crate) fn key_hint(secret: &str) -> String {
    let count = secret.chars().count();
    if count > 4 {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("...{tail}")
    } else {
        "****".to_string()
    }
}

impl AuthProvider for BearerAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.expose_secret()),
        );
    }

    fn validate(&self) -> Result<(), MarketplaceError> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(MarketplaceError::configuration("Bearer token cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}
