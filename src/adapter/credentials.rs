//! Credential probing
//!
//! The adapter selects among three credential kinds: a bearer session token
//! (read/write), a static API key (read-only), and a write-capable webhook
//! endpoint. Probes run once per adapter construction, in capability order;
//! each call then uses the already-resolved verdict instead of re-checking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials available to one sheet configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Bearer access token, externally obtained and refreshed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Expiry of the bearer token; `None` means not known to expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_expires_at: Option<DateTime<Utc>>,

    /// Static read-only key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Externally hosted write-capable webhook endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Credential a read operation will use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAuth {
    Bearer(String),
    ApiKey(String),
}

/// Credential a write operation will use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAuth {
    Bearer(String),
    Webhook(String),
}

/// Outcome of the construction-time capability probes
#[derive(Debug, Clone, Default)]
pub struct ResolvedCredentials {
    pub read: Option<ReadAuth>,
    pub write: Option<WriteAuth>,
}

impl CredentialSet {
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_bearer_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.bearer_expires_at = Some(expires_at);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    fn usable_bearer(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.bearer_token.as_deref()?;
        match self.bearer_expires_at {
            Some(expires_at) if expires_at <= now => None,
            _ => Some(token),
        }
    }

    /// Run the capability probes
    ///
    /// Read order: unexpired bearer, then API key. Write order: unexpired
    /// bearer, then webhook. An empty verdict surfaces later as
    /// `NoAuthentication` (reads) or `Permission` (writes).
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedCredentials {
        let bearer = self.usable_bearer(now);

        let read = bearer
            .map(|t| ReadAuth::Bearer(t.to_string()))
            .or_else(|| self.api_key.clone().map(ReadAuth::ApiKey));

        let write = bearer
            .map(|t| WriteAuth::Bearer(t.to_string()))
            .or_else(|| self.webhook_url.clone().map(WriteAuth::Webhook));

        ResolvedCredentials { read, write }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_bearer_wins_both_capabilities() {
        let creds = CredentialSet::default()
            .with_bearer("tok")
            .with_api_key("key")
            .with_webhook("https://hook.example.com");

        let resolved = creds.resolve(Utc::now());
        assert_eq!(resolved.read, Some(ReadAuth::Bearer("tok".to_string())));
        assert_eq!(resolved.write, Some(WriteAuth::Bearer("tok".to_string())));
    }

    #[test]
    fn test_expired_bearer_falls_back() {
        let creds = CredentialSet::default()
            .with_bearer("tok")
            .with_bearer_expiry(Utc::now() - Duration::minutes(5))
            .with_api_key("key")
            .with_webhook("https://hook.example.com");

        let resolved = creds.resolve(Utc::now());
        assert_eq!(resolved.read, Some(ReadAuth::ApiKey("key".to_string())));
        assert_eq!(
            resolved.write,
            Some(WriteAuth::Webhook("https://hook.example.com".to_string()))
        );
    }

    #[test]
    fn test_api_key_only_is_read_only() {
        let creds = CredentialSet::default().with_api_key("key");
        let resolved = creds.resolve(Utc::now());
        assert_eq!(resolved.read, Some(ReadAuth::ApiKey("key".to_string())));
        assert!(resolved.write.is_none());
    }

    #[test]
    fn test_no_credentials() {
        let resolved = CredentialSet::default().resolve(Utc::now());
        assert!(resolved.read.is_none());
        assert!(resolved.write.is_none());
    }
}
