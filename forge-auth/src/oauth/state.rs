//! CSRF state management for the OAuth login flow.
//!
//! A single random value is split in two: `state` travels through the provider and
//! comes back on the callback, `state_key` lives in a short-lived cookie and names
//! the cache entry holding `state`. Only a caller holding the cookie can produce a
//! matching pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::random::random_string;

/// Namespace for state entries in a shared cache.
pub const STATE_KEY_PREFIX: &str = "oauth2:state:";

const STATE_TOKEN_LEN: usize = 32;

/// Expiring key-value store holding pending login states.
///
/// Implementations must be safe to share between concurrent requests. An entry
/// whose TTL has elapsed must read as absent.
#[async_trait]
pub trait StateCache: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn remove(&self, key: &str) -> Result<(), Error>;

    /// Remove the entry and return its value if it had not expired.
    ///
    /// The default reads then removes; stores that can do both in one step
    /// should override it so two callers never both see the value.
    async fn take(&self, key: &str) -> Result<Option<String>, Error> {
        let value = self.get(key).await?;
        self.remove(key).await?;
        Ok(value)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local [`StateCache`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStateCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose TTL has elapsed.
    ///
    /// Should be called periodically to prevent abandoned logins from piling up.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StateCache for MemoryStateCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let value = self
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone());
        Ok(value)
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, Error> {
        let value = self
            .entries
            .remove(key)
            .filter(|(_, entry)| entry.expires_at > Utc::now())
            .map(|(_, entry)| entry.value);
        Ok(value)
    }
}

/// Both halves of a freshly issued state token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedState {
    /// Sent to the provider's authorize endpoint.
    pub state: String,
    /// Sent to the browser as a cookie.
    pub state_key: String,
}

/// Issues and verifies CSRF state tokens against a [`StateCache`].
#[derive(Clone)]
pub struct StateGuard {
    cache: Arc<dyn StateCache>,
    ttl: Duration,
}

impl StateGuard {
    /// Create a guard with the default TTL of 5 minutes.
    pub fn new(cache: Arc<dyn StateCache>) -> Self {
        Self::with_ttl(cache, Duration::minutes(5))
    }

    pub fn with_ttl(cache: Arc<dyn StateCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }


    /// Generate a new state pair and remember `state` under `state_key`.
    pub async fn issue(&self) -> Result<IssuedState, Error> {
        let mut state = random_string(STATE_TOKEN_LEN)?;
        let state_key = state.split_off(STATE_TOKEN_LEN / 2);

        self.cache
            .put(&cache_key(&state_key), &state, self.ttl)
            .await?;

        Ok(IssuedState { state, state_key })
    }

    /// Check the callback's `state` against the entry named by the cookie.
    ///
    /// The entry is consumed whether or not it matches.
    pub async fn verify(&self, state_key: Option<&str>, state: &str) -> Result<(), Error> {
        let state_key = state_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| oauth_error(OAuthErrorKind::InvalidState, "missing state cookie"))?;

        match self.cache.take(&cache_key(state_key)).await? {
            Some(expected) if expected == state => Ok(()),
            Some(_) => {
                debug!("OAuth state mismatch");
                Err(oauth_error(OAuthErrorKind::InvalidState, "state mismatch"))
            }
            None => {
                debug!("No pending OAuth state for the presented key");
                Err(oauth_error(
                    OAuthErrorKind::InvalidState,
                    "unknown or expired state",
                ))
            }
        }
    }
}

fn cache_key(state_key: &str) -> String {
    format!("{STATE_KEY_PREFIX}{state_key}")
}
