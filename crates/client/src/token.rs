//! Provider access-token cache.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Instance-owned cache for one OAuth2 access token.
///
/// A token is treated as expired `refresh_skew` before its actual
/// expiry so an almost-dead token is never sent. The cache belongs to
/// the client instance that fills it; there is no process-wide token
/// state.
#[derive(Debug)]
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
    refresh_skew: Duration,
}

impl TokenCache {
    /// Creates an empty cache with the given refresh skew.
    pub fn new(refresh_skew: Duration) -> Self {
        Self {
            inner: Mutex::new(None),
            refresh_skew,
        }
    }

    /// Returns the cached token if it is still comfortably valid.
    pub fn get(&self) -> Option<String> {
        let guard = self.lock();
        guard.as_ref().and_then(|token| {
            let deadline = token.expires_at.checked_sub(self.refresh_skew)?;
            if Instant::now() < deadline {
                Some(token.access_token.clone())
            } else {
                None
            }
        })
    }

    /// Stores a freshly issued token.
    pub fn store(&self, access_token: impl Into<String>, expires_in: Duration) {
        let mut guard = self.lock();
        *guard = Some(CachedToken {
            access_token: access_token.into(),
            expires_at: Instant::now() + expires_in,
        });
    }

    /// Drops the cached token, forcing re-authentication.
    pub fn clear(&self) {
        let mut guard = self.lock();
        *guard = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CachedToken>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
