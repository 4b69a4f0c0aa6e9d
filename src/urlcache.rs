//! Ephemeral opaque-handle cache for full URLs.
//!
//! Chat callback channels carry a bounded payload, too short for many media
//! URLs, so the bot-facing layer hands out a short opaque token instead and
//! resolves it back when the user picks a format. The cache is a
//! session-scoped convenience index, not a security boundary: tokens only
//! need to be astronomically unlikely to collide, not cryptographically
//! unguessable.
//!
//! Capacity is bounded; when an insertion pushes the map past capacity the
//! oldest entries (by insertion order) are evicted in one batch. Nothing is
//! persisted; a process restart invalidates every handle, which callers
//! surface as "session expired".

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Maximum number of live handles.
const CAPACITY: usize = 100;

/// Number of oldest entries removed in one eviction pass.
const EVICTION_BATCH: usize = 50;

/// Token length in hex characters (4 digest bytes).
const TOKEN_BYTES: usize = 4;

/// Bounded token → URL mapping with batch eviction in insertion order.
#[derive(Debug, Default)]
pub struct HandleCache {
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, String>,
    /// Insertion order, oldest first. Drives eviction.
    order: VecDeque<String>,
}

impl HandleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a URL and returns its opaque token.
    ///
    /// The token is a truncated SHA-256 digest over the URL, the caller
    /// identity, and the current time, so repeated submissions of one URL
    /// produce distinct live handles. If the insertion pushes the cache past
    /// capacity, the oldest [`EVICTION_BATCH`] entries are dropped in one
    /// pass.
    pub fn put(&self, url: &str, identity: &str) -> String {
        let token = derive_token(url, identity);
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if inner.entries.insert(token.clone(), url.to_string()).is_none() {
            inner.order.push_back(token.clone());
        }

        if inner.entries.len() > CAPACITY {
            for _ in 0..EVICTION_BATCH {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            debug!(remaining = inner.entries.len(), "Evicted oldest handle batch");
        }

        token
    }

    /// Resolves a token back to its URL.
    ///
    /// Returns `None` for unknown or evicted tokens. Callers surface that as
    /// a user-facing "session expired, resend the URL" condition, never an
    /// internal error.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<String> {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.entries.get(token).cloned()
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derives an 8-hex-char token from URL, identity, and the current time.
fn derive_token(url: &str, identity: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(identity.as_bytes());
    hasher.update(nanos.to_le_bytes());

    let digest = hasher.finalize();
    let mut token = String::with_capacity(TOKEN_BYTES * 2);
    for byte in digest.iter().take(TOKEN_BYTES) {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get_round_trips() {
        let cache = HandleCache::new();
        let token = cache.put("https://youtube.com/watch?v=abc", "42");
        assert_eq!(token.len(), 8);
        assert_eq!(
            cache.get(&token).as_deref(),
            Some("https://youtube.com/watch?v=abc")
        );
    }

    #[test]
    fn test_get_unknown_token_is_absent() {
        let cache = HandleCache::new();
        assert_eq!(cache.get("deadbeef"), None);
    }

    #[test]
    fn test_tokens_are_hex() {
        let cache = HandleCache::new();
        let token = cache.put("https://example.org/a", "1");
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_eviction_leaves_51_of_101_entries() {
        let cache = HandleCache::new();
        let mut tokens = Vec::new();
        for i in 0..101 {
            tokens.push(cache.put(&format!("https://example.org/{i}"), "42"));
        }

        assert_eq!(cache.len(), 51, "101st insert evicts the oldest 50");

        // The oldest 50 are gone, the 50 most recent of the prior 100 plus
        // the 101st survive.
        for token in &tokens[..50] {
            assert_eq!(cache.get(token), None, "evicted token must be absent");
        }
        for (i, token) in tokens[50..].iter().enumerate() {
            assert_eq!(
                cache.get(token).as_deref(),
                Some(format!("https://example.org/{}", i + 50).as_str()),
                "recent token must survive eviction"
            );
        }
    }

    #[test]
    fn test_size_never_exceeds_capacity_after_insertion() {
        let cache = HandleCache::new();
        for i in 0..500 {
            cache.put(&format!("https://example.org/{i}"), "42");
            assert!(cache.len() <= 100, "cache exceeded capacity at insert {i}");
        }
    }

    #[test]
    fn test_same_url_different_identities_get_distinct_tokens() {
        let cache = HandleCache::new();
        let first = cache.put("https://example.org/same", "42");
        let second = cache.put("https://example.org/same", "43");
        assert_ne!(first, second);
        assert_eq!(cache.len(), 2);
    }
}
