//! Per-identity sliding-window admission control.
//!
//! Each identity gets an ordered window of request timestamps covering at
//! most the trailing 60 seconds. Admission drops expired timestamps first,
//! then rejects without recording when the window is already full. This is a
//! true sliding window, not a fixed-window counter: a burst of `2 × limit`
//! straddling a window boundary is impossible.
//!
//! The limiter is internally synchronized and shared across all in-flight
//! requests; buckets live in a [`DashMap`] so unrelated identities never
//! contend on one lock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

/// Length of the admission window.
const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window rate limiter keyed by caller identity.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum admissions per identity inside any rolling window.
    /// Zero disables limiting (every call is admitted).
    per_minute: u32,

    /// Per-identity timestamp windows, oldest first.
    windows: DashMap<String, Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter admitting at most `per_minute` requests per
    /// identity inside any rolling 60-second window.
    ///
    /// `per_minute = 0` disables limiting.
    #[must_use]
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            windows: DashMap::new(),
        }
    }

    /// Creates a limiter that admits everything (for tests and CLI use).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Decides admission for one request from `identity`.
    ///
    /// Expired timestamps are pruned first; if the remaining count has
    /// reached the limit the request is rejected *without* recording, so a
    /// hammering caller does not extend their own lockout.
    pub fn admit(&self, identity: &str) -> bool {
        if self.per_minute == 0 {
            return true;
        }

        let now = Instant::now();
        let bucket = self
            .windows
            .entry(identity.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut window = match bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        while window
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= WINDOW)
        {
            window.pop_front();
        }

        if window.len() >= self.per_minute as usize {
            debug!(identity, in_window = window.len(), "Admission rejected");
            return false;
        }

        window.push_back(now);
        true
    }
}
