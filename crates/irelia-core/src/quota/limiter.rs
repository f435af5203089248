//! Sliding-window request limiter.

use crate::clock::Timestamp;
use std::collections::VecDeque;
use std::time::Duration;

/// Counts requests inside a sliding window `[now - window, now]`.
///
/// This is an admission oracle only: it never sleeps or retries. Callers that
/// share a limiter must pair [`is_available`](Self::is_available) and
/// [`record_request`](Self::record_request) under one lock, which is what
/// [`QuotaGate`](super::QuotaGate) does.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    request_limit: usize,
    window: Duration,
    /// Non-decreasing request times.
    timestamps: VecDeque<Timestamp>,
}

impl RateLimiter {
    pub fn new(request_limit: usize, window: Duration) -> Self {
        Self {
            request_limit,
            window,
            timestamps: VecDeque::with_capacity(request_limit.min(1024)),
        }
    }

    pub fn request_limit(&self) -> usize {
        self.request_limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop every timestamp older than `now - window`.
    fn compact(&mut self, now: Timestamp) {
        let cutoff = now.saturating_sub(self.window);
        while self.timestamps.front().is_some_and(|&t| t < cutoff) {
            self.timestamps.pop_front();
        }
    }

    /// Whether one more request fits in the window ending at `now`.
    pub fn is_available(&mut self, now: Timestamp) -> bool {
        self.compact(now);
        self.timestamps.len() < self.request_limit
    }

    /// Record a request admitted at `now`.
    pub fn record_request(&mut self, now: Timestamp) {
        // A clock that steps backwards must not break ordering.
        let now = match self.timestamps.back() {
            Some(&last) if last > now => last,
            _ => now,
        };
        self.timestamps.push_back(now);
    }

    /// Number of requests currently counted against the window.
    pub fn in_window(&mut self, now: Timestamp) -> usize {
        self.compact(now);
        self.timestamps.len()
    }

    /// Earliest time at which a slot frees up, or `None` if one is free now.
    pub fn next_slot_at(&mut self, now: Timestamp) -> Option<Timestamp> {
        self.compact(now);
        let len = self.timestamps.len();
        if len < self.request_limit || self.request_limit == 0 {
            return None;
        }
        // The entry whose expiry brings the count back under the limit.
        let blocking = self.timestamps[len - self.request_limit];
        Some(
            blocking
                .saturating_add(self.window)
                .saturating_add(Duration::from_millis(1)),
        )
    }
}
