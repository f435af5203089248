//! AND-composition of several rate limiters.

use super::limiter::RateLimiter;
use crate::clock::Timestamp;
use crate::config::QuotaConfig;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Outcome of asking the gate for permission to make one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed; it has been recorded on every limiter.
    Admitted,
    /// At least one limiter is saturated; nothing was recorded.
    Refused {
        /// When the most constrained limiter frees a slot, if known.
        retry_at: Option<Timestamp>,
    },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Usage of one member limiter at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterUsage {
    pub request_limit: usize,
    pub window: Duration,
    pub in_window: usize,
}

/// Admits a call only if every member limiter has headroom.
///
/// The check and the record happen inside one critical section, so two
/// concurrent callers can never both observe the last free slot.
#[derive(Debug)]
pub struct QuotaGate {
    limiters: Mutex<Vec<RateLimiter>>,
}

impl QuotaGate {
    pub fn new(limiters: Vec<RateLimiter>) -> Self {
        Self {
            limiters: Mutex::new(limiters),
        }
    }

    /// A gate with no limits.
    pub fn unlimited() -> Self {
        Self::new(Vec::new())
    }

    /// The burst and sustained limits of a development API key.
    pub fn riot_default() -> Self {
        Self::new(vec![
            RateLimiter::new(QuotaConfig::BURST_LIMIT, QuotaConfig::BURST_WINDOW),
            RateLimiter::new(QuotaConfig::SUSTAINED_LIMIT, QuotaConfig::SUSTAINED_WINDOW),
        ])
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RateLimiter>> {
        // Limiter methods cannot panic mid-update, so a poisoned lock still
        // guards consistent state.
        self.limiters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether every member currently has headroom. Records nothing.
    pub fn is_available(&self, now: Timestamp) -> bool {
        self.lock().iter_mut().all(|l| l.is_available(now))
    }

    /// Check every member and, only if all admit, record `now` on all of them.
    pub fn try_acquire(&self, now: Timestamp) -> Admission {
        let mut limiters = self.lock();

        // Evaluate every member (no short-circuit) so each one compacts and
        // the retry hint reflects the slowest saturated limiter.
        let mut admitted = true;
        let mut retry_at: Option<Timestamp> = None;
        for limiter in limiters.iter_mut() {
            if !limiter.is_available(now) {
                admitted = false;
                retry_at = retry_at.max(limiter.next_slot_at(now));
            }
        }

        if !admitted {
            debug!("Quota refused at {}, next slot {:?}", now, retry_at);
            return Admission::Refused { retry_at };
        }

        for limiter in limiters.iter_mut() {
            limiter.record_request(now);
        }
        Admission::Admitted
    }

    /// Current usage of each member, in order.
    pub fn usage(&self, now: Timestamp) -> Vec<LimiterUsage> {
        self.lock()
            .iter_mut()
            .map(|l| LimiterUsage {
                request_limit: l.request_limit(),
                window: l.window(),
                in_window: l.in_window(now),
            })
            .collect()
    }
}

impl Default for QuotaGate {
    fn default() -> Self {
        Self::riot_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn at(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    #[test]
    fn test_unlimited_always_admits() {
        let gate = QuotaGate::unlimited();
        for i in 0..1_000 {
            assert!(gate.try_acquire(at(i)).is_admitted());
        }
    }

    #[test]
    fn test_refusal_records_on_no_member() {
        let gate = QuotaGate::new(vec![
            RateLimiter::new(1, Duration::from_secs(5)),
            RateLimiter::new(10, Duration::from_secs(600)),
        ]);

        assert!(gate.try_acquire(at(0)).is_admitted());
        let refused = gate.try_acquire(at(1_000));
        assert_eq!(
            refused,
            Admission::Refused {
                retry_at: Some(at(5_001))
            }
        );

        // The sustained limiter only saw the admitted call.
        let usage = gate.usage(at(1_000));
        assert_eq!(usage[0].in_window, 1);
        assert_eq!(usage[1].in_window, 1);
    }

    #[test]
    fn test_and_semantics() {
        let gate = QuotaGate::new(vec![
            RateLimiter::new(5, Duration::from_secs(5)),
            RateLimiter::new(2, Duration::from_secs(600)),
        ]);
        assert!(gate.try_acquire(at(0)).is_admitted());
        assert!(gate.try_acquire(at(10_000)).is_admitted());
        // Burst limiter has room, sustained does not.
        assert!(!gate.is_available(at(20_000)));
        assert!(!gate.try_acquire(at(20_000)).is_admitted());
    }

    #[test]
    fn test_riot_default_limits() {
        let gate = QuotaGate::riot_default();
        for _ in 0..5 {
            assert!(gate.try_acquire(at(0)).is_admitted());
        }
        assert!(!gate.try_acquire(at(0)).is_admitted());
        assert!(gate.try_acquire(at(5_001)).is_admitted());
    }

    #[test]
    fn test_concurrent_acquire_never_overshoots() {
        let gate = Arc::new(QuotaGate::new(vec![RateLimiter::new(
            7,
            Duration::from_secs(60),
        )]));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| gate.try_acquire(at(0)).is_admitted())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 7);
    }
}
