//! Login brute-force protection.
//!
//! Failed logins are counted per client identifier (normally an IP) over a
//! sliding window. Reaching `max_fails` inside the window blocks the
//! identifier for `block_secs`. Expired blocks are dropped lazily on the next
//! lookup; identifiers nobody touches again are removed by
//! [`LoginGuard::purge_idle`], which the server's sweeper calls.
//!
//! State is process-local. Each identifier's failures and block live in one
//! `DashMap` entry, so every operation on an identifier runs under that
//! entry's shard lock and racing failures cannot lose updates.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use serde::Serialize;

use crate::config::validation::MAX_DURATION_SECS;
use crate::config::LoginGuardConfig;
use crate::security::clock::{Clock, SystemClock};

/// Admission decisions for authentication attempts.
pub trait LoginGuard: Send + Sync + 'static {
    /// True iff `id` has a block that has not yet expired.
    fn is_blocked(&self, id: &str) -> bool;

    /// Record a failed attempt. Returns true if this failure created a block.
    fn record_failure(&self, id: &str) -> bool;

    /// Forget failures for `id` (successful login).
    fn clear_failures(&self, id: &str);

    /// Drop both the block and the failure history for `id`.
    fn unblock(&self, id: &str);

    /// Expiry of the active block on `id`, if any.
    fn blocked_until(&self, id: &str) -> Option<SystemTime>;

    fn summary(&self) -> GuardSummary;

    /// Forget identifiers with no counted failures and no active block.
    /// Returns how many were removed.
    fn purge_idle(&self) -> usize;
}

/// Counts reported by the admin status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuardSummary {
    pub tracked: usize,
    pub blocked: usize,
}

/// Thresholds for [`FailureTracker`].
#[derive(Debug, Clone, Copy)]
pub struct GuardPolicy {
    pub max_fails: usize,
    pub window: Duration,
    pub block: Duration,
}

impl From<&LoginGuardConfig> for GuardPolicy {
    fn from(config: &LoginGuardConfig) -> Self {
        Self {
            max_fails: config.max_fails,
            window: Duration::from_secs(config.window_secs),
            block: Duration::from_secs(config.block_secs),
        }
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::from(&LoginGuardConfig::default())
    }
}

#[derive(Debug, Default)]
struct ClientRecord {
    failures: VecDeque<SystemTime>,
    blocked_until: Option<SystemTime>,
}

impl ClientRecord {
    fn is_idle(&self) -> bool {
        self.failures.is_empty() && self.blocked_until.is_none()
    }
}

/// In-memory [`LoginGuard`] keyed by client identifier.
pub struct FailureTracker<C: Clock = SystemClock> {
    clients: DashMap<String, ClientRecord>,
    policy: GuardPolicy,
    clock: C,
}

impl FailureTracker<SystemClock> {
    pub fn new(policy: GuardPolicy) -> Self {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> FailureTracker<C> {
    pub fn with_clock(policy: GuardPolicy, clock: C) -> Self {
        Self {
            clients: DashMap::new(),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    /// Failures currently counted for `id` (after pruning).
    pub fn failure_count(&self, id: &str) -> usize {
        let now = self.clock.now();
        self.clients
            .get_mut(id)
            .map(|mut record| {
                prune(&mut record.failures, now, self.policy.window);
                record.failures.len()
            })
            .unwrap_or(0)
    }
}

/// Drop failures older than `window`. A failure exactly `window` old still counts.
fn prune(failures: &mut VecDeque<SystemTime>, now: SystemTime, window: Duration) {
    while let Some(oldest) = failures.front() {
        match now.duration_since(*oldest) {
            Ok(age) if age > window => {
                failures.pop_front();
            }
            _ => break,
        }
    }
}

impl<C: Clock> LoginGuard for FailureTracker<C> {
    fn is_blocked(&self, id: &str) -> bool {
        let now = self.clock.now();
        let Some(mut record) = self.clients.get_mut(id) else {
            return false;
        };

        match record.blocked_until {
            Some(until) if now < until => true,
            Some(_) => {
                record.blocked_until = None;
                let idle = record.is_idle();
                drop(record);
                if idle {
                    self.clients.remove_if(id, |_, r| r.is_idle());
                }
                tracing::debug!(client = %id, "Login block expired");
                false
            }
            None => false,
        }
    }

    fn record_failure(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut record = self.clients.entry(id.to_string()).or_default();

        record.failures.push_back(now);
        prune(&mut record.failures, now, self.policy.window);

        if record.failures.len() >= self.policy.max_fails {
            let block = self.policy.block.min(Duration::from_secs(MAX_DURATION_SECS));
            record.blocked_until = Some(now + block);
            record.failures.clear();
            return true;
        }
        false
    }

    fn clear_failures(&self, id: &str) {
        let idle = match self.clients.get_mut(id) {
            Some(mut record) => {
                record.failures.clear();
                record.is_idle()
            }
            None => return,
        };
        if idle {
            self.clients.remove_if(id, |_, r| r.is_idle());
        }
    }

    fn unblock(&self, id: &str) {
        self.clients.remove(id);
    }

    fn blocked_until(&self, id: &str) -> Option<SystemTime> {
        let now = self.clock.now();
        self.clients
            .get(id)
            .and_then(|r| r.blocked_until)
            .filter(|until| now < *until)
    }

    fn summary(&self) -> GuardSummary {
        let now = self.clock.now();
        let mut summary = GuardSummary::default();
        for record in self.clients.iter() {
            summary.tracked += 1;
            if record.blocked_until.is_some_and(|until| now < until) {
                summary.blocked += 1;
            }
        }
        summary
    }

    fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let window = self.policy.window;
        let before = self.clients.len();
        self.clients.retain(|_, record| {
            prune(&mut record.failures, now, window);
            if record.blocked_until.is_some_and(|until| now >= until) {
                record.blocked_until = None;
            }
            !record.is_idle()
        });
        before.saturating_sub(self.clients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::clock::ManualClock;
    use std::sync::Arc;

    const IP: &str = "203.0.113.7";

    fn tracker() -> (FailureTracker<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (FailureTracker::with_clock(GuardPolicy::default(), clock.clone()), clock)
    }

    #[test]
    fn test_blocks_on_fifth_failure() {
        let (guard, _) = tracker();

        for attempt in 1..5 {
            assert!(!guard.record_failure(IP), "attempt {attempt} must not block");
            assert!(!guard.is_blocked(IP));
        }
        assert!(guard.record_failure(IP));
        assert!(guard.is_blocked(IP));
        // history is cleared once the block is created
        assert_eq!(guard.failure_count(IP), 0);
    }

    #[test]
    fn test_purge_idle_drops_stale_identifiers() {
        let (guard, clock) = tracker();
        guard.record_failure("198.51.100.1");
        for _ in 0..5 {
            guard.record_failure(IP);
        }
        assert_eq!(guard.purge_idle(), 0);

        clock.advance(Duration::from_secs(300));
        guard.record_failure("198.51.100.2");
        assert_eq!(guard.summary(), GuardSummary { tracked: 3, blocked: 1 });

        // first failure aged out, block expired; the recent failure stays
        clock.advance(Duration::from_secs(301));
        assert_eq!(guard.purge_idle(), 2);
        assert_eq!(guard.summary(), GuardSummary { tracked: 1, blocked: 0 });
        assert_eq!(guard.failure_count("198.51.100.2"), 1);
    }

    #[test]
    fn test_huge_block_does_not_overflow() {
        let clock = Arc::new(ManualClock::default());
        let policy = GuardPolicy {
            max_fails: 1,
            window: Duration::from_secs(600),
            block: Duration::from_secs(u64::MAX),
        };
        let guard = FailureTracker::with_clock(policy, clock.clone());

        assert!(guard.record_failure(IP));
        assert!(guard.is_blocked(IP));
        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert!(guard.is_blocked(IP));
    }

    #[test]
    fn test_block_expires_lazily() {
        let (guard, clock) = tracker();
        for _ in 0..5 {
            guard.record_failure(IP);
        }

        clock.advance(Duration::from_secs(599));
        assert!(guard.is_blocked(IP));

        clock.advance(Duration::from_secs(1));
        assert!(!guard.is_blocked(IP));
        assert_eq!(guard.blocked_until(IP), None);
        assert_eq!(guard.summary(), GuardSummary::default());
    }

    #[test]
    fn test_failures_outside_window_never_accumulate() {
        let (guard, clock) = tracker();

        for _ in 0..20 {
            assert!(!guard.record_failure(IP));
            clock.advance(Duration::from_secs(601));
        }
        assert!(!guard.is_blocked(IP));
        assert_eq!(guard.failure_count(IP), 0);
    }

    #[test]
    fn test_failure_exactly_window_old_still_counts() {
        let (guard, clock) = tracker();

        guard.record_failure(IP);
        clock.advance(Duration::from_secs(600));
        assert_eq!(guard.failure_count(IP), 1);
        clock.advance(Duration::from_secs(1));
        assert_eq!(guard.failure_count(IP), 0);
    }

    #[test]
    fn test_window_slides() {
        let (guard, clock) = tracker();

        for _ in 0..2 {
            guard.record_failure(IP);
        }
        clock.advance(Duration::from_secs(400));
        for _ in 0..2 {
            assert!(!guard.record_failure(IP));
        }
        clock.advance(Duration::from_secs(201));
        // t=601: only the two failures from t=400 remain
        assert_eq!(guard.failure_count(IP), 2);
        assert!(!guard.record_failure(IP));
        assert!(!guard.record_failure(IP));
        assert!(guard.record_failure(IP));
    }

    #[test]
    fn test_clear_resets_count() {
        let (guard, _) = tracker();

        for _ in 0..4 {
            guard.record_failure(IP);
        }
        guard.clear_failures(IP);
        assert!(!guard.record_failure(IP));
        assert!(!guard.is_blocked(IP));
        assert_eq!(guard.failure_count(IP), 1);
    }

    #[test]
    fn test_clear_and_unblock_are_idempotent() {
        let (guard, _) = tracker();
        guard.clear_failures(IP);
        guard.unblock(IP);
        guard.unblock(IP);
        assert!(!guard.is_blocked(IP));
    }

    #[test]
    fn test_clear_does_not_lift_block() {
        let (guard, _) = tracker();
        for _ in 0..5 {
            guard.record_failure(IP);
        }
        guard.clear_failures(IP);
        assert!(guard.is_blocked(IP));
    }

    #[test]
    fn test_unblock_erases_history() {
        let (guard, _) = tracker();
        for _ in 0..5 {
            guard.record_failure(IP);
        }
        assert!(guard.is_blocked(IP));

        guard.unblock(IP);
        assert!(!guard.is_blocked(IP));
        for _ in 0..4 {
            assert!(!guard.record_failure(IP));
        }
    }

    #[test]
    fn test_identifiers_are_independent() {
        let (guard, _) = tracker();
        for _ in 0..5 {
            guard.record_failure(IP);
        }
        assert!(guard.is_blocked(IP));
        assert!(!guard.is_blocked("198.51.100.1"));
        assert_eq!(guard.summary(), GuardSummary { tracked: 1, blocked: 1 });
    }

    #[test]
    fn test_max_fails_of_one_blocks_immediately() {
        let clock = Arc::new(ManualClock::default());
        let policy = GuardPolicy {
            max_fails: 1,
            ..GuardPolicy::default()
        };
        let guard = FailureTracker::with_clock(policy, clock);
        assert!(guard.record_failure(IP));
        assert!(guard.is_blocked(IP));
    }

    #[test]
    fn test_concurrent_failures_block_exactly_once() {
        let guard = Arc::new(FailureTracker::new(GuardPolicy::default()));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || guard.record_failure(IP))
            })
            .collect();

        let blocks = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|blocked| *blocked)
            .count();

        assert_eq!(blocks, 1);
        assert!(guard.is_blocked(IP));
    }
}
