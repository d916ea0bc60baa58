//! Attempt rate limiting for credentialed endpoints.
//!
//! The store is an injectable trait so a single-instance deployment can use
//! the in-memory map while a multi-instance one can bring an external
//! key-value store. The in-memory limiter is process-local and resets on
//! restart; that weak guarantee is accepted, not a bug.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of one `check` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Duration,
}

/// Narrow check/reset contract over attempt state.
pub trait RateLimitStore: Send + Sync {
    /// Record one attempt for `identifier` and decide whether it is allowed.
    fn check(&self, identifier: &str) -> RateLimitDecision;

    /// Clear attempt state for `identifier` (after a successful credential
    /// check).
    fn reset(&self, identifier: &str);
}

#[derive(Debug, Clone, Copy)]
struct AttemptEntry {
    count: u32,
    reset_at: Instant,
}

/// Mutex-guarded in-memory attempt table.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    max_attempts: u32,
    window: Duration,
    entries: Mutex<HashMap<String, AttemptEntry>>,
}

/// Share of checks that also prune expired entries, bounding table growth
/// without a background task.
const PRUNE_PROBABILITY: f64 = 0.01;

impl InMemoryRateLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, identifier: &str, now: Instant) -> RateLimitDecision {
        // A zero budget blocks everything; no entry needs recording.
        if self.max_attempts == 0 {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in: self.window,
            };
        }

        let mut entries = self.entries.lock().expect("rate limit table poisoned");

        if rand::random::<f64>() < PRUNE_PROBABILITY {
            entries.retain(|_, entry| now < entry.reset_at);
        }

        match entries.get_mut(identifier) {
            Some(entry) if now < entry.reset_at => {
                if entry.count >= self.max_attempts {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in: entry.reset_at - now,
                    };
                }
                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_attempts.saturating_sub(entry.count),
                    reset_in: entry.reset_at - now,
                }
            }
            _ => {
                entries.insert(
                    identifier.to_string(),
                    AttemptEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_attempts.saturating_sub(1),
                    reset_in: self.window,
                }
            }
        }
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Instant::now())
    }

    fn reset(&self, identifier: &str) {
        self.entries
            .lock()
            .expect("rate limit table poisoned")
            .remove(identifier);
    }
}
