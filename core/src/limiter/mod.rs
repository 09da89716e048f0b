//! Per-actor cooldown and violation tracking.
//!
//! Cooldowns and violations are fully independent namespaces: an actor can
//! be on cooldown for hits while free to run query commands, and violation
//! bookkeeping never delays an allowed action. All operations are total
//! functions over the in-memory maps; there are no error paths here.
//!
//! Escalation is the caller's job: when a denial pushes the violation count
//! past the configured threshold, the caller applies a time-bounded
//! restriction and then calls [`RateLimiter::reset_violations`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::LimiterConfig;


/// Classes of rate-limited actions, each with its own cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    /// The primary game action.
    Hit,
    /// Stats/leaderboard/any other query.
    Command,
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// The actor is still on the clock from a previous allowed action.
    /// Carries the post-increment violation count so the caller can compare
    /// against its escalation threshold without a second call.
    Denied {
        retry_after: Duration,
        violations: u32,
    },
}

#[derive(Debug, Clone)]
struct ViolationEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory rate limiter keyed by `(actor, action class)`.
#[derive(Debug)]
pub struct RateLimiter {
    config: LimiterConfig,
    cooldowns: HashMap<(i64, ActionClass), Instant>,
    violations: HashMap<i64, ViolationEntry>,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            cooldowns: HashMap::new(),
            violations: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Gate one action. `Allowed` refreshes the actor's cooldown stamp for
    /// that class; `Denied` leaves the stamp untouched and records a
    /// violation.
    pub fn check_and_consume(&mut self, actor: i64, class: ActionClass) -> Decision {
        self.check_and_consume_at(actor, class, Instant::now())
    }

    fn check_and_consume_at(&mut self, actor: i64, class: ActionClass, now: Instant) -> Decision {
        let window = self.cooldown_for(class);
        if let Some(&last) = self.cooldowns.get(&(actor, class)) {
            let elapsed = now.duration_since(last);
            if elapsed < window {
                let violations = self.record_violation_at(actor, now);
                return Decision::Denied {
                    retry_after: window - elapsed,
                    violations,
                };
            }
        }
        self.cooldowns.insert((actor, class), now);
        self.sweep_expired(now);
        Decision::Allowed
    }

    /// Record one cooldown violation, returning the post-increment count.
    /// A window that has expired since the first violation starts over at 1.
    pub fn record_violation(&mut self, actor: i64) -> u32 {
        self.record_violation_at(actor, Instant::now())
    }

    fn record_violation_at(&mut self, actor: i64, now: Instant) -> u32 {
        match self.violations.get_mut(&actor) {
            Some(entry)
                if now.duration_since(entry.window_start) <= self.config.violation_reset =>
            {
                entry.count += 1;
                entry.count
            }
            _ => {
                self.violations.insert(
                    actor,
                    ViolationEntry {
                        count: 1,
                        window_start: now,
                    },
                );
                1
            }
        }
    }

    /// Current violation count. An expired window reads as zero and the
    /// stale entry is purged.
    pub fn violation_count(&mut self, actor: i64) -> u32 {
        self.violation_count_at(actor, Instant::now())
    }

    fn violation_count_at(&mut self, actor: i64, now: Instant) -> u32 {
        match self.violations.get(&actor) {
            Some(entry)
                if now.duration_since(entry.window_start) <= self.config.violation_reset =>
            {
                entry.count
            }
            Some(_) => {
                self.violations.remove(&actor);
                0
            }
            None => 0,
        }
    }

    /// Unconditional clear, used after a penalty has been applied.
    pub fn reset_violations(&mut self, actor: i64) {
        self.violations.remove(&actor);
    }

    fn cooldown_for(&self, class: ActionClass) -> Duration {
        match class {
            ActionClass::Hit => self.config.hit_cooldown,
            ActionClass::Command => self.config.command_cooldown,
        }
    }

    /// Lazy sweep: drop cooldown stamps older than the longest configured
    /// window. Runs on every allowed action so the map stays bounded.
    fn sweep_expired(&mut self, now: Instant) {
        let horizon = self.config.hit_cooldown.max(self.config.command_cooldown);
        self.cooldowns
            .retain(|_, last| now.duration_since(*last) <= horizon);
    }
}
