//! The game engine: one place that wires the limiter, resolver, and store
//! into the hit flow.
//!
//! The engine owns policy the individual components stay agnostic of:
//! violation escalation into a mute, the self-hit rule, and the bounce rule
//! for attacks aimed at the bot itself.

use std::time::Duration;

use hitball_types::{Identity, IdentityKey, UserMeta};

use crate::config::BotConfig;
use crate::limiter::{ActionClass, Decision, RateLimiter};
use crate::progress::{Milestone, milestone_for};
use crate::resolver::{ContextLookup, IdentityResolver, MessageRefs, TargetRef};
use crate::store::CounterStore;
use crate::store::storage::{SnapshotStorage, StorageError};


/// What happened to one hit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    /// The actor is on cooldown. `mute` is set when this denial crossed the
    /// violation threshold; the caller applies the restriction.
    RateLimited {
        retry_after: Duration,
        violations: u32,
        mute: Option<Duration>,
    },
    /// Nothing in the message named a resolvable target.
    NoTarget,
    /// The actor aimed at themselves.
    SelfHit,
    /// The actor aimed at the bot; the hit rebounds onto the actor.
    Bounced { count: u64, first_bounce: bool },
    /// A normal landed hit.
    Hit {
        target: Identity,
        count: u64,
        milestone: Option<Milestone>,
    },
}

/// Outcome of gating a query command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGate {
    Allowed,
    /// On cooldown; `mute` set when the denial crossed the threshold.
    Throttled {
        retry_after: Duration,
        mute: Option<Duration>,
    },
}

/// Coordinates one chat game: rate limiting, target resolution, counting,
/// and persistence.
#[derive(Debug)]
pub struct GameEngine<S, L> {
    store: CounterStore<S>,
    limiter: RateLimiter,
    resolver: IdentityResolver<L>,
    bot: UserMeta,
    config: BotConfig,
}

impl<S: SnapshotStorage, L: ContextLookup> GameEngine<S, L> {
    pub fn new(config: BotConfig, store: CounterStore<S>, lookup: L, bot: UserMeta) -> Self {
        let limiter = RateLimiter::new(config.limiter());
        Self {
            store,
            limiter,
            resolver: IdentityResolver::new(lookup),
            bot,
            config,
        }
    }

    /// Process one hit command. Storage errors surface only from the final
    /// count write; rate limiting and resolution never fail.
    pub async fn handle_hit(
        &mut self,
        chat_id: i64,
        actor: &UserMeta,
        msg: &MessageRefs,
    ) -> Result<HitOutcome, StorageError> {
        if let Some((retry_after, violations, mute)) = self.gate(actor.id, ActionClass::Hit) {
            tracing::debug!(
                actor = actor.id,
                violations,
                muted = mute.is_some(),
                "Hit attempt rate limited"
            );
            return Ok(HitOutcome::RateLimited {
                retry_after,
                violations,
                mute,
            });
        }

        // Confirming the actor first keeps their record fresh and lets a
        // textual reference to their own handle resolve to their numeric
        // key, so the self-hit check below is a plain key comparison.
        let attacker = self.resolver.confirm(actor, &mut self.store).await;

        let Some(target_ref) = TargetRef::from_message(msg) else {
            return Ok(HitOutcome::NoTarget);
        };
        let Some(target) = self.resolver.resolve(chat_id, &target_ref, &mut self.store).await
        else {
            return Ok(HitOutcome::NoTarget);
        };

        if target.key == attacker.key {
            return Ok(HitOutcome::SelfHit);
        }

        // Attacks on the bot rebound onto the attacker.
        if target.key == IdentityKey::User(self.bot.id) {
            let first_bounce = self.store.mark_bounce_achieved(&attacker).await?;
            let count = self.store.record(&attacker).await?;
            tracing::info!(attacker = actor.id, count, first_bounce, "Hit bounced");
            return Ok(HitOutcome::Bounced { count, first_bounce });
        }

        let count = self.store.record(&target).await?;
        tracing::info!(actor = actor.id, target = %target.key, count, "Hit landed");
        Ok(HitOutcome::Hit {
            milestone: milestone_for(count),
            target,
            count,
        })
    }

    /// Gate a stats/leaderboard/any other query command.
    pub fn gate_command(&mut self, actor_id: i64) -> CommandGate {
        match self.gate(actor_id, ActionClass::Command) {
            None => CommandGate::Allowed,
            Some((retry_after, _, mute)) => CommandGate::Throttled { retry_after, mute },
        }
    }

    pub fn store(&self) -> &CounterStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CounterStore<S> {
        &mut self.store
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run the limiter and apply escalation. Returns `None` when allowed;
    /// on a threshold-crossing denial the violation slate is wiped so the
    /// next offense starts a fresh window after the mute.
    fn gate(&mut self, actor_id: i64, class: ActionClass) -> Option<(Duration, u32, Option<Duration>)> {
        match self.limiter.check_and_consume(actor_id, class) {
            Decision::Allowed => None,
            Decision::Denied {
                retry_after,
                violations,
            } => {
                let mute = (violations >= self.config.max_violations).then(|| {
                    self.limiter.reset_violations(actor_id);
                    self.config.mute_duration()
                });
                Some((retry_after, violations, mute))
            }
        }
    }
}
