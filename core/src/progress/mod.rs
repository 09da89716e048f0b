//! Milestones, achievements, and status tiers derived from counter state.
//!
//! Everything here is a pure function of a count (plus rank and the bounce
//! flag); nothing in this module mutates the store.

use serde::Serialize;

use hitball_types::IdentityKey;

use crate::store::CounterStore;
use crate::store::storage::SnapshotStorage;


/// Count thresholds worth celebrating, in ascending order.
pub const MILESTONES: [u64; 9] = [1, 5, 10, 25, 50, 100, 200, 500, 1_000];

/// A milestone reached by the hit that produced `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Milestone {
    /// The very first hit on this target.
    FirstHit,
    /// Exactly 50.
    HalfCentury,
    /// Exactly 100.
    Century,
    /// Any other multiple of ten.
    Tenth(u64),
}

/// Milestone announced for a hit that brought the target to `count`.
/// The named counts take priority over the generic every-tenth one.
pub fn milestone_for(count: u64) -> Option<Milestone> {
    match count {
        1 => Some(Milestone::FirstHit),
        50 => Some(Milestone::HalfCentury),
        100 => Some(Milestone::Century),
        n if n > 0 && n % 10 == 0 => Some(Milestone::Tenth(n)),
        _ => None,
    }
}

/// The next threshold above `count`, with how many hits remain to it.
/// `None` once every listed milestone has been passed.
pub fn next_milestone(count: u64) -> Option<(u64, u64)> {
    MILESTONES
        .iter()
        .find(|&&m| m > count)
        .map(|&m| (m, m - count))
}

/// Coarse condition label for a target, by total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTier {
    Untouched,
    Bruised,
    Battered,
    Wrecked,
    Veteran,
    Legendary,
}

impl StatusTier {
    pub fn for_count(count: u64) -> Self {
        match count {
            0 => StatusTier::Untouched,
            1..=5 => StatusTier::Bruised,
            6..=20 => StatusTier::Battered,
            21..=50 => StatusTier::Wrecked,
            51..=100 => StatusTier::Veteran,
            _ => StatusTier::Legendary,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Untouched => "untouched, a lucky one",
            StatusTier::Bruised => "lightly bruised, still in the fight",
            StatusTier::Battered => "battered, could use a break",
            StatusTier::Wrecked => "wrecked, a regular around here",
            StatusTier::Veteran => "a veteran victim, protection advised",
            StatusTier::Legendary => "legendary, beyond mortal concerns",
        }
    }
}

/// One unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub name: &'static str,
    pub description: &'static str,
}

const COUNT_ACHIEVEMENTS: [(u64, &str, &str); 8] = [
    (1, "First Blood", "took the first hit"),
    (5, "Lightly Roughed Up", "starting to feel the pressure"),
    (10, "Moderately Battered", "took a real beating"),
    (25, "Heavily Traumatized", "questioning life choices"),
    (50, "Half-Century Club", "hit fifty times"),
    (100, "Century Legend", "the most wanted target around"),
    (200, "Diamond Victim", "top-shelf punching bag"),
    (500, "Crown of Thorns", "the hits just keep coming"),
];

/// All achievements unlocked at the given count, leaderboard rank, and
/// bounce flag. Order is stable: count tiers ascending, then rank, then
/// bounce.
pub fn unlocked(count: u64, rank: Option<usize>, bounce: bool) -> Vec<Achievement> {
    let mut out = Vec::new();
    for (threshold, name, description) in COUNT_ACHIEVEMENTS {
        if count >= threshold {
            out.push(Achievement { name, description });
        }
    }
    match rank {
        Some(1) => out.push(Achievement {
            name: "Public Enemy No. 1",
            description: "top of the leaderboard",
        }),
        Some(2) => out.push(Achievement {
            name: "Second Target",
            description: "second on the leaderboard",
        }),
        Some(3) => out.push(Achievement {
            name: "Bronze Punching Bag",
            description: "third on the leaderboard",
        }),
        _ => {}
    }
    if matches!(rank, Some(r) if r <= 10) {
        out.push(Achievement {
            name: "Top Ten Regular",
            description: "holding a top-10 leaderboard spot",
        });
    }
    if bounce {
        out.push(Achievement {
            name: "Bot Challenger",
            description: "attacked the bot and ate the rebound",
        });
    }
    out
}

/// Read-only stat sheet for one identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    pub display_name: String,
    pub count: u64,
    pub rank: Option<usize>,
    pub tier: StatusTier,
    pub achievements: Vec<Achievement>,
    pub next_milestone: Option<(u64, u64)>,
}

/// Assemble the full stat sheet for `key`. Unknown identities get a
/// zero-count sheet with no rank.
pub fn stats_for<S: SnapshotStorage>(store: &CounterStore<S>, key: &IdentityKey) -> PlayerStats {
    let record = store.get(key);
    let count = record.map(|r| r.count).unwrap_or(0);
    let rank = store.rank(key);
    let bounce = record.map(|r| r.bounce_achieved).unwrap_or(false);
    let display_name = record
        .map(|r| r.display_name.clone())
        .unwrap_or_else(|| key.to_string());

    PlayerStats {
        display_name,
        count,
        rank,
        tier: StatusTier::for_count(count),
        achievements: unlocked(count, rank, bounce),
        next_milestone: next_milestone(count),
    }
}
