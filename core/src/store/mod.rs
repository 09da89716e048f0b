//! Durable, rank-queryable hit counter store.
//!
//! The whole store is one snapshot: loaded once at startup and rewritten in
//! full on every mutating call. At this scale (low thousands of records)
//! the full rewrite is the simplest model that guarantees the count a
//! mutation returns is already durable. A write failure leaves the
//! in-memory state correct but not yet durable; the next successful write
//! carries all pending changes.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use hitball_types::{Identity, IdentityKey};
use serde::{Deserialize, Serialize};

pub mod storage;


use storage::{SnapshotStorage, StorageError};

/// One participant's durable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Most-recently-observed human-readable label.
    pub display_name: String,

    /// Platform username without `@`, when known. An index into the key
    /// space, not a second primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,

    pub count: u64,
    pub first_event_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,

    /// Set at most once, never cleared.
    #[serde(default)]
    pub bounce_achieved: bool,

    /// Creation order, the stable ranking tie-break.
    #[serde(default)]
    pub seq: u64,
}

impl CounterRecord {
    pub(crate) fn new(identity: &Identity, now: DateTime<Utc>, seq: u64) -> Self {
        Self {
            display_name: identity.display_name.clone(),
            handle: identity.handle.clone(),
            count: 0,
            first_event_at: now,
            last_event_at: now,
            bounce_achieved: false,
            seq,
        }
    }

    /// Refresh display metadata from a newer observation. Returns whether
    /// anything changed.
    fn refresh_from(&mut self, identity: &Identity) -> bool {
        let mut changed = false;
        if !identity.display_name.is_empty() && self.display_name != identity.display_name {
            self.display_name = identity.display_name.clone();
            changed = true;
        }
        if let Some(handle) = &identity.handle {
            if self.handle.as_deref() != Some(handle.as_str()) {
                self.handle = Some(handle.clone());
                changed = true;
            }
        }
        changed
    }
}

/// The full persisted state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub records: BTreeMap<IdentityKey, CounterRecord>,
    #[serde(default)]
    pub next_seq: u64,
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

/// Authoritative mapping from canonical identity to hit count, display
/// metadata, and one-time achievement flags.
#[derive(Debug)]
pub struct CounterStore<S> {
    storage: S,
    data: StoreSnapshot,
}

impl<S: SnapshotStorage> CounterStore<S> {
    /// Load the snapshot, initializing (and immediately persisting) an
    /// empty store when the durable target does not exist yet.
    pub async fn open(storage: S) -> Result<Self, StorageError> {
        match storage.load().await? {
            Some(data) => {
                tracing::info!(records = data.records.len(), "Loaded counter snapshot");
                Ok(Self { storage, data })
            }
            None => {
                tracing::info!("No counter snapshot found, initializing empty store");
                let mut store = Self {
                    storage,
                    data: StoreSnapshot::default(),
                };
                store.persist().await?;
                Ok(store)
            }
        }
    }

    /// Like [`CounterStore::open`], but a read failure degrades to an empty
    /// store instead of halting. Mutations after a corrupt read will
    /// overwrite the bad snapshot.
    pub async fn open_lossy(storage: S) -> Self {
        match storage.load().await {
            Ok(Some(data)) => {
                tracing::info!(records = data.records.len(), "Loaded counter snapshot");
                Self { storage, data }
            }
            Ok(None) => {
                tracing::info!("No counter snapshot found, initializing empty store");
                let mut store = Self {
                    storage,
                    data: StoreSnapshot::default(),
                };
                if let Err(e) = store.persist().await {
                    tracing::warn!(error = %e, "Failed to persist initial empty snapshot");
                }
                store
            }
            Err(e) => {
                tracing::warn!(error = %e, "Counter snapshot unreadable, starting empty");
                Self {
                    storage,
                    data: StoreSnapshot::default(),
                }
            }
        }
    }

    // --- Mutations ---

    /// Record one hit against `identity`, returning the post-increment
    /// count. Creates the record on first hit and refreshes display
    /// metadata on every hit.
    pub async fn record(&mut self, identity: &Identity) -> Result<u64, StorageError> {
        let now = Utc::now();
        let (record, _) = self.upsert(identity, now);
        record.count += 1;
        record.last_event_at = now;
        let count = record.count;
        self.persist().await?;
        Ok(count)
    }

    /// Create-or-refresh identity metadata without touching the count
    /// (write-through cache refresh used by the resolver). Persists only
    /// when something actually changed.
    pub async fn sync_identity(&mut self, identity: &Identity) -> Result<(), StorageError> {
        let now = Utc::now();
        let (_, changed) = self.upsert(identity, now);
        if changed {
            self.persist().await?;
        }
        Ok(())
    }

    /// Mark the one-time bounce achievement. Returns `true` only the first
    /// time for a given identity; subsequent calls do not re-persist.
    pub async fn mark_bounce_achieved(&mut self, identity: &Identity) -> Result<bool, StorageError> {
        let now = Utc::now();
        let (record, _) = self.upsert(identity, now);
        if record.bounce_achieved {
            return Ok(false);
        }
        record.bounce_achieved = true;
        self.persist().await?;
        Ok(true)
    }

    /// Merge a provisional handle-keyed record into the authoritative
    /// numeric record: counts add, `first_event_at` takes the earlier,
    /// the bounce flag is OR'd, and the provisional record is removed.
    /// One snapshot write commits both halves.
    pub async fn reconcile(
        &mut self,
        provisional: &IdentityKey,
        authoritative: &Identity,
    ) -> Result<(), StorageError> {
        if *provisional == authoritative.key {
            return self.sync_identity(authoritative).await;
        }
        let Some(orphan) = self.data.records.remove(provisional) else {
            return self.sync_identity(authoritative).await;
        };

        let now = Utc::now();
        let (record, _) = self.upsert(authoritative, now);
        record.count += orphan.count;
        record.first_event_at = record.first_event_at.min(orphan.first_event_at);
        record.last_event_at = record.last_event_at.max(orphan.last_event_at);
        record.bounce_achieved = record.bounce_achieved || orphan.bounce_achieved;

        tracing::info!(
            provisional = %provisional,
            authoritative = %authoritative.key,
            merged_count = orphan.count,
            "Reconciled provisional record"
        );
        self.persist().await
    }

    // --- Queries ---

    /// Hit count, zero for unknown identities.
    pub fn count(&self, key: &IdentityKey) -> u64 {
        self.data.records.get(key).map(|r| r.count).unwrap_or(0)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&CounterRecord> {
        self.data.records.get(key)
    }

    /// 1-based position in the descending-by-count ordering. Ties go to the
    /// earlier-created record so repeated queries stay deterministic.
    pub fn rank(&self, key: &IdentityKey) -> Option<usize> {
        self.ranked().iter().position(|(k, _)| *k == key).map(|i| i + 1)
    }

    /// Top `limit` records, descending by count with the same tie-break as
    /// [`CounterStore::rank`].
    pub fn leaderboard(&self, limit: usize) -> Vec<(&IdentityKey, &CounterRecord)> {
        let mut rows = self.ranked();
        rows.truncate(limit);
        rows
    }

    /// Case-insensitive exact match against the `handle` field of all
    /// records. Linear scan; the store stays in the low thousands.
    pub fn find_by_handle(&self, handle: &str) -> Option<&IdentityKey> {
        let needle = handle.trim_start_matches('@');
        self.data
            .records
            .iter()
            .find(|(_, record)| {
                record
                    .handle
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(needle))
            })
            .map(|(key, _)| key)
    }

    pub fn total_hits(&self) -> u64 {
        self.data.records.values().map(|r| r.count).sum()
    }

    pub fn record_count(&self) -> usize {
        self.data.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.records.is_empty()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.data.last_updated
    }

    // --- Internals ---

    /// Zero-count records exist (metadata sync creates them) but never
    /// rank.
    fn ranked(&self) -> Vec<(&IdentityKey, &CounterRecord)> {
        let mut rows: Vec<_> = self
            .data
            .records
            .iter()
            .filter(|(_, r)| r.count > 0)
            .collect();
        rows.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then(a.first_event_at.cmp(&b.first_event_at))
                .then(a.seq.cmp(&b.seq))
        });
        rows
    }

    /// Get-or-create the record for `identity`, refreshing display
    /// metadata. The bool reports whether anything changed (creation
    /// counts as a change).
    fn upsert(&mut self, identity: &Identity, now: DateTime<Utc>) -> (&mut CounterRecord, bool) {
        match self.data.records.entry(identity.key.clone()) {
            Entry::Vacant(vacant) => {
                let seq = self.data.next_seq;
                self.data.next_seq += 1;
                (vacant.insert(CounterRecord::new(identity, now, seq)), true)
            }
            Entry::Occupied(occupied) => {
                let record = occupied.into_mut();
                let changed = record.refresh_from(identity);
                (record, changed)
            }
        }
    }

    async fn persist(&mut self) -> Result<(), StorageError> {
        self.data.last_updated = Utc::now();
        self.storage.save(&self.data).await
    }
}
