//! hitball-core - the hit-game engine.
//!
//! Three subsystems carry all the interesting invariants:
//! - [`limiter`]: per-actor, per-action-class cooldowns with escalating
//!   violation tracking
//! - [`resolver`]: turns ambiguous message references (reply, forward,
//!   mention, `@name`, numeric id) into canonical identities
//! - [`store`]: the durable, rank-queryable counter store with provisional
//!   identity reconciliation
//!
//! [`game`] glues them together behind a single entry point; the chat
//! transport and command dispatch live outside this crate and talk to it
//! through the [`resolver::ContextLookup`] and
//! [`store::storage::SnapshotStorage`] traits.

pub mod config;
pub mod game;
pub mod limiter;
pub mod progress;
pub mod resolver;
pub mod store;

// Re-exports for convenience
pub use config::BotConfig;
pub use game::{CommandGate, GameEngine, HitOutcome};
pub use hitball_types::{Identity, IdentityKey, UserMeta};
pub use limiter::{ActionClass, Decision, RateLimiter};
pub use resolver::{ContextLookup, IdentityResolver, LookupQuery, MessageRefs, TargetRef};
pub use store::storage::{JsonFileStorage, SnapshotStorage, StorageError};
pub use store::{CounterRecord, CounterStore, StoreSnapshot};
