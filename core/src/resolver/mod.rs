//! Target resolution: from message structure or free text to a canonical
//! identity.
//!
//! Structural references (reply, forward, entity mention) carry full user
//! metadata and always resolve. Text tokens are best-effort: a numeric id
//! is confirmed against the platform or the store, and a bare `@handle`
//! falls back to a provisional handle-keyed identity that gets merged once
//! the real id is learned.

use hitball_types::{Identity, IdentityKey, UserMeta};

use crate::store::CounterStore;
use crate::store::storage::SnapshotStorage;

#[cfg(test)]
mod resolver_tests;

/// Minimum digits for a bare number in text to be read as a user id.
/// Shorter numbers are far more likely to be hit counts or scores quoted
/// in conversation.
const MIN_ID_DIGITS: usize = 5;

/// The structured parts of an incoming message that can name a target.
#[derive(Debug, Default, Clone)]
pub struct MessageRefs {
    /// Author of the message being replied to.
    pub reply_author: Option<UserMeta>,
    /// Original author of a forwarded message.
    pub forward_author: Option<UserMeta>,
    /// First user-entity mention embedded in the message.
    pub mention: Option<UserMeta>,
    /// Message text after the command itself.
    pub text: String,
}

/// A raw target reference extracted from a message, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetRef {
    /// Reply-to author (strongest signal).
    Reply(UserMeta),
    /// Forwarded-from author.
    Forward(UserMeta),
    /// Entity mention with attached metadata.
    Mention(UserMeta),
    /// Bare numeric id found in text.
    IdToken(i64),
    /// Bare `@handle` found in text, without the `@`.
    HandleToken(String),
}

impl TargetRef {
    /// Extract the highest-precedence target reference from a message:
    /// reply, then forward, then entity mention, then the first usable
    /// text token.
    pub fn from_message(msg: &MessageRefs) -> Option<Self> {
        if let Some(user) = &msg.reply_author {
            return Some(Self::Reply(user.clone()));
        }
        if let Some(user) = &msg.forward_author {
            return Some(Self::Forward(user.clone()));
        }
        if let Some(user) = &msg.mention {
            return Some(Self::Mention(user.clone()));
        }
        Self::from_text(&msg.text)
    }

    /// Scan free text for the first token that looks like a target.
    pub fn from_text(text: &str) -> Option<Self> {
        text.split_whitespace().find_map(Self::classify_token)
    }

    fn classify_token(token: &str) -> Option<Self> {
        if let Some(handle) = token.strip_prefix('@') {
            let valid = !handle.is_empty()
                && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            return valid.then(|| Self::HandleToken(handle.to_owned()));
        }
        if token.len() >= MIN_ID_DIGITS && token.chars().all(|c| c.is_ascii_digit()) {
            return token.parse().ok().map(Self::IdToken);
        }
        None
    }
}

/// A question for the platform: who is this id or handle, in this chat?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupQuery<'a> {
    Id(i64),
    Handle(&'a str),
}

/// Platform-side membership lookup. `None` means the platform does not
/// know (or will not say); resolution then falls back to the store.
#[allow(async_fn_in_trait)]
pub trait ContextLookup {
    async fn lookup_person(&self, chat_id: i64, query: LookupQuery<'_>) -> Option<UserMeta>;
}

/// Resolves [`TargetRef`]s to canonical identities, keeping the counter
/// store's display metadata fresh as a side effect.
#[derive(Debug)]
pub struct IdentityResolver<L> {
    lookup: L,
}

impl<L: ContextLookup> IdentityResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve a target reference to an identity. Returns `None` only when
    /// a text token cannot be matched to any known person; structural
    /// references always resolve.
    ///
    /// Resolution never fails on storage trouble: metadata sync and
    /// provisional reconciliation are best-effort, logged and dropped.
    pub async fn resolve<S: SnapshotStorage>(
        &self,
        chat_id: i64,
        target: &TargetRef,
        store: &mut CounterStore<S>,
    ) -> Option<Identity> {
        match target {
            TargetRef::Reply(user) | TargetRef::Forward(user) | TargetRef::Mention(user) => {
                Some(self.confirm(user, store).await)
            }
            TargetRef::IdToken(id) => {
                if let Some(user) = self.lookup.lookup_person(chat_id, LookupQuery::Id(*id)).await {
                    return Some(self.confirm(&user, store).await);
                }
                // Not resolvable live, but a past hit may have left a record
                let key = IdentityKey::User(*id);
                store.get(&key).map(|record| Identity {
                    key,
                    handle: record.handle.clone(),
                    display_name: record.display_name.clone(),
                })
            }
            TargetRef::HandleToken(handle) => {
                if let Some(key) = store.find_by_handle(handle).cloned() {
                    if let IdentityKey::User(id) = key {
                        let record = store.get(&IdentityKey::User(id))?;
                        return Some(Identity {
                            key: IdentityKey::User(id),
                            handle: record.handle.clone(),
                            display_name: record.display_name.clone(),
                        });
                    }
                    // Known, but still only by handle
                    return Some(Identity::provisional(handle));
                }
                if let Some(user) = self
                    .lookup
                    .lookup_person(chat_id, LookupQuery::Handle(handle))
                    .await
                {
                    return Some(self.confirm(&user, store).await);
                }
                // Unknown everywhere: track under the handle until the real
                // id shows up
                Some(Identity::provisional(handle))
            }
        }
    }

    /// A confirmed sighting of a real user: adopt their numeric identity,
    /// merge any provisional record held under their handle, and refresh
    /// stored metadata. Also the entry point for actors, whose metadata is
    /// always structurally known.
    pub async fn confirm<S: SnapshotStorage>(
        &self,
        user: &UserMeta,
        store: &mut CounterStore<S>,
    ) -> Identity {
        let identity = Identity::from_user(user);

        let provisional = identity
            .handle
            .as_deref()
            .map(IdentityKey::from_handle)
            .filter(|key| store.get(key).is_some());

        let result = match provisional {
            Some(key) => store.reconcile(&key, &identity).await,
            None => store.sync_identity(&identity).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, key = %identity.key, "Failed to sync resolved identity");
        }
        identity
    }
}
