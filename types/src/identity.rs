//! Canonical participant identity.
//!
//! Every participant maps to exactly one [`IdentityKey`]. The key is the
//! platform-assigned numeric id when known; until then a provisional key is
//! synthesized from the lower-cased handle (`handle:<name>`). A handle is an
//! index into the key space, never a second primary key: once the numeric id
//! for a handle becomes known, the provisional record is merged into the
//! numeric one by the counter store.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// String prefix for provisional handle-derived keys.
pub const PROVISIONAL_PREFIX: &str = "handle:";

/// Stable key for one participant.
///
/// Serializes to a plain string (`"555"` / `"handle:bob"`) so it can be used
/// directly as a JSON map key in the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    /// Platform-assigned numeric id.
    User(i64),
    /// Provisional key derived from a lower-cased handle.
    Handle(String),
}

impl IdentityKey {
    /// Synthesize a provisional key from a handle (with or without `@`).
    pub fn from_handle(handle: &str) -> Self {
        IdentityKey::Handle(handle.trim_start_matches('@').to_lowercase())
    }

    /// `true` for handle-derived keys that may later be superseded by a
    /// numeric id.
    pub fn is_provisional(&self) -> bool {
        matches!(self, IdentityKey::Handle(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::User(id) => write!(f, "{id}"),
            IdentityKey::Handle(handle) => write!(f, "{PROVISIONAL_PREFIX}{handle}"),
        }
    }
}

/// Error returned when a string is neither a numeric id nor a
/// `handle:<name>` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError(String);

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid identity key: {:?}", self.0)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for IdentityKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(handle) = s.strip_prefix(PROVISIONAL_PREFIX) {
            if handle.is_empty() {
                return Err(ParseKeyError(s.to_string()));
            }
            return Ok(IdentityKey::Handle(handle.to_lowercase()));
        }
        s.parse::<i64>()
            .map(IdentityKey::User)
            .map_err(|_| ParseKeyError(s.to_string()))
    }
}

impl Serialize for IdentityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = IdentityKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a numeric id or a \"handle:<name>\" key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

/// A platform user snapshot carried by structural references
/// (reply author, forward author, mention entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeta {
    pub id: i64,
    /// Platform username without the `@` prefix.
    pub handle: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl UserMeta {
    /// Human-readable label: `@handle`, else "First Last", else first name,
    /// else a numeric fallback.
    pub fn display_name(&self) -> String {
        if let Some(handle) = &self.handle {
            return format!("@{handle}");
        }
        match (&self.first_name, &self.last_name) {
            (first, Some(last)) if !first.is_empty() => format!("{first} {last}"),
            (first, _) if !first.is_empty() => first.clone(),
            _ => format!("user {}", self.id),
        }
    }
}

/// Canonical identity descriptor produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: IdentityKey,
    /// Case-insensitive unique-ish label, when known.
    pub handle: Option<String>,
    /// Most-recently-observed human-readable label.
    pub display_name: String,
}

impl Identity {
    /// Exact identity from a structural platform reference.
    pub fn from_user(user: &UserMeta) -> Self {
        Identity {
            key: IdentityKey::User(user.id),
            handle: user.handle.clone(),
            display_name: user.display_name(),
        }
    }

    /// Provisional identity for a handle with no known numeric id.
    pub fn provisional(handle: &str) -> Self {
        let handle = handle.trim_start_matches('@');
        Identity {
            key: IdentityKey::from_handle(handle),
            handle: Some(handle.to_string()),
            display_name: format!("@{handle}"),
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.key.is_provisional()
    }
}
