pub mod formatting;
pub mod identity;

// Re-exports for convenience
pub use identity::{Identity, IdentityKey, UserMeta};
