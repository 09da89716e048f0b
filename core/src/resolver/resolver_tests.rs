use std::collections::HashMap;

use hitball_types::{Identity, IdentityKey, UserMeta};

use super::*;
use crate::store::CounterStore;
use crate::store::storage::MemoryStorage;

fn user(id: i64, handle: Option<&str>, first: &str) -> UserMeta {
    UserMeta {
        id,
        handle: handle.map(str::to_owned),
        first_name: first.to_owned(),
        last_name: None,
    }
}

/// Canned platform directory keyed by id and lower-cased handle.
#[derive(Default)]
struct StubLookup {
    by_id: HashMap<i64, UserMeta>,
    by_handle: HashMap<String, UserMeta>,
}

impl StubLookup {
    fn with(users: &[UserMeta]) -> Self {
        let mut stub = Self::default();
        for u in users {
            stub.by_id.insert(u.id, u.clone());
            if let Some(handle) = &u.handle {
                stub.by_handle.insert(handle.to_lowercase(), u.clone());
            }
        }
        stub
    }
}

impl ContextLookup for StubLookup {
    async fn lookup_person(&self, _chat_id: i64, query: LookupQuery<'_>) -> Option<UserMeta> {
        match query {
            LookupQuery::Id(id) => self.by_id.get(&id).cloned(),
            LookupQuery::Handle(handle) => self.by_handle.get(&handle.to_lowercase()).cloned(),
        }
    }
}

async fn empty_store() -> CounterStore<MemoryStorage> {
    CounterStore::open(MemoryStorage::default()).await.unwrap()
}

// --- Target extraction ---

#[test]
fn test_reply_outranks_everything() {
    let msg = MessageRefs {
        reply_author: Some(user(1, None, "Reply")),
        forward_author: Some(user(2, None, "Forward")),
        mention: Some(user(3, None, "Mention")),
        text: "@textual".to_owned(),
    };
    assert_eq!(
        TargetRef::from_message(&msg),
        Some(TargetRef::Reply(user(1, None, "Reply")))
    );
}

#[test]
fn test_forward_outranks_mention_and_text() {
    let msg = MessageRefs {
        forward_author: Some(user(2, None, "Forward")),
        mention: Some(user(3, None, "Mention")),
        text: "@textual".to_owned(),
        ..Default::default()
    };
    assert_eq!(
        TargetRef::from_message(&msg),
        Some(TargetRef::Forward(user(2, None, "Forward")))
    );
}

#[test]
fn test_text_tokens() {
    assert_eq!(
        TargetRef::from_text("smack @Bob_99 please"),
        Some(TargetRef::HandleToken("Bob_99".to_owned()))
    );
    assert_eq!(
        TargetRef::from_text("get 123456789"),
        Some(TargetRef::IdToken(123_456_789))
    );
    // Short numbers read as scores, not ids
    assert_eq!(TargetRef::from_text("up to 42 now"), None);
    // Punctuation invalidates a handle token
    assert_eq!(TargetRef::from_text("@bob! hi"), None);
    assert_eq!(TargetRef::from_text("@"), None);
    assert_eq!(TargetRef::from_text("no target here"), None);
    assert_eq!(TargetRef::from_text(""), None);
}

#[test]
fn test_first_usable_token_wins() {
    assert_eq!(
        TargetRef::from_text("hey 99 @first @second"),
        Some(TargetRef::HandleToken("first".to_owned()))
    );
}

// --- Resolution ---

#[tokio::test]
async fn test_structural_reference_resolves_and_syncs() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;
    let bob = user(555, Some("bob"), "Bob");

    let identity = resolver
        .resolve(-100, &TargetRef::Reply(bob.clone()), &mut store)
        .await
        .unwrap();

    assert_eq!(identity.key, IdentityKey::User(555));
    assert_eq!(identity.display_name, "@bob");
    // Metadata was written through to the store
    assert_eq!(
        store.get(&IdentityKey::User(555)).unwrap().handle.as_deref(),
        Some("bob")
    );
}

#[tokio::test]
async fn test_id_token_resolves_via_lookup() {
    let bob = user(123_456, Some("bob"), "Bob");
    let resolver = IdentityResolver::new(StubLookup::with(std::slice::from_ref(&bob)));
    let mut store = empty_store().await;

    let identity = resolver
        .resolve(-100, &TargetRef::IdToken(123_456), &mut store)
        .await
        .unwrap();
    assert_eq!(identity.key, IdentityKey::User(123_456));
}

#[tokio::test]
async fn test_id_token_falls_back_to_store_record() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;

    let bob = Identity::from_user(&user(123_456, Some("bob"), "Bob"));
    store.record(&bob).await.unwrap();

    let identity = resolver
        .resolve(-100, &TargetRef::IdToken(123_456), &mut store)
        .await
        .unwrap();
    assert_eq!(identity.key, IdentityKey::User(123_456));
    assert_eq!(identity.display_name, "@bob");
}

#[tokio::test]
async fn test_unknown_id_token_does_not_resolve() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;

    assert!(
        resolver
            .resolve(-100, &TargetRef::IdToken(123_456), &mut store)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_handle_token_prefers_store_record() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;

    let bob = Identity::from_user(&user(555, Some("Bob"), "Bob"));
    store.record(&bob).await.unwrap();

    let identity = resolver
        .resolve(-100, &TargetRef::HandleToken("bob".to_owned()), &mut store)
        .await
        .unwrap();
    assert_eq!(identity.key, IdentityKey::User(555));
}

#[tokio::test]
async fn test_unknown_handle_becomes_provisional() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;

    let identity = resolver
        .resolve(-100, &TargetRef::HandleToken("Ghost".to_owned()), &mut store)
        .await
        .unwrap();

    assert!(identity.is_provisional());
    assert_eq!(identity.key, IdentityKey::from_handle("ghost"));
    assert_eq!(identity.display_name, "@Ghost");
}

#[tokio::test]
async fn test_confirmed_sighting_merges_provisional_record() {
    let resolver = IdentityResolver::new(StubLookup::default());
    let mut store = empty_store().await;

    // Two hits land while bob is only known by handle
    let ghost = Identity::provisional("bob");
    store.record(&ghost).await.unwrap();
    store.record(&ghost).await.unwrap();

    // Bob then posts a message someone replies to
    let bob = user(555, Some("bob"), "Bob");
    let identity = resolver
        .resolve(-100, &TargetRef::Reply(bob), &mut store)
        .await
        .unwrap();

    assert_eq!(identity.key, IdentityKey::User(555));
    assert!(store.get(&IdentityKey::from_handle("bob")).is_none());
    assert_eq!(store.count(&IdentityKey::User(555)), 2);
}
