//! Tests for directory lookups and seller resolution.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::sync::Arc;

use rstest::{fixture, rstest};

use crate::directory::adapters::memory::{
    InMemoryPropertyDirectory, InMemorySessionDirectory, InMemoryUserDirectory,
};
use crate::directory::domain::{AccountRole, OwnerRef, PropertyRecord, UserProfile};
use crate::directory::ports::{
    DirectoryError, MockPropertyDirectory, SessionDirectory, UserDirectory,
};
use crate::directory::services::{IdentityResolver, ResolveError};
use crate::messaging::domain::{PropertyId, UserId};

fn property_id(id: &str) -> PropertyId {
    PropertyId::new(id).expect("valid property id")
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn record(id: &str) -> PropertyRecord {
    PropertyRecord {
        id: property_id(id),
        title: format!("Listing {id}"),
        owner: None,
        seller: None,
        user: None,
    }
}

#[fixture]
fn properties() -> Arc<InMemoryPropertyDirectory> {
    Arc::new(InMemoryPropertyDirectory::new())
}

#[rstest]
#[case::current_generation(|r: &mut PropertyRecord| r.owner = Some(OwnerRef::Id("owner-1".into())))]
#[case::legacy_seller(|r: &mut PropertyRecord| r.seller = Some(OwnerRef::Id("owner-1".into())))]
#[case::oldest_user_field(|r: &mut PropertyRecord| r.user = Some(OwnerRef::Id("owner-1".into())))]
#[case::embedded_document(|r: &mut PropertyRecord| {
    r.owner = Some(OwnerRef::Embedded { id: "owner-1".into() });
})]
#[tokio::test(flavor = "multi_thread")]
async fn every_owner_encoding_resolves_to_the_same_identity(
    properties: Arc<InMemoryPropertyDirectory>,
    #[case] encode: fn(&mut PropertyRecord),
) {
    let mut listing = record("prop-1");
    encode(&mut listing);
    properties.upsert(listing).expect("upsert should succeed");

    let resolver = IdentityResolver::new(Arc::clone(&properties));
    let seller = resolver
        .resolve_seller(&property_id("prop-1"))
        .await
        .expect("resolution should succeed");
    assert_eq!(seller, user("owner-1"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_owner_field_wins_over_legacy_fields(properties: Arc<InMemoryPropertyDirectory>) {
    let mut listing = record("prop-1");
    listing.owner = Some(OwnerRef::Id("current".into()));
    listing.seller = Some(OwnerRef::Id("stale".into()));
    properties.upsert(listing).expect("upsert should succeed");

    let resolver = IdentityResolver::new(properties);
    let seller = resolver
        .resolve_seller(&property_id("prop-1"))
        .await
        .expect("resolution should succeed");
    assert_eq!(seller, user("current"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_blank_owner_falls_through_to_the_next_field(
    properties: Arc<InMemoryPropertyDirectory>,
) {
    let mut listing = record("prop-1");
    listing.owner = Some(OwnerRef::Id("   ".into()));
    listing.seller = Some(OwnerRef::Id("fallback".into()));
    properties.upsert(listing).expect("upsert should succeed");

    let resolver = IdentityResolver::new(properties);
    let seller = resolver
        .resolve_seller(&property_id("prop-1"))
        .await
        .expect("resolution should succeed");
    assert_eq!(seller, user("fallback"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_property_and_missing_owner_are_distinct_failures(
    properties: Arc<InMemoryPropertyDirectory>,
) {
    properties
        .upsert(record("prop-ownerless"))
        .expect("upsert should succeed");
    let resolver = IdentityResolver::new(properties);

    let absent = resolver.resolve_seller(&property_id("prop-missing")).await;
    assert!(matches!(absent, Err(ResolveError::PropertyNotFound(_))));

    let ownerless = resolver.resolve_seller(&property_id("prop-ownerless")).await;
    assert!(matches!(ownerless, Err(ResolveError::MissingOwner(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_failures_are_propagated() {
    let mut mock = MockPropertyDirectory::new();
    mock.expect_find_property()
        .returning(|_| Err(DirectoryError::connection("directory offline")));

    let resolver = IdentityResolver::new(Arc::new(mock));
    let result = resolver.resolve_seller(&property_id("prop-1")).await;
    assert!(matches!(result, Err(ResolveError::Directory(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profiles_round_trip_and_flag_admins() {
    let users = InMemoryUserDirectory::new();
    users
        .upsert(UserProfile::new(user("admin-1"), "Support", AccountRole::Admin))
        .expect("upsert should succeed");

    let profile = users
        .find_profile(&user("admin-1"))
        .await
        .expect("lookup should succeed")
        .expect("profile exists");
    assert!(profile.is_admin());

    let missing = users
        .find_profile(&user("ghost"))
        .await
        .expect("lookup should succeed");
    assert!(missing.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_resolve_only_issued_tokens() {
    let sessions = InMemorySessionDirectory::new();
    sessions
        .issue("token-abc", user("buyer-1"))
        .expect("issue should succeed");

    let resolved = sessions
        .resolve_token("token-abc")
        .await
        .expect("lookup should succeed");
    assert_eq!(resolved, Some(user("buyer-1")));

    let unknown = sessions
        .resolve_token("token-forged")
        .await
        .expect("lookup should succeed");
    assert!(unknown.is_none());
}

#[rstest]
fn embedded_owner_documents_deserialize_from_legacy_keys() {
    let listing: PropertyRecord = serde_json::from_value(serde_json::json!({
        "id": "prop-1",
        "title": "Terraced house",
        "seller": { "_id": "owner-1" }
    }))
    .expect("legacy record should parse");

    assert_eq!(listing.resolved_owner(), Some(user("owner-1")));
}
