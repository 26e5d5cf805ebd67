// crates.io
use time::{Duration, macros};
// self
use ghl_bridge::{
	auth::{AccountId, ScopeSet, TokenRecord, TokenStatus},
	store::{MemoryStore, TokenStore},
};

fn account(id: &str) -> AccountId {
	AccountId::new(id).expect("Failed to build account identifier for memory store tests.")
}

fn build_record(account: &AccountId, access: &str, refresh: Option<&str>) -> TokenRecord {
	let issued = macros::datetime!(2025-11-10 12:00 UTC);

	TokenRecord::builder(account.clone(), ScopeSet::default())
		.access_token(access)
		.maybe_refresh_token(refresh)
		.issued_at(issued)
		.expires_at(issued + Duration::hours(1))
		.build()
		.expect("Token record fixture should build successfully.")
}

#[tokio::test]
async fn save_and_fetch_round_trip() {
	let store = MemoryStore::default();
	let account = account("loc-1");
	let record = build_record(&account, "access-1", Some("refresh-1"));

	store
		.save(record.clone())
		.await
		.expect("Saving record fixture into memory store should succeed.");

	let fetched = store
		.fetch(&account)
		.await
		.expect("Fetching token record from memory store should succeed.")
		.expect("Stored record should remain present.");

	assert_eq!(fetched.access_token.expose(), "access-1");
	assert_eq!(fetched.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-1"));
	assert_eq!(
		fetched.status_at(macros::datetime!(2025-11-10 12:30 UTC)),
		TokenStatus::Valid
	);
	assert_eq!(
		fetched.status_at(macros::datetime!(2025-11-10 13:00 UTC)),
		TokenStatus::Expired
	);
}

#[tokio::test]
async fn last_write_wins_per_account() {
	let store = MemoryStore::default();
	let first = account("loc-1");
	let second = account("loc-2");

	store.save(build_record(&first, "access-old", Some("refresh-old"))).await.expect("Save should succeed.");
	store.save(build_record(&first, "access-new", None)).await.expect("Save should succeed.");
	store.save(build_record(&second, "access-2", None)).await.expect("Save should succeed.");

	let fetched = store
		.fetch(&first)
		.await
		.expect("Fetch should succeed.")
		.expect("Overwritten record should remain present.");

	assert_eq!(fetched.access_token.expose(), "access-new");
	assert!(fetched.refresh_token.is_none(), "Records are replaced, not merged.");
	assert_eq!(store.len(), 2);
	assert_eq!(
		store.accounts().await.expect("Listing accounts should succeed."),
		vec![first, second]
	);
}

#[tokio::test]
async fn unknown_accounts_are_absent() {
	let store = MemoryStore::default();

	assert!(store.is_empty());
	assert!(
		store.fetch(&account("loc-missing")).await.expect("Fetch should succeed.").is_none()
	);
}
