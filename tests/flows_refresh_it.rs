// crates.io
use httpmock::prelude::*;
// self
use ghl_bridge::{_preludet::*, auth::AccountId, store::TokenStore};

fn account(id: &str) -> AccountId {
	AccountId::new(id).expect("Account fixture should be valid.")
}

#[tokio::test]
async fn resolve_returns_valid_records_without_network() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500);
		})
		.await;

	store
		.save(token_fixture("loc-1", "access-live", "refresh-live", Duration::hours(1)))
		.await
		.expect("Seeding the store should succeed.");

	let record = manager.resolve(&account("loc-1")).await.expect("Valid records resolve as is.");

	assert_eq!(record.access_token.expose(), "access-live");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn resolve_refreshes_expired_records_and_keeps_the_refresh_token() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let stale = token_fixture("loc-1", "access-stale", "refresh-keep", Duration::minutes(-1));
	let stale_expiry = stale.expires_at;

	store.save(stale).await.expect("Seeding the store should succeed.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-fresh\",\"token_type\":\"Bearer\",\"expires_in\":86399}",
			);
		})
		.await;
	let record = manager
		.resolve(&account("loc-1"))
		.await
		.expect("Expired records should refresh against the mock provider.");

	mock.assert_async().await;

	assert_eq!(record.access_token.expose(), "access-fresh");
	assert_eq!(record.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-keep"));
	assert!(record.expires_at > stale_expiry);
	assert!(!record.is_expired());

	let stored = store
		.fetch(&account("loc-1"))
		.await
		.expect("Store fetch should succeed.")
		.expect("Refreshed record should be stored.");

	assert_eq!(stored.access_token.expose(), "access-fresh");
	assert_eq!(manager.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn rotated_refresh_tokens_replace_the_old_one() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());

	store
		.save(token_fixture("loc-1", "access-old", "refresh-old", Duration::hours(1)))
		.await
		.expect("Seeding the store should succeed.");
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\
				 \"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;

	let record = manager
		.refresh(&account("loc-1"))
		.await
		.expect("Forced refresh should succeed even for valid records.");

	assert_eq!(record.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-new"));
}

#[tokio::test]
async fn failed_refresh_keeps_the_stale_record() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());

	store
		.save(token_fixture("loc-1", "access-stale", "refresh-revoked", Duration::minutes(-1)))
		.await
		.expect("Seeding the store should succeed.");
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let err = manager
		.resolve(&account("loc-1"))
		.await
		.expect_err("Revoked refresh tokens must fail resolution.");

	match err {
		Error::RefreshFailed(failure) => {
			assert_eq!(failure.status, Some(401));
			assert!(failure.payload.contains("invalid_grant"), "Payload: {}.", failure.payload);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	let stored = store
		.fetch(&account("loc-1"))
		.await
		.expect("Store fetch should succeed.")
		.expect("Stale record must remain stored.");

	assert_eq!(stored.access_token.expose(), "access-stale");
	assert_eq!(manager.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn concurrent_resolves_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());

	store
		.save(token_fixture("loc-1", "access-stale", "refresh-1", Duration::minutes(-1)))
		.await
		.expect("Seeding the store should succeed.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"access-shared\",\"token_type\":\"Bearer\",\"expires_in\":600}");
		})
		.await;
	let account = account("loc-1");
	let (first, second, third) =
		tokio::join!(manager.resolve(&account), manager.resolve(&account), manager.resolve(&account));

	for result in [first, second, third] {
		let record = result.expect("Every concurrent resolve should succeed.");

		assert_eq!(record.access_token.expose(), "access-shared");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unknown_accounts_fail_without_network() {
	let server = MockServer::start_async().await;
	let (manager, _store) = build_test_manager(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200);
		})
		.await;
	let err = manager
		.resolve(&account("loc-unknown"))
		.await
		.expect_err("Unknown accounts have no token.");

	assert!(matches!(err, Error::NotFound { .. }));

	let err = manager
		.refresh(&account("loc-unknown"))
		.await
		.expect_err("Unknown accounts cannot be refreshed.");

	assert!(matches!(err, Error::NotFound { .. }));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn exchange_resolve_refresh_round_trip_moves_expiry_forward() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-cycle\",\"refresh_token\":\"refresh-cycle\",\
				 \"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let account = account("loc-cycle");
	let exchanged =
		manager.exchange("cycle-code", &account).await.expect("Exchange should succeed.");
	let cached = manager.resolve(&account).await.expect("Fresh records should resolve.");

	assert_eq!(cached.expires_at, exchanged.expires_at);

	let mut expired = cached.clone();

	expired.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);

	store.save(expired).await.expect("Forcing expiry should succeed.");
	tokio::time::sleep(std::time::Duration::from_millis(5)).await;

	let resolved = manager.resolve(&account).await.expect("Expired records should refresh.");

	assert!(resolved.expires_at > exchanged.expires_at);

	tokio::time::sleep(std::time::Duration::from_millis(5)).await;

	let refreshed = manager.refresh(&account).await.expect("Forced refresh should succeed.");

	assert!(refreshed.expires_at > resolved.expires_at);

	mock.assert_calls_async(3).await;
}
