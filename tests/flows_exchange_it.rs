// crates.io
use httpmock::prelude::*;
// self
use ghl_bridge::{
	_preludet::*,
	auth::{AccountId, TokenStatus},
	store::TokenStore,
};

fn account(id: &str) -> AccountId {
	AccountId::new(id).expect("Account fixture should be valid.")
}

#[tokio::test]
async fn exchange_stores_a_fresh_record() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\
				 \"token_type\":\"Bearer\",\"expires_in\":86399,\
				 \"scope\":\"contacts.readonly contacts.write\",\"locationId\":\"loc-1\"}",
			);
		})
		.await;
	let before = OffsetDateTime::now_utc();
	let record = manager
		.exchange("auth-code", &account("loc-1"))
		.await
		.expect("Exchange should succeed against the mock provider.");

	mock.assert_async().await;

	assert_eq!(record.access_token.expose(), "access-1");
	assert_eq!(record.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-1"));
	assert!(record.scope.contains("contacts.write"));
	assert_eq!(record.status(), TokenStatus::Valid);
	assert!(record.expires_at >= before + Duration::seconds(86_399));
	assert!(record.expires_at <= OffsetDateTime::now_utc() + Duration::seconds(86_399));

	let stored = store
		.fetch(&account("loc-1"))
		.await
		.expect("Store fetch should succeed.")
		.expect("Exchanged record should be stored.");

	assert_eq!(stored.access_token.expose(), "access-1");
}

#[tokio::test]
async fn exchange_replaces_the_previous_record() {
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

	manager
		.exchange("second-code", &account("loc-1"))
		.await
		.expect("Re-authorization should succeed.");

	let stored = store
		.fetch(&account("loc-1"))
		.await
		.expect("Store fetch should succeed.")
		.expect("Record should still exist.");

	assert_eq!(stored.access_token.expose(), "access-new");
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn blank_code_is_rejected_before_the_provider_is_called() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200);
		})
		.await;
	let err = manager
		.exchange("   ", &account("loc-1"))
		.await
		.expect_err("Blank codes must be rejected.");

	assert!(matches!(err, Error::MissingParameter { name: "code" }));

	mock.assert_calls_async(0).await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn provider_rejection_surfaces_payload_and_stores_nothing() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Code already used\"}",
			);
		})
		.await;

	let err = manager
		.exchange("used-code", &account("loc-1"))
		.await
		.expect_err("Rejected codes must fail the exchange.");

	match err {
		Error::ExchangeFailed(failure) => {
			assert_eq!(failure.status, Some(400));
			assert!(failure.payload.contains("invalid_grant"), "Payload: {}.", failure.payload);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(store.is_empty());
}

#[tokio::test]
async fn slow_provider_times_out() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_manager(&server.base_url());
	let manager =
		manager.with_http_client(test_http_client(std::time::Duration::from_millis(100)));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_secs(2))
				.body("{\"access_token\":\"late\",\"token_type\":\"Bearer\",\"expires_in\":60}");
		})
		.await;

	let err = manager
		.exchange("slow-code", &account("loc-1"))
		.await
		.expect_err("Slow providers must time out.");

	match err {
		Error::ExchangeFailed(failure) => {
			assert_eq!(failure.status, None);
			assert!(failure.payload.contains("timed out"), "Payload: {}.", failure.payload);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(store.is_empty());
}
