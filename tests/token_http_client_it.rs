// crates.io
use httpmock::prelude::*;
// self
use ghl_bridge::{
	_preludet::*,
	http::{ResponseMetadata, ResponseMetadataSlot},
	oauth::oauth2::{AsyncHttpClient, HttpRequest, http::{self, Method}},
};

fn request(url: String) -> HttpRequest {
	http::Request::builder()
		.method(Method::POST)
		.uri(url)
		.body(Vec::new())
		.expect("Token request fixture should build.")
}

#[tokio::test]
async fn instrumented_handle_records_error_statuses() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let slot = ResponseMetadataSlot::default();
	let handle = test_http_client(std::time::Duration::from_secs(5)).with_metadata(slot.clone());
	let response = handle
		.call(request(server.url("/oauth/token")))
		.await
		.expect("Error statuses are still HTTP responses.");

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 401);
	assert_eq!(response.body().as_slice(), b"{\"error\":\"invalid_client\"}");
	assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
}

#[tokio::test]
async fn instrumented_handle_clears_stale_metadata_on_transport_failure() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).delay(std::time::Duration::from_millis(500));
		})
		.await;

	let slot = ResponseMetadataSlot::default();
	let handle =
		test_http_client(std::time::Duration::from_millis(50)).with_metadata(slot.clone());

	slot.store(ResponseMetadata { status: Some(500) });

	handle
		.call(request(server.url("/oauth/token")))
		.await
		.expect_err("A request slower than the client timeout should fail.");

	assert!(slot.take().is_none(), "Metadata from an earlier request must not leak.");
}
