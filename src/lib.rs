//! GoHighLevel OAuth 2.0 bridge: authorization-code exchange, a self-refreshing token store keyed
//! by location, and contact usage tracking served over a small axum application.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod crm;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod server;
pub mod store;
pub mod usage;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AccountId, ScopeSet, TokenRecord},
		config::Config,
		flows::TokenManager,
		http::ReqwestHttpClient,
		provider::{ClientAuthMethod, GrantType, ProviderDescriptor, ProviderQuirks},
		store::{MemoryStore, TokenStore},
	};

	/// Client identifier used by every test fixture.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret used by every test fixture.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Redirect URI registered for test fixtures.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/authorize-handler";

	/// Builds a GoHighLevel-shaped descriptor whose endpoints live under `base_url` (usually a
	/// loopback mock server).
	pub fn test_descriptor(base_url: &str) -> ProviderDescriptor {
		let base = base_url.trim_end_matches('/');

		ProviderDescriptor::builder(
			"mock-ghl".parse().expect("Mock provider identifier should be valid."),
		)
		.authorization_endpoint(
			Url::parse(&format!("{base}/oauth/chooselocation"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&format!("{base}/oauth/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.api_base(Url::parse(&format!("{base}/")).expect("Mock API base should parse successfully."))
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(ProviderQuirks::gohighlevel())
		.build()
		.expect("Mock provider descriptor should build successfully.")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock`, with redirects disabled and a per-request `timeout`.
	pub fn test_http_client(timeout: std::time::Duration) -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`TokenManager`] backed by an in-memory store and a short-timeout reqwest
	/// transport pointed at `base_url`.
	pub fn build_test_manager(base_url: &str) -> (TokenManager, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let http_client = test_http_client(std::time::Duration::from_secs(5));
		let manager = TokenManager::new(
			store,
			test_descriptor(base_url),
			TEST_CLIENT_ID,
			Url::parse(TEST_REDIRECT_URI).expect("Test redirect URI should parse successfully."),
		)
		.with_client_secret(TEST_CLIENT_SECRET)
		.with_http_client(http_client);

		(manager, store_backend)
	}

	/// Builds a [`Config`] whose provider endpoints point at `base_url`.
	pub fn test_config(base_url: &str) -> Config {
		let base = base_url.trim_end_matches('/');
		let vars = HashMap::from([
			("GHL_CLIENT_ID", TEST_CLIENT_ID.to_owned()),
			("GHL_CLIENT_SECRET", TEST_CLIENT_SECRET.to_owned()),
			("REDIRECT_URI", TEST_REDIRECT_URI.to_owned()),
			("GHL_DEFAULT_LOCATION_ID", "loc-default".to_owned()),
			("GHL_AUTHORIZE_URL", format!("{base}/oauth/chooselocation")),
			("GHL_TOKEN_URL", format!("{base}/oauth/token")),
			("GHL_API_BASE_URL", format!("{base}/")),
			("HTTP_TIMEOUT_SECS", "5".to_owned()),
			("USAGE_FIELD_ID", "usage-field".to_owned()),
			("LIMIT_FIELD_ID", "limit-field".to_owned()),
			("SUBMISSION_LIMIT", "3".to_owned()),
		]);

		Config::from_lookup(|key| vars.get(key).cloned())
			.expect("Test configuration should load successfully.")
	}

	/// Builds a token record for `account` that expires `expires_in` from now.
	pub fn token_fixture(
		account: &str,
		access: &str,
		refresh: &str,
		expires_in: Duration,
	) -> TokenRecord {
		let now = OffsetDateTime::now_utc();

		TokenRecord::builder(
			AccountId::new(account).expect("Account fixture should be valid."),
			ScopeSet::default(),
		)
		.access_token(access)
		.refresh_token(refresh)
		.issued_at(now - Duration::minutes(5))
		.expires_at(now + expires_in)
		.build()
		.expect("Token record fixture should build successfully.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Consumed by the `ghl-bridge` binary only.
use {color_eyre as _, dotenvy as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
