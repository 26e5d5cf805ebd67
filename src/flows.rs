//! Token lifecycle orchestration: code exchange, expiry-aware resolution, and refresh.

pub mod common;
pub mod exchange;
pub mod refresh;
pub mod resolve;

pub use common::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet},
	http::ReqwestHttpClient,
	oauth::BasicFacade,
	provider::ProviderDescriptor,
	store::TokenStore,
};

/// Coordinates the token lifecycle for every account against a single provider descriptor.
///
/// The manager owns the HTTP client, token store, and provider descriptor so the exchange,
/// resolve, and refresh flows only carry grant-specific logic. Flows that touch the provider
/// for one account are serialized by a per-account guard.
#[derive(Clone)]
pub struct TokenManager {
	/// HTTP client used for every token endpoint request.
	pub http_client: ReqwestHttpClient,
	/// Token store holding one record per account.
	pub store: Arc<dyn TokenStore>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret sent in the token request body.
	pub client_secret: Option<String>,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested on the consent screen.
	pub scope: ScopeSet,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: FlowGuards<AccountId>,
}
impl TokenManager {
	/// Creates a manager with a default reqwest transport and an empty scope list.
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		redirect_uri: Url,
	) -> Self {
		Self {
			http_client: ReqwestHttpClient::default(),
			store,
			descriptor,
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scope: ScopeSet::default(),
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the scopes requested on the consent screen.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Replaces the HTTP transport (timeouts, pools).
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Builds the consent-screen URL users are redirected to.
	pub fn authorization_url(&self) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("response_type", "code")
				.append_pair("redirect_uri", self.redirect_uri.as_str())
				.append_pair("client_id", &self.client_id);

			if let Some(scope) = self.scope.joined(self.descriptor.quirks.scope_delimiter) {
				query.append_pair("scope", &scope);
			}
		}

		url
	}

	pub(crate) fn facade(&self) -> Result<BasicFacade> {
		BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_deref(),
			&self.redirect_uri,
			self.http_client.clone(),
		)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("scope", &self.scope)
			.finish()
	}
}
